//! stationforge CLI — compile vATIS station files into vATIS profiles.
//!
//! Each profile document must already exist and contain a `name` key; its
//! `stations` key is replaced with the station files selected by the
//! profile's filters.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}

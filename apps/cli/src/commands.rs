//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use stationforge_core::assembler::AssembleResult;
use stationforge_core::pipeline::{self, CompileReport, ProgressReporter};
use stationforge_shared::{
    AppConfig, CompileConfig, config_file_path, init_config, load_config, load_config_from,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// stationforge — merge station files into vATIS profiles.
#[derive(Parser)]
#[command(
    name = "stationforge",
    version,
    about = "Merge per-airport station files into vATIS profile documents.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ./stationforge.toml, or built-in profiles if absent).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Defaults to `compile`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Rebuild every profile from the station files.
    Compile,

    /// Show which stations each profile would receive, without writing.
    List,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a config file with the built-in defaults.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "stationforge=info",
        1 => "stationforge=debug",
        _ => "stationforge=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();

    match cli.command.unwrap_or(Command::Compile) {
        Command::Compile => cmd_compile(config_path),
        Command::List => cmd_list(config_path),
        Command::Config { action } => match action {
            ConfigAction::Init { force } => cmd_config_init(config_path, force),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

/// Load the config and resolve its paths.
///
/// Relative paths in a config file are resolved against that file's
/// directory; built-in defaults resolve against the working directory.
fn resolve_config(explicit: Option<&Path>) -> Result<(AppConfig, CompileConfig)> {
    match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(eyre!("config file '{}' not found", path.display()));
            }
            let config = load_config_from(path)?;
            let base = path.parent().unwrap_or(Path::new(""));
            let compile = CompileConfig::resolve(&config, base);
            Ok((config, compile))
        }
        None => {
            let config = load_config()?;
            let compile = CompileConfig::from(&config);
            Ok((config, compile))
        }
    }
}

fn cmd_compile(config_path: Option<&Path>) -> Result<()> {
    let (_, config) = resolve_config(config_path)?;

    info!(
        root = %config.stations_root.display(),
        profiles = config.profiles.len(),
        "compiling station files"
    );

    let reporter = CliProgress::new();
    let report = pipeline::compile(&config, &reporter)?;

    println!();
    for profile in &report.profiles {
        println!(
            "  {:<40} {:>3} stations  ({})",
            profile.name,
            profile.station_count,
            profile.target.display()
        );
    }
    println!();
    println!(
        "  {} profile(s) written from {} station file(s), {} excluded, in {:.2}s",
        report.profiles.len(),
        report.stations_found,
        report.stations_excluded,
        report.elapsed.as_secs_f64()
    );
    println!();

    Ok(())
}

fn cmd_list(config_path: Option<&Path>) -> Result<()> {
    let (_, config) = resolve_config(config_path)?;
    let plans = pipeline::plan(&config)?;

    for plan in &plans {
        println!("{} ({} stations)", plan.target.display(), plan.stations.len());
        for station in &plan.stations {
            println!("  {station}");
        }
    }

    Ok(())
}

fn cmd_config_init(config_path: Option<&Path>, force: bool) -> Result<()> {
    let path = config_path.map(Path::to_path_buf).unwrap_or_else(config_file_path);
    init_config(&path, force)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let (config, _) = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        // Also clears the spinner when compile bails out before `done`.
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn profile_started(&self, target: &Path, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Building [{current}/{total}] {}", target.display()));
    }

    fn profile_written(&self, _result: &AssembleResult) {}

    fn done(&self, _report: &CompileReport) {
        self.spinner.finish_and_clear();
    }
}

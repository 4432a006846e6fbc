//! Core pipeline orchestration and domain logic for stationforge.
//!
//! This crate ties together station discovery and profile assembly into the
//! end-to-end `compile` run.

pub mod assembler;
pub mod pipeline;

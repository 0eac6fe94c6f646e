//! Montage CLI library
//!
//! Configuration, error reporting and the run supervisor behind the `montage`
//! binary.

pub mod commands;
pub mod config;
pub mod error;
pub mod pipeline;

pub use config::Config;
pub use error::CliError;
pub use pipeline::{load_inputs, Pipeline, RunSummary, UnitOutcome, UnitReport};

#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

// Dev-only dependency used by unit tests
#[cfg(test)]
use tokio_test as _;

// Used by the binary only
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod parser;
pub mod presentation;
pub mod surface;

pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::LineCommand;
pub use parser::Cli;

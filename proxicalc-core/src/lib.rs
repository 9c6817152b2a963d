//! Proxicalc Core - shared error, configuration, logging and counter types
//!
//! Everything the pipeline crates have in common lives here: the workspace
//! error type, the immutable run configuration, logging initialization and
//! the run-wide counters.

pub mod config;
pub mod counters;
pub mod error;
pub mod logging;

pub use config::*;
pub use counters::*;
pub use error::*;
pub use logging::*;

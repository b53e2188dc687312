pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliConfig;
pub use crate::config::{toml_config::TomlConfig, SessionConfig};

pub use adapters::{
    console::ConsoleReporter,
    csv_sink::{CsvRecorder, CsvSinkFactory},
    serial::SerialConnector,
};
pub use crate::core::{engine::LoggerEngine, session::Session};
pub use domain::model::{SessionEnd, SessionOutcome, SessionState, SessionStats};
pub use utils::error::{LoggerError, Result};

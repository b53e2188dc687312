#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::parser::DEFAULT_DELIMITER;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_delimiter, validate_non_empty_string, validate_path, validate_range, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PORT: &str = "COM5";
pub const DEFAULT_BAUD_RATE: u32 = 38400;
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 100;
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 2000;
pub const DEFAULT_OUTPUT_FILE: &str = "sensor_acquisition_v1.csv";

/// 單次擷取的完整設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub port: String,
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
    pub settle_delay_ms: u64,
    pub output_file: PathBuf,
    pub delimiter: char,
    pub sync_to_disk: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            delimiter: DEFAULT_DELIMITER,
            sync_to_disk: true,
        }
    }
}

impl ConfigProvider for SessionConfig {
    fn port(&self) -> &str {
        &self.port
    }

    fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    fn output_file(&self) -> &Path {
        &self.output_file
    }

    fn delimiter(&self) -> char {
        self.delimiter
    }

    fn sync_to_disk(&self) -> bool {
        self.sync_to_disk
    }
}

impl Validate for SessionConfig {
    fn validate(&self) -> Result<()> {
        validate_settings(self)
    }
}

/// 任何設定來源共用的檢查
pub fn validate_settings<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    validate_non_empty_string("port", config.port())?;
    validate_range("baud_rate", config.baud_rate(), 300, 4_000_000)?;

    let timeout_ms = config.read_timeout().as_millis();
    validate_range("read_timeout_ms", timeout_ms, 1, 60_000)?;

    validate_path("output_file", &config.output_file().to_string_lossy())?;
    validate_delimiter("delimiter", config.delimiter())?;
    Ok(())
}

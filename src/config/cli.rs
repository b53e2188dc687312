use super::{
    validate_settings, DEFAULT_BAUD_RATE, DEFAULT_OUTPUT_FILE, DEFAULT_PORT,
    DEFAULT_READ_TIMEOUT_MS, DEFAULT_SETTLE_DELAY_MS,
};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "rig-logger")]
#[command(about = "Record distance/servo/current telemetry from a serial sensor rig to CSV")]
pub struct CliConfig {
    /// Serial port name (e.g. COM5, /dev/ttyUSB0)
    #[arg(short, long, default_value = DEFAULT_PORT)]
    pub port: String,

    #[arg(short, long, default_value_t = DEFAULT_BAUD_RATE)]
    pub baud_rate: u32,

    #[arg(long, default_value_t = DEFAULT_READ_TIMEOUT_MS)]
    pub read_timeout_ms: u64,

    /// Wait after opening the port while the board resets
    #[arg(long, default_value_t = DEFAULT_SETTLE_DELAY_MS)]
    pub settle_delay_ms: u64,

    #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
    pub output: PathBuf,

    #[arg(long, default_value_t = ',')]
    pub delimiter: char,

    /// Only flush to the OS after each row, skip fsync
    #[arg(long)]
    pub no_sync: bool,

    /// List available serial ports and exit
    #[arg(long)]
    pub list_ports: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log process CPU/memory at session start and end")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl ConfigProvider for CliConfig {
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
        &self.output
    }

    fn delimiter(&self) -> char {
        self.delimiter
    }

    fn sync_to_disk(&self) -> bool {
        !self.no_sync
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_settings(self)
    }
}

use super::{
    validate_settings, DEFAULT_BAUD_RATE, DEFAULT_OUTPUT_FILE, DEFAULT_READ_TIMEOUT_MS,
    DEFAULT_SETTLE_DELAY_MS,
};
use crate::core::parser::DEFAULT_DELIMITER;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{LoggerError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub serial: SerialSection,
    pub output: Option<OutputSection>,
    pub parser: Option<ParserSection>,
    pub monitoring: Option<MonitoringSection>,
    #[serde(skip)]
    resolved_output: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialSection {
    pub port: String,
    pub baud_rate: Option<u32>,
    pub read_timeout_ms: Option<u64>,
    pub settle_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    pub file: Option<PathBuf>,
    pub sync_to_disk: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserSection {
    pub delimiter: Option<char>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringSection {
    pub enabled: bool,
    pub log_format: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LoggerError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        let mut config: TomlConfig =
            toml::from_str(&processed_content).map_err(|e| LoggerError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;

        config.resolved_output = config
            .output
            .as_ref()
            .and_then(|o| o.file.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE));
        Ok(config)
    }

    /// 替換環境變數 (例如 ${RIG_PORT})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LoggerError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        if self.port().contains("${") {
            return Err(LoggerError::InvalidConfigValueError {
                field: "serial.port".to_string(),
                value: self.port().to_string(),
                reason: "Environment variable is not set".to_string(),
            });
        }

        if let Some(format) = self.log_format() {
            let valid_formats = ["compact", "json"];
            if !valid_formats.contains(&format) {
                return Err(LoggerError::InvalidConfigValueError {
                    field: "monitoring.log_format".to_string(),
                    value: format.to_string(),
                    reason: format!(
                        "Unsupported format. Valid formats: {}",
                        valid_formats.join(", ")
                    ),
                });
            }
        }

        validate_settings(self)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_format(&self) -> Option<&str> {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_format.as_deref())
    }

    /// 命令列覆寫輸出檔
    pub fn set_output_file(&mut self, path: PathBuf) {
        self.resolved_output = path;
    }
}

impl ConfigProvider for TomlConfig {
    fn port(&self) -> &str {
        &self.serial.port
    }

    fn baud_rate(&self) -> u32 {
        self.serial.baud_rate.unwrap_or(DEFAULT_BAUD_RATE)
    }

    fn read_timeout(&self) -> Duration {
        Duration::from_millis(
            self.serial
                .read_timeout_ms
                .unwrap_or(DEFAULT_READ_TIMEOUT_MS),
        )
    }

    fn settle_delay(&self) -> Duration {
        Duration::from_millis(
            self.serial
                .settle_delay_ms
                .unwrap_or(DEFAULT_SETTLE_DELAY_MS),
        )
    }

    fn output_file(&self) -> &Path {
        &self.resolved_output
    }

    fn delimiter(&self) -> char {
        self.parser
            .as_ref()
            .and_then(|p| p.delimiter)
            .unwrap_or(DEFAULT_DELIMITER)
    }

    fn sync_to_disk(&self) -> bool {
        self.output
            .as_ref()
            .and_then(|o| o.sync_to_disk)
            .unwrap_or(true)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

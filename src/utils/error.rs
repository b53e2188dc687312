use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("could not open {port}: {source}")]
    ConnectionError {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("port lost during session: {0}")]
    PortLostError(std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Background task failed: {0}")]
    TaskError(#[from] tokio::task::JoinError),
}

/// 錯誤類別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Connection,
    Storage,
    Configuration,
    Runtime,
}

/// 錯誤嚴重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LoggerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LoggerError::ConnectionError { .. } | LoggerError::PortLostError(_) => {
                ErrorCategory::Connection
            }
            LoggerError::CsvError(_) | LoggerError::IoError(_) => ErrorCategory::Storage,
            LoggerError::ConfigError { .. }
            | LoggerError::ConfigValidationError { .. }
            | LoggerError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            LoggerError::TaskError(_) => ErrorCategory::Runtime,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 連線問題可由使用者重新插拔後再次啟動
            ErrorCategory::Connection => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage | ErrorCategory::Runtime => ErrorSeverity::Critical,
        }
    }

    /// 連線錯誤之外的執行期錯誤都視為 critical
    pub fn is_connection_failure(&self) -> bool {
        self.category() == ErrorCategory::Connection
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            LoggerError::ConnectionError { port, .. } => format!(
                "Check that the device is plugged in and that no other program holds {}",
                port
            ),
            LoggerError::PortLostError(_) => {
                "The device was disconnected; reconnect it and start a new session".to_string()
            }
            LoggerError::CsvError(_) | LoggerError::IoError(_) => {
                "Check free disk space and write permissions for the output file".to_string()
            }
            LoggerError::ConfigError { .. } | LoggerError::ConfigValidationError { .. } => {
                "Review the configuration file syntax".to_string()
            }
            LoggerError::InvalidConfigValueError { field, .. } => {
                format!("Fix the value of '{}'", field)
            }
            LoggerError::TaskError(_) => "Restart the logger".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Connection => format!("Port Connection Error: {}", self),
            ErrorCategory::Storage | ErrorCategory::Runtime => {
                format!("Unexpected error: {}", self)
            }
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, LoggerError>;

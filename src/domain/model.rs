use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const HEADERS: [&str; 4] = ["Timestamp", "Distance_cm", "Servo_Angle_deg", "Current_A"];

/// 一行被接受的感測資料，三個欄位原樣保留不做數值解析
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub distance_cm: String,
    pub servo_angle_deg: String,
    pub current_a: String,
}

impl Reading {
    pub fn fields(&self) -> [&str; 3] {
        [
            self.distance_cm.as_str(),
            self.servo_angle_deg.as_str(),
            self.current_a.as_str(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub timestamp: String,
    #[serde(flatten)]
    pub reading: Reading,
}

impl Record {
    /// 以主機時鐘（時:分:秒，不含日期）加上時間戳
    pub fn stamp_now(reading: Reading) -> Self {
        Self {
            timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
            reading,
        }
    }

    pub fn to_row(&self) -> [&str; 4] {
        let [distance, angle, current] = self.reading.fields();
        [self.timestamp.as_str(), distance, angle, current]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSettings {
    pub port: String,
    pub baud_rate: u32,
    pub read_timeout: Duration,
    pub settle_delay: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Recording,
    Closing,
    Terminated,
}

/// 擷取結束的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    Interrupted,
    ConnectionFailed(String),
    Critical(String),
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEnd::Interrupted => write!(f, "Manual termination by user"),
            SessionEnd::ConnectionFailed(msg) => write!(f, "Port Connection Error: {}", msg),
            SessionEnd::Critical(msg) => write!(f, "Unexpected error: {}", msg),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub reads: u64,
    pub accepted: u64,
    pub discarded: u64,
    pub empty: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub end: SessionEnd,
    pub stats: SessionStats,
    pub port_released: bool,
}

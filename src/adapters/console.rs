use crate::domain::model::{Record, SessionEnd, SessionStats};
use crate::domain::ports::Reporter;
use std::path::Path;

#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }
}

/// `[HH:MM:SS] DATA: ["12.50", "90", "0.35"]`
fn data_line(record: &Record) -> String {
    format!("[{}] DATA: {:?}", record.timestamp, record.reading.fields())
}

impl Reporter for ConsoleReporter {
    fn session_started(&mut self, port: &str, output: &Path) {
        tracing::info!("Session recording on {} to {}", port, output.display());
        println!(">>> Initialization successful on {}", port);
        println!(">>> Recording to: {}", output.display());
        println!(">>> Press Ctrl+C to stop recording safely.");
    }

    fn record_accepted(&mut self, record: &Record) {
        println!("{}", data_line(record));
    }

    fn session_ended(&mut self, end: &SessionEnd, stats: &SessionStats, port_released: bool) {
        match end {
            SessionEnd::Interrupted => {
                tracing::info!("{}", end);
                println!("\n[INFO] Manual termination by user. Finishing session...");
            }
            SessionEnd::ConnectionFailed(_) => {
                tracing::error!("{}", end);
                println!("\n[ERROR] {}", end);
            }
            SessionEnd::Critical(_) => {
                tracing::error!("{}", end);
                println!("\n[CRITICAL] {}", end);
            }
        }

        if stats.reads > 0 {
            println!(
                ">>> {} records saved, {} lines discarded, {} empty reads",
                stats.accepted, stats.discarded, stats.empty
            );
        }

        if port_released {
            println!(">>> Interface closed. Data integrity secured.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Reading;

    #[test]
    fn test_data_line_lists_raw_fields() {
        let record = Record {
            timestamp: "10:00:01".to_string(),
            reading: Reading {
                distance_cm: "12.50".to_string(),
                servo_angle_deg: "90".to_string(),
                current_a: "0.35".to_string(),
            },
        };

        assert_eq!(
            data_line(&record),
            r#"[10:00:01] DATA: ["12.50", "90", "0.35"]"#
        );
    }
}

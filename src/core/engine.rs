use crate::core::session::Session;
use crate::domain::model::SessionOutcome;
use crate::domain::ports::{ConfigProvider, Connector, Reporter, SinkFactory};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 在 tokio 之下執行阻塞式的 Session，並把 Ctrl+C 轉成停止旗標
pub struct LoggerEngine<C, K, F, R>
where
    C: ConfigProvider + Send + 'static,
    K: Connector + Send + 'static,
    K::Source: Send,
    F: SinkFactory + Send + 'static,
    R: Reporter + Send + 'static,
{
    session: Session<C, K, F, R>,
    stop: Arc<AtomicBool>,
    monitor: SystemMonitor,
}

impl<C, K, F, R> LoggerEngine<C, K, F, R>
where
    C: ConfigProvider + Send + 'static,
    K: Connector + Send + 'static,
    K::Source: Send,
    F: SinkFactory + Send + 'static,
    R: Reporter + Send + 'static,
{
    pub fn new(session: Session<C, K, F, R>) -> Self {
        Self::new_with_monitoring(session, false)
    }

    pub fn new_with_monitoring(session: Session<C, K, F, R>, monitor_enabled: bool) -> Self {
        Self {
            session,
            stop: Arc::new(AtomicBool::new(false)),
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// 外部也可以舉起這個旗標來結束擷取
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub async fn run(self) -> Result<SessionOutcome> {
        let Self {
            mut session,
            stop,
            monitor,
        } = self;

        monitor.log_stats("Session start");

        let signal_stop = stop.clone();
        let watcher = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::debug!("Ctrl+C received, stopping after the current read");
                    signal_stop.store(true, Ordering::SeqCst);
                }
                Err(e) => tracing::warn!("Unable to listen for Ctrl+C: {}", e),
            }
        });

        let outcome = tokio::task::spawn_blocking(move || session.run(&stop)).await;
        watcher.abort();
        let outcome = outcome?;

        monitor.log_final_stats(&outcome.stats);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::csv_sink::CsvSinkFactory;
    use crate::config::SessionConfig;
    use crate::domain::model::{PortSettings, Record, SessionEnd, SessionStats};
    use crate::domain::ports::LineSource;
    use crate::utils::error::LoggerError;
    use std::path::Path;

    struct SilentPort {
        open: bool,
    }

    impl LineSource for SilentPort {
        fn read_line(&mut self) -> Result<String> {
            std::thread::sleep(std::time::Duration::from_millis(5));
            Ok(String::new())
        }

        fn is_open(&self) -> bool {
            self.open
        }

        fn close(&mut self) {
            self.open = false;
        }
    }

    struct SilentConnector;

    impl Connector for SilentConnector {
        type Source = SilentPort;

        fn connect(&self, _settings: &PortSettings) -> Result<SilentPort> {
            Ok(SilentPort { open: true })
        }
    }

    struct UnpluggedConnector;

    impl Connector for UnpluggedConnector {
        type Source = SilentPort;

        fn connect(&self, settings: &PortSettings) -> Result<SilentPort> {
            Err(LoggerError::ConnectionError {
                port: settings.port.clone(),
                source: serialport::Error::new(serialport::ErrorKind::NoDevice, "not found"),
            })
        }
    }

    struct NullReporter;

    impl Reporter for NullReporter {
        fn session_started(&mut self, _port: &str, _output: &Path) {}
        fn record_accepted(&mut self, _record: &Record) {}
        fn session_ended(&mut self, _end: &SessionEnd, _stats: &SessionStats, _released: bool) {}
    }

    #[tokio::test]
    async fn test_stop_handle_ends_session() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = SessionConfig {
            output_file: dir.path().join("engine.csv"),
            settle_delay_ms: 0,
            ..SessionConfig::default()
        };

        let session = Session::new(config, SilentConnector, CsvSinkFactory, NullReporter);
        let engine = LoggerEngine::new(session);
        let stop = engine.stop_handle();
        let handle = tokio::spawn(engine.run());

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        stop.store(true, Ordering::SeqCst);

        let outcome = handle.await.unwrap().unwrap();
        assert_eq!(outcome.end, SessionEnd::Interrupted);
        assert!(outcome.port_released);
        assert!(outcome.stats.empty > 0);
    }

    #[tokio::test]
    async fn test_connection_failure_is_an_outcome_not_an_error() {
        let config = SessionConfig {
            settle_delay_ms: 0,
            ..SessionConfig::default()
        };

        let session = Session::new(config, UnpluggedConnector, CsvSinkFactory, NullReporter);
        let engine = LoggerEngine::new(session);
        let outcome = engine.run().await.unwrap();
        assert!(matches!(outcome.end, SessionEnd::ConnectionFailed(_)));
        assert!(!outcome.port_released);
    }
}

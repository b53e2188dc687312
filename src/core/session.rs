use crate::core::parser::{LineVerdict, RecordParser};
use crate::domain::model::{Record, SessionEnd, SessionOutcome, SessionState, SessionStats};
use crate::domain::ports::{
    ConfigProvider, Connector, LineSource, RecordSink, Reporter, SinkFactory,
};
use crate::utils::error::Result;
use std::sync::atomic::{AtomicBool, Ordering};

/// 一次擷取：開埠、寫檔、直到被中斷或發生錯誤，最後一定釋放序列埠
///
/// 狀態轉移：`Idle -> Connecting -> Recording -> Closing -> Terminated`，
/// 開埠失敗時 `Connecting -> Terminated`。
pub struct Session<C: ConfigProvider, K: Connector, F: SinkFactory, R: Reporter> {
    config: C,
    connector: K,
    sinks: F,
    reporter: R,
    parser: RecordParser,
    history: Vec<SessionState>,
}

impl<C: ConfigProvider, K: Connector, F: SinkFactory, R: Reporter> Session<C, K, F, R> {
    pub fn new(config: C, connector: K, sinks: F, reporter: R) -> Self {
        let parser = RecordParser::new(config.delimiter());
        Self {
            config,
            connector,
            sinks,
            reporter,
            parser,
            history: vec![SessionState::Idle],
        }
    }

    pub fn state(&self) -> SessionState {
        self.history
            .last()
            .copied()
            .unwrap_or(SessionState::Idle)
    }

    pub fn history(&self) -> &[SessionState] {
        &self.history
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!("Session state {:?} -> {:?}", self.state(), next);
        self.history.push(next);
    }

    /// `stop` 在每次讀取之間檢查；正在進行的讀取會先等到自己的逾時
    pub fn run(&mut self, stop: &AtomicBool) -> SessionOutcome {
        let mut stats = SessionStats::default();

        self.transition(SessionState::Connecting);
        let settings = self.config.port_settings();
        let mut source = match self.connector.connect(&settings) {
            Ok(source) => source,
            Err(e) => {
                tracing::error!("Failed to open {}: {}", settings.port, e);
                tracing::debug!("Suggestion: {}", e.recovery_suggestion());
                let end = SessionEnd::ConnectionFailed(e.to_string());
                self.reporter.session_ended(&end, &stats, false);
                self.transition(SessionState::Terminated);
                return SessionOutcome {
                    end,
                    stats,
                    port_released: false,
                };
            }
        };

        self.transition(SessionState::Recording);
        let end = match self.record(&mut source, stop, &mut stats) {
            Ok(()) => SessionEnd::Interrupted,
            Err(e) if e.is_connection_failure() => SessionEnd::ConnectionFailed(e.to_string()),
            Err(e) => {
                tracing::debug!("Suggestion: {}", e.recovery_suggestion());
                SessionEnd::Critical(e.to_string())
            }
        };

        self.transition(SessionState::Closing);
        let port_released = source.is_open();
        if port_released {
            source.close();
        }
        self.reporter.session_ended(&end, &stats, port_released);
        self.transition(SessionState::Terminated);

        tracing::info!(
            "Session finished: {} accepted, {} discarded, {} empty reads",
            stats.accepted,
            stats.discarded,
            stats.empty
        );

        SessionOutcome {
            end,
            stats,
            port_released,
        }
    }

    fn record(
        &mut self,
        source: &mut K::Source,
        stop: &AtomicBool,
        stats: &mut SessionStats,
    ) -> Result<()> {
        // 等待裝置重置期間就被中斷時，不要覆寫既有的輸出檔
        if stop.load(Ordering::SeqCst) {
            tracing::info!("Stop requested before recording started, output left untouched");
            return Ok(());
        }

        let output = self.config.output_file();
        self.reporter.session_started(self.config.port(), output);

        let mut sink = self.sinks.create(output, self.config.sync_to_disk())?;

        while !stop.load(Ordering::SeqCst) {
            let line = source.read_line()?;
            stats.reads += 1;

            match self.parser.parse(&line) {
                LineVerdict::Accepted(reading) => {
                    let record = Record::stamp_now(reading);
                    sink.append(&record)?;
                    stats.accepted += 1;
                    self.reporter.record_accepted(&record);
                }
                LineVerdict::Empty => stats.empty += 1,
                LineVerdict::Discarded => {
                    stats.discarded += 1;
                    tracing::debug!("Discarded line: {:?}", line);
                }
            }
        }

        tracing::debug!("Stop requested after {} rows", sink.rows_written());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::csv_sink::CsvSinkFactory;
    use crate::config::SessionConfig;
    use crate::domain::model::PortSettings;
    use crate::utils::error::LoggerError;
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    enum Step {
        Line(&'static str),
        Lost,
    }

    /// 依腳本吐出資料行，腳本跑完就舉起 stop 旗標（模擬 Ctrl+C）
    struct ScriptedSource {
        steps: VecDeque<Step>,
        stop: Arc<AtomicBool>,
        open: bool,
        closes: Arc<AtomicUsize>,
    }

    impl LineSource for ScriptedSource {
        fn read_line(&mut self) -> Result<String> {
            let step = self.steps.pop_front();
            if self.steps.is_empty() {
                self.stop.store(true, Ordering::SeqCst);
            }
            match step {
                Some(Step::Line(line)) => Ok(line.to_string()),
                Some(Step::Lost) => Err(LoggerError::PortLostError(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "device unplugged",
                ))),
                None => Ok(String::new()),
            }
        }

        fn is_open(&self) -> bool {
            self.open
        }

        fn close(&mut self) {
            self.open = false;
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct ScriptedConnector {
        lines: Vec<&'static str>,
        lose_port: bool,
        fail_open: bool,
        stop: Arc<AtomicBool>,
        closes: Arc<AtomicUsize>,
    }

    impl ScriptedConnector {
        fn new(lines: Vec<&'static str>, stop: Arc<AtomicBool>) -> Self {
            Self {
                lines,
                lose_port: false,
                fail_open: false,
                stop,
                closes: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl Connector for ScriptedConnector {
        type Source = ScriptedSource;

        fn connect(&self, settings: &PortSettings) -> Result<ScriptedSource> {
            if self.fail_open {
                return Err(LoggerError::ConnectionError {
                    port: settings.port.clone(),
                    source: serialport::Error::new(serialport::ErrorKind::NoDevice, "not found"),
                });
            }
            let mut steps: VecDeque<Step> = self.lines.iter().map(|l| Step::Line(*l)).collect();
            if self.lose_port {
                steps.push_back(Step::Lost);
            }
            Ok(ScriptedSource {
                steps,
                stop: self.stop.clone(),
                open: true,
                closes: self.closes.clone(),
            })
        }
    }

    #[derive(Default)]
    struct CollectingReporter {
        started: usize,
        records: Vec<Record>,
        ends: Vec<SessionEnd>,
    }

    impl Reporter for CollectingReporter {
        fn session_started(&mut self, _port: &str, _output: &Path) {
            self.started += 1;
        }

        fn record_accepted(&mut self, record: &Record) {
            self.records.push(record.clone());
        }

        fn session_ended(&mut self, end: &SessionEnd, _stats: &SessionStats, _released: bool) {
            self.ends.push(end.clone());
        }
    }

    fn config_in(dir: &TempDir) -> SessionConfig {
        SessionConfig {
            output_file: dir.path().join("session.csv"),
            settle_delay_ms: 0,
            sync_to_disk: false,
            ..SessionConfig::default()
        }
    }

    fn data_rows(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .skip(1)
            .map(|l| l.to_string())
            .collect()
    }

    #[test]
    fn test_interrupt_after_mixed_traffic() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let output = config.output_file.clone();
        let stop = Arc::new(AtomicBool::new(false));
        let connector = ScriptedConnector::new(
            vec!["12.50,90,0.35", "12.50,90", "", "garbage", "13.00,45,0.40"],
            stop.clone(),
        );
        let closes = connector.closes.clone();

        let mut session = Session::new(
            config,
            connector,
            CsvSinkFactory,
            CollectingReporter::default(),
        );
        let outcome = session.run(&stop);

        assert_eq!(outcome.end, SessionEnd::Interrupted);
        assert!(outcome.port_released);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.stats.reads, 5);
        assert_eq!(outcome.stats.accepted, 2);
        assert_eq!(outcome.stats.discarded, 2);
        assert_eq!(outcome.stats.empty, 1);

        let rows = data_rows(&output);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].ends_with(",12.50,90,0.35"));
        assert!(rows[1].ends_with(",13.00,45,0.40"));

        assert_eq!(session.reporter().records.len(), 2);
        assert_eq!(
            session.history(),
            &[
                SessionState::Idle,
                SessionState::Connecting,
                SessionState::Recording,
                SessionState::Closing,
                SessionState::Terminated,
            ]
        );
    }

    #[test]
    fn test_open_failure_never_creates_file() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let output = config.output_file.clone();
        let stop = Arc::new(AtomicBool::new(false));
        let mut connector = ScriptedConnector::new(vec![], stop.clone());
        connector.fail_open = true;

        let mut session = Session::new(
            config,
            connector,
            CsvSinkFactory,
            CollectingReporter::default(),
        );
        let outcome = session.run(&stop);

        assert!(matches!(outcome.end, SessionEnd::ConnectionFailed(_)));
        assert!(!outcome.port_released);
        assert!(!output.exists());
        assert_eq!(session.reporter().started, 0);
        assert_eq!(session.reporter().ends.len(), 1);
        assert_eq!(
            session.history(),
            &[
                SessionState::Idle,
                SessionState::Connecting,
                SessionState::Terminated,
            ]
        );
    }

    #[test]
    fn test_port_lost_mid_session_keeps_flushed_rows() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let output = config.output_file.clone();
        let stop = Arc::new(AtomicBool::new(false));
        let mut connector = ScriptedConnector::new(vec!["1,2,3", "4,5,6"], stop.clone());
        connector.lose_port = true;
        let closes = connector.closes.clone();

        let mut session = Session::new(
            config,
            connector,
            CsvSinkFactory,
            CollectingReporter::default(),
        );
        let outcome = session.run(&stop);

        assert!(matches!(outcome.end, SessionEnd::ConnectionFailed(_)));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert_eq!(data_rows(&output).len(), 2);
        assert_eq!(session.state(), SessionState::Terminated);
    }

    #[test]
    fn test_unwritable_output_is_critical_and_releases_port() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.output_file = dir.path().join("no-such-dir").join("session.csv");
        let stop = Arc::new(AtomicBool::new(false));
        let connector = ScriptedConnector::new(vec!["1,2,3"], stop.clone());
        let closes = connector.closes.clone();

        let mut session = Session::new(
            config,
            connector,
            CsvSinkFactory,
            CollectingReporter::default(),
        );
        let outcome = session.run(&stop);

        assert!(matches!(outcome.end, SessionEnd::Critical(_)));
        assert!(outcome.port_released);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.stats.reads, 0);
    }

    #[test]
    fn test_stop_during_settle_keeps_existing_output() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let output = config.output_file.clone();
        std::fs::write(&output, "Timestamp,Distance_cm,Servo_Angle_deg,Current_A\n09:00:00,1,2,3\n")
            .unwrap();
        let stop = Arc::new(AtomicBool::new(true));
        let connector = ScriptedConnector::new(vec!["4,5,6"], stop.clone());
        let closes = connector.closes.clone();

        let mut session = Session::new(
            config,
            connector,
            CsvSinkFactory,
            CollectingReporter::default(),
        );
        let outcome = session.run(&stop);

        assert_eq!(outcome.end, SessionEnd::Interrupted);
        assert_eq!(outcome.stats.reads, 0);
        assert!(outcome.port_released);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert_eq!(session.reporter().started, 0);
        assert_eq!(data_rows(&output), vec!["09:00:00,1,2,3"]);
    }

    /// 記憶體內的 sink，第 `fail_at` 筆寫入時模擬磁碟已滿
    struct FlakySink {
        rows: Arc<Mutex<Vec<Record>>>,
        fail_at: usize,
    }

    impl RecordSink for FlakySink {
        fn append(&mut self, record: &Record) -> Result<()> {
            let mut rows = self.rows.lock().unwrap();
            if rows.len() + 1 == self.fail_at {
                return Err(LoggerError::IoError(std::io::Error::other(
                    "No space left on device",
                )));
            }
            rows.push(record.clone());
            Ok(())
        }

        fn rows_written(&self) -> u64 {
            self.rows.lock().unwrap().len() as u64
        }
    }

    struct FlakySinkFactory {
        rows: Arc<Mutex<Vec<Record>>>,
        fail_at: usize,
    }

    impl SinkFactory for FlakySinkFactory {
        type Sink = FlakySink;

        fn create(&self, _path: &Path, _sync_to_disk: bool) -> Result<FlakySink> {
            Ok(FlakySink {
                rows: self.rows.clone(),
                fail_at: self.fail_at,
            })
        }
    }

    #[test]
    fn test_disk_full_mid_session_is_critical() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let stop = Arc::new(AtomicBool::new(false));
        let connector = ScriptedConnector::new(vec!["1,2,3", "4,5,6", "7,8,9"], stop.clone());
        let closes = connector.closes.clone();
        let rows = Arc::new(Mutex::new(Vec::new()));
        let sinks = FlakySinkFactory {
            rows: rows.clone(),
            fail_at: 2,
        };

        let mut session = Session::new(config, connector, sinks, CollectingReporter::default());
        let outcome = session.run(&stop);

        match &outcome.end {
            SessionEnd::Critical(msg) => assert!(msg.contains("No space left")),
            other => panic!("expected critical end, got {:?}", other),
        }
        assert!(outcome.port_released);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.stats.accepted, 1);
        assert_eq!(outcome.stats.reads, 2);

        let rows = rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].reading.fields(), ["1", "2", "3"]);
        assert_eq!(session.reporter().records.len(), 1);
        assert_eq!(session.state(), SessionState::Terminated);
    }
}

use crate::domain::model::{PortSettings, Record, SessionEnd, SessionStats};
use crate::utils::error::Result;
use std::path::Path;
use std::time::Duration;

/// 提供一行一行文字的資料來源（通常是序列埠）
pub trait LineSource {
    /// 阻塞直到讀到一行或逾時；逾時時回傳目前累積的內容（可能是空字串）
    fn read_line(&mut self) -> Result<String>;
    fn is_open(&self) -> bool;
    /// 釋放底層 handle，重複呼叫不會有作用
    fn close(&mut self);
}

pub trait Connector {
    type Source: LineSource;

    /// 開啟連線並等待裝置重置完成
    fn connect(&self, settings: &PortSettings) -> Result<Self::Source>;
}

pub trait RecordSink {
    fn append(&mut self, record: &Record) -> Result<()>;
    fn rows_written(&self) -> u64;
}

/// 開埠成功後才建立輸出，所以 Session 拿到的是工廠而不是已開好的 sink
pub trait SinkFactory {
    type Sink: RecordSink;

    /// 建立（或覆寫）輸出並寫入標頭
    fn create(&self, path: &Path, sync_to_disk: bool) -> Result<Self::Sink>;
}

pub trait Reporter {
    fn session_started(&mut self, port: &str, output: &Path);
    fn record_accepted(&mut self, record: &Record);
    fn session_ended(&mut self, end: &SessionEnd, stats: &SessionStats, port_released: bool);
}

pub trait ConfigProvider {
    fn port(&self) -> &str;
    fn baud_rate(&self) -> u32;
    fn read_timeout(&self) -> Duration;
    fn settle_delay(&self) -> Duration;
    fn output_file(&self) -> &Path;
    fn delimiter(&self) -> char;
    fn sync_to_disk(&self) -> bool;

    fn port_settings(&self) -> PortSettings {
        PortSettings {
            port: self.port().to_string(),
            baud_rate: self.baud_rate(),
            read_timeout: self.read_timeout(),
            settle_delay: self.settle_delay(),
        }
    }
}

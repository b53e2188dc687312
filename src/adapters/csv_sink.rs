use crate::domain::model::{Record, HEADERS};
use crate::domain::ports::{RecordSink, SinkFactory};
use crate::utils::error::Result;
use csv::{Terminator, Writer, WriterBuilder};
use std::fs::File;
use std::path::Path;

/// 每筆資料寫入後立即 flush 的 CSV 紀錄器
pub struct CsvRecorder {
    writer: Writer<File>,
    sync_to_disk: bool,
    rows_written: u64,
}

impl CsvRecorder {
    /// 建立（或覆寫）輸出檔並寫入標頭
    pub fn create<P: AsRef<Path>>(path: P, sync_to_disk: bool) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;

        let mut writer = WriterBuilder::new()
            .terminator(platform_terminator())
            .from_writer(file);
        writer.write_record(HEADERS)?;

        let mut recorder = Self {
            writer,
            sync_to_disk,
            rows_written: 0,
        };
        recorder.flush()?;

        tracing::debug!("Created {} with header row", path.display());
        Ok(recorder)
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        if self.sync_to_disk {
            self.writer.get_ref().sync_data()?;
        }
        Ok(())
    }
}

impl RecordSink for CsvRecorder {
    fn append(&mut self, record: &Record) -> Result<()> {
        self.writer.write_record(record.to_row())?;
        self.flush()?;
        self.rows_written += 1;
        Ok(())
    }

    fn rows_written(&self) -> u64 {
        self.rows_written
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvSinkFactory;

impl SinkFactory for CsvSinkFactory {
    type Sink = CsvRecorder;

    fn create(&self, path: &Path, sync_to_disk: bool) -> Result<CsvRecorder> {
        CsvRecorder::create(path, sync_to_disk)
    }
}

fn platform_terminator() -> Terminator {
    if cfg!(windows) {
        Terminator::CRLF
    } else {
        Terminator::Any(b'\n')
    }
}

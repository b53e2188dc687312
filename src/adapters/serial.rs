use crate::domain::model::PortSettings;
use crate::domain::ports::{Connector, LineSource};
use crate::utils::error::{LoggerError, Result};
use serialport::SerialPort;
use std::io::{ErrorKind, Read};
use std::time::{Duration, Instant};

const READ_CHUNK: usize = 256;

/// 以 `serialport` 開啟實體序列埠
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialConnector;

impl Connector for SerialConnector {
    type Source = LineReader<Box<dyn SerialPort>>;

    fn connect(&self, settings: &PortSettings) -> Result<Self::Source> {
        let port_name = native_port_name(&settings.port);
        tracing::debug!(
            "Opening {} at {} baud (timeout {:?})",
            port_name,
            settings.baud_rate,
            settings.read_timeout
        );

        let port = serialport::new(&port_name, settings.baud_rate)
            .timeout(settings.read_timeout)
            .flow_control(serialport::FlowControl::None)
            .open()
            .map_err(|source| LoggerError::ConnectionError {
                port: settings.port.clone(),
                source,
            })?;

        // 開埠會觸發板子重置，等它開機完成再開始讀
        if !settings.settle_delay.is_zero() {
            tracing::debug!("Waiting {:?} for device reset", settings.settle_delay);
            std::thread::sleep(settings.settle_delay);
        }

        Ok(LineReader::new(port, settings.read_timeout))
    }
}

/// On Windows, COM ports >= 10 need the `\\.\COMxx` form.
fn native_port_name(port: &str) -> String {
    if cfg!(target_os = "windows") && port.starts_with("COM") && !port.starts_with(r"\\") {
        format!(r"\\.\{}", port)
    } else {
        port.to_string()
    }
}

pub fn list_ports() -> Result<Vec<String>> {
    let ports = serialport::available_ports().map_err(|source| LoggerError::ConnectionError {
        port: "*".to_string(),
        source,
    })?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

/// 把位元組流切成文字行
///
/// 每次 `read_line` 最多等 `timeout`：期限到了、`read` 逾時或讀到 0 bytes，
/// 就把目前累積的位元組當作一行交出去，所以被截斷的半行不會和下一次讀到的內容接起來。
/// 裝置持續送出沒有換行的雜訊（例如鮑率設錯）時，呼叫端一樣能在期限後拿回控制權。
pub struct LineReader<R: Read> {
    inner: Option<R>,
    buffer: Vec<u8>,
    timeout: Duration,
}

impl<R: Read> LineReader<R> {
    pub fn new(inner: R, timeout: Duration) -> Self {
        Self {
            inner: Some(inner),
            buffer: Vec::new(),
            timeout,
        }
    }

    fn take_all(&mut self) -> String {
        let end = self.buffer.len();
        self.take_line(end)
    }

    fn take_line(&mut self, end: usize) -> String {
        let raw: Vec<u8> = self.buffer.drain(..end).collect();
        decode_ignoring_invalid(&raw)
    }
}

impl<R: Read> LineSource for LineReader<R> {
    fn read_line(&mut self) -> Result<String> {
        let mut chunk = [0u8; READ_CHUNK];
        let deadline = Instant::now() + self.timeout;

        loop {
            if let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
                return Ok(self.take_line(pos + 1));
            }

            let inner = self.inner.as_mut().ok_or_else(|| {
                LoggerError::PortLostError(std::io::Error::new(
                    ErrorKind::NotConnected,
                    "serial port already closed",
                ))
            })?;

            match inner.read(&mut chunk) {
                Ok(0) => return Ok(self.take_all()),
                Ok(n) => self.buffer.extend_from_slice(&chunk[..n]),
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    return Ok(self.take_all());
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(LoggerError::PortLostError(e)),
            }

            if Instant::now() >= deadline && !self.buffer.contains(&b'\n') {
                tracing::debug!(
                    "No line break within {:?}, handing over {} bytes",
                    self.timeout,
                    self.buffer.len()
                );
                return Ok(self.take_all());
            }
        }
    }

    fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    fn close(&mut self) {
        if self.inner.take().is_some() {
            self.buffer.clear();
            tracing::debug!("Serial handle released");
        }
    }
}

/// 無效的 UTF-8 序列直接丟掉，不替換成 U+FFFD
pub fn decode_ignoring_invalid(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text.trim().to_string()
}

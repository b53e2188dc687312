pub mod engine;
pub mod parser;
pub mod session;

pub use crate::domain::model::{Reading, Record};
pub use crate::domain::ports::{ConfigProvider, Connector, LineSource, RecordSink, Reporter};
pub use crate::utils::error::Result;

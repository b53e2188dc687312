// Adapters layer: concrete implementations for the serial port, the CSV file and the console.

pub mod console;
pub mod csv_sink;
pub mod serial;

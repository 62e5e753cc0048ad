pub mod ports;
pub mod status_reporter;

pub use ports::StatusSink;
pub use status_reporter::StatusReporter;

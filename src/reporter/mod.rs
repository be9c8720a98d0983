pub mod console;
pub mod json_file;
pub mod state;

pub use console::ConsoleReporter;
pub use json_file::{JsonFileReporter, Report};
pub use state::{ReportSink, Reporter, ReporterPhase};

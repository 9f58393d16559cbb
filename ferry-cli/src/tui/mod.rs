mod reporter;
mod status;

pub use reporter::{Mode, TerminalReporter};
pub use status::{ScanStatus, ScanSummary};

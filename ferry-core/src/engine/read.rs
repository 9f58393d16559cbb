use tracing::info;

use super::control::{Control, Flow};
use super::{NullReporter, ReadReport, Reporter, Warning, WarningKind};
use crate::config::TransferConfig;
use crate::error::Result;
use crate::progress::{NullPlotter, Plotter};
use crate::stream::{Event, InteractiveController, KeySource, NoKeys, StreamReader};
use crate::tree::{Counter, SizeTree};

/// Reads every file of a scanned tree without writing anything, showing
/// the same live progress as a copy.
pub struct TreeReader {
    config: TransferConfig,
}

impl TreeReader {
    pub fn new(config: TransferConfig) -> Self {
        Self { config }
    }

    pub fn run<K: KeySource>(
        &self,
        tree: &SizeTree,
        keys: K,
        reporter: &mut dyn Reporter,
        plotter: &mut dyn Plotter,
    ) -> Result<ReadReport> {
        info!(files = tree.counter.files, bytes = tree.counter.bytes, "read: started");

        let mut controller = InteractiveController::new(StreamReader::new(tree, &self.config), keys);
        let mut control = Control::new(reporter, plotter, self.config.report_interval);
        let mut report = ReadReport::default();
        let mut file_bytes = 0u64;

        while let Some(event) = controller.next() {
            match event? {
                Event::Keystroke(stroke) => {
                    if control.handle(&stroke, &mut controller)? == Flow::Quit {
                        report.interrupted = true;
                        break;
                    }
                }
                Event::FileOpened { path, ancestry, .. } => {
                    file_bytes = 0;
                    control.observe(&path, &ancestry);
                }
                Event::DataChunk {
                    path, ancestry, len, ..
                } => {
                    file_bytes += len as u64;
                    control.observe(&path, &ancestry);
                }
                Event::EndOfFile { path, ancestry, .. } => {
                    report.read += Counter::file(file_bytes);
                    control.observe(&path, &ancestry);
                }
                Event::BadLeaf { path, error, .. } => {
                    report.warnings.push(Warning::new(path, WarningKind::BadLeaf(error)));
                }
                Event::Directory { .. } | Event::Leaf { .. } | Event::Special { .. } => {}
            }
        }

        info!(read = %report.read, interrupted = report.interrupted, "read: finished");
        Ok(report)
    }
}

/// Read `tree` without a terminal
pub fn read_tree(tree: &SizeTree, config: &TransferConfig) -> Result<ReadReport> {
    TreeReader::new(config.clone()).run(tree, NoKeys, &mut NullReporter, &mut NullPlotter)
}

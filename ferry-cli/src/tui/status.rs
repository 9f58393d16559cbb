use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::{
    cursor::MoveToColumn,
    queue,
    style::Print,
    terminal::{self, Clear, ClearType},
};
use ferry_core::{ScanMessage, ScanProgress};

use crate::ui::truncate_left;

/// What the scan left out of the tree
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Inputs whose destination already exists
    pub skipped: Vec<PathBuf>,
    /// Entries that could not be listed or stat'ed
    pub errors: u64,
}

/// Single status line rewritten in place while the scan runs
pub struct ScanStatus<W: Write> {
    out: W,
    interval: Duration,
    last: Option<Instant>,
    summary: ScanSummary,
}

impl<W: Write> ScanStatus<W> {
    pub fn new(out: W, interval: Duration) -> Self {
        Self {
            out,
            interval,
            last: None,
            summary: ScanSummary::default(),
        }
    }

    pub fn observe(&mut self, message: ScanMessage) -> io::Result<()> {
        match message {
            ScanMessage::Progress(progress) => {
                if self.last.is_some_and(|last| last.elapsed() < self.interval) {
                    return Ok(());
                }
                self.last = Some(Instant::now());
                let line = status_line(&progress, line_width());
                self.rewrite(&line)
            }
            ScanMessage::Skipped(path) => {
                self.summary.skipped.push(path);
                Ok(())
            }
            ScanMessage::Completed { total, errors } => {
                self.summary.errors = errors;
                self.rewrite(&format!("{:6} {:11}", total.files, total.bytes))?;
                queue!(self.out, Print("\n"))?;
                self.out.flush()
            }
        }
    }

    pub fn into_summary(self) -> ScanSummary {
        self.summary
    }

    fn rewrite(&mut self, line: &str) -> io::Result<()> {
        queue!(
            self.out,
            MoveToColumn(0),
            Clear(ClearType::UntilNewLine),
            Print(line)
        )?;
        self.out.flush()
    }
}

fn line_width() -> usize {
    terminal::size().map(|(w, _)| w as usize).unwrap_or(80)
}

/// `files bytes path`, the path cut from the left to fit
fn status_line(progress: &ScanProgress, width: usize) -> String {
    let counts = format!("{:6} {:11} ", progress.files_scanned, progress.bytes_scanned);
    let path = progress
        .current_path
        .as_ref()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    let room = width.saturating_sub(counts.len() + 1);
    format!("{counts}{}", truncate_left(&path, room))
}

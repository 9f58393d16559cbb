use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use crate::size::format_kmg;

use super::ancestry::Ancestry;
use super::clock::{Seconds, format_duration, format_time};

/// Weight of the previous arrival estimate when smoothing
const SMOOTHNESS: f64 = 30.0;

/// Span of history used for the current speed
const SPEED_WINDOW: f64 = 10.0;

/// Prediction line of one level
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Timing {
    /// Nothing has moved yet
    Unknown { started: Seconds, elapsed: f64 },
    /// The predicted arrival already passed
    Imminent { started: Seconds, elapsed: f64 },
    Predicted {
        started: Seconds,
        elapsed: f64,
        remaining: f64,
        arrival: Seconds,
    },
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Timing::Unknown { started, elapsed } => write!(
                f,
                "{} + {} (no prediction)",
                format_time(started),
                format_duration(elapsed)
            ),
            Timing::Imminent { started, elapsed } => write!(
                f,
                "{} + {} (imminent)",
                format_time(started),
                format_duration(elapsed)
            ),
            Timing::Predicted {
                started,
                elapsed,
                remaining,
                arrival,
            } => write!(
                f,
                "{} + {} + {} = {}",
                format_time(started),
                format_duration(elapsed),
                format_duration(remaining),
                format_time(arrival)
            ),
        }
    }
}

/// Column positions of a progress bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarColumns {
    pub start: usize,
    pub position: usize,
    pub end: usize,
}

impl BarColumns {
    /// Columns before the current position are filled
    pub fn is_filled(&self, column: usize) -> bool {
        column < self.position
    }

    /// Columns covered by the current entry's window
    pub fn is_marked(&self, column: usize) -> bool {
        (self.start..=self.end).contains(&column)
    }
}

/// Snapshot of one ancestry level relative to its parent's window
#[derive(Debug, Clone, PartialEq)]
pub struct LevelView {
    /// Path of the entry this level is currently in
    pub label: PathBuf,
    /// Start of the entry's window, in bytes from the parent's start
    pub start: u64,
    /// Current position, in bytes from the parent's start
    pub position: u64,
    /// End of the entry's window, in bytes from the parent's start
    pub end: u64,
    /// Size of the parent's window
    pub size: u64,
    /// Rounded completion percentage, `None` for empty windows
    pub percent: Option<f64>,
    /// Recent throughput in bytes per second
    pub speed: Option<f64>,
    pub timing: Timing,
}

impl LevelView {
    /// `" 42.0%   1.2M/3.0M"` or `"(empty)"`
    pub fn status_text(&self) -> String {
        match self.percent {
            Some(percent) => format!(
                "{:5.1}%   {}/{}",
                percent,
                format_kmg(self.position),
                format_kmg(self.size)
            ),
            None => String::from("(empty)"),
        }
    }

    pub fn speed_text(&self) -> Option<String> {
        self.speed.map(|speed| format!("{}/s", format_kmg(speed as u64)))
    }

    pub fn timing_text(&self) -> String {
        self.timing.to_string()
    }

    /// Last component of the label
    pub fn name(&self) -> String {
        self.label
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Map the window onto `width` columns; `None` for empty windows
    pub fn columns(&self, width: usize) -> Option<BarColumns> {
        if self.size == 0 {
            return None;
        }
        let scale = |bytes: u64| (bytes as u128 * width as u128 / self.size as u128) as usize;
        Some(BarColumns {
            start: scale(self.start),
            position: scale(self.position),
            end: scale(self.end),
        })
    }
}

/// Turns an ancestry chain into per-level views, smoothing each level's
/// arrival estimate across renders.
#[derive(Debug, Default)]
pub struct ProgressRenderer {
    arrivals: HashMap<PathBuf, Seconds>,
}

impl ProgressRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Views for every level below the root, outermost first. The position is
    /// the start of the innermost level.
    pub fn render(&mut self, leaf: &Ancestry, now: Seconds) -> Vec<LevelView> {
        let lineage = leaf.lineage();
        let value = leaf.start().bytes;
        let mut views = Vec::with_capacity(lineage.len().saturating_sub(1));
        let mut live = Vec::with_capacity(views.capacity());

        for pair in lineage.windows(2) {
            let (parent, level) = (pair[0], pair[1]);
            let key = parent.path().clone();
            views.push(self.level_view(parent, level, value, key.clone(), now));
            live.push(key);
        }

        self.arrivals.retain(|key, _| live.contains(key));
        views
    }

    fn level_view(
        &mut self,
        parent: &Ancestry,
        level: &Ancestry,
        value: u64,
        key: PathBuf,
        now: Seconds,
    ) -> LevelView {
        let origin = parent.start().bytes;
        let size = parent.end().bytes.saturating_sub(origin);
        let position = value.saturating_sub(origin);

        let samples = level.samples();
        let first = samples.first();
        let newest = samples.last();
        let elapsed = (now - first.time).max(0.0);

        let percent = (size > 0).then(|| {
            let percent = position as f64 * 100.0 / size as f64;
            round_for_speed(percent, percent / elapsed)
        });

        let timing = if position > 0 {
            let mut arrival =
                elapsed * (size.saturating_sub(position)) as f64 / position as f64 + newest.time;
            if let Some(previous) = self.arrivals.get(&key) {
                arrival = (SMOOTHNESS * previous + arrival) / (SMOOTHNESS + 1.0);
            }
            self.arrivals.insert(key, arrival);

            let remaining = arrival - now;
            if remaining < 0.0 {
                Timing::Imminent {
                    started: first.time,
                    elapsed,
                }
            } else {
                Timing::Predicted {
                    started: first.time,
                    elapsed,
                    remaining,
                    arrival,
                }
            }
        } else {
            Timing::Unknown {
                started: first.time,
                elapsed,
            }
        };
        drop(samples);

        LevelView {
            label: level.path().clone(),
            start: level.start().bytes.saturating_sub(origin),
            position,
            end: level.end().bytes.saturating_sub(origin),
            size,
            percent,
            speed: speed(level, value, now),
            timing,
        }
    }
}

/// Fast levels get coarse percentages so the number stays readable
fn round_for_speed(percent: f64, percent_per_second: f64) -> f64 {
    if percent_per_second > 20.0 {
        (percent / 10.0).round() * 10.0
    } else if percent_per_second > 10.0 {
        percent.round()
    } else {
        (percent * 10.0).round() / 10.0
    }
}

/// Bytes per second over the recent window, or over the whole history when
/// it is shorter than the window
fn speed(level: &Ancestry, value: u64, now: Seconds) -> Option<f64> {
    match level.counter_at(now - SPEED_WINDOW) {
        Ok(then) => Some((value as f64 - then).max(0.0) / SPEED_WINDOW),
        Err(_) => {
            let first = level.samples().first();
            let elapsed = now - first.time;
            (elapsed > 0.0)
                .then(|| (value.saturating_sub(first.counter.bytes)) as f64 / elapsed)
        }
    }
}

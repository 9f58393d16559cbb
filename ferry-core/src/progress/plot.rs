use std::io::{self, Write};
use std::process::{Child, Command, Stdio};

use tracing::debug;

use super::ancestry::Ancestry;

const GNUPLOT_SCRIPT: &str = "set ytics auto\n\
set ytics nomirror\n\
set y2tics auto\n\
set y2tics nomirror\n\
plot [0:] [0:100] \\\n   [0:] \\\n   '-' with linespoints lw 3, \\\n   '-' axes x1y2 with linespoints lw 1\n";

/// Sample history of one level as `(seconds since the first sample,
/// percent of the parent's window)` points
pub fn plot_points(level: &Ancestry) -> Vec<(f64, f64)> {
    let (origin, end) = match level.parent() {
        Some(parent) => (parent.start().bytes, parent.end().bytes),
        None => (0, level.end().bytes),
    };
    let size = end.saturating_sub(origin);

    let samples = level.samples();
    let started = samples.first().time;
    samples
        .iter()
        .map(|sample| {
            let percent = if size == 0 {
                100.0
            } else {
                sample.counter.bytes.saturating_sub(origin) as f64 * 100.0 / size as f64
            };
            (sample.time - started, percent)
        })
        .collect()
}

/// Destination for interactive plot requests
pub trait Plotter {
    fn plot(&mut self, points: &[(f64, f64)]) -> io::Result<()>;
}

/// Discards plot requests
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPlotter;

impl Plotter for NullPlotter {
    fn plot(&mut self, _points: &[(f64, f64)]) -> io::Result<()> {
        Ok(())
    }
}

/// Pipes each plot into a persistent gnuplot window
#[derive(Debug, Default)]
pub struct GnuplotPlotter {
    children: Vec<Child>,
}

impl GnuplotPlotter {
    pub fn new() -> Self {
        Self::default()
    }

    fn reap(&mut self) {
        self.children
            .retain_mut(|child| !matches!(child.try_wait(), Ok(Some(_))));
    }
}

impl Plotter for GnuplotPlotter {
    fn plot(&mut self, points: &[(f64, f64)]) -> io::Result<()> {
        self.reap();

        let mut child = Command::new("gnuplot")
            .args(["-persist", "-geometry", "+0+0"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            let mut script = String::from(GNUPLOT_SCRIPT);
            // once scaled against the left axis, once against the right
            for _ in 0..2 {
                for (time, percent) in points {
                    script.push_str(&format!("{:.6} {:.6}\n", time, percent));
                }
                script.push_str("e\n");
            }
            stdin.write_all(script.as_bytes())?;
        }

        debug!(points = points.len(), pid = child.id(), "plot: started gnuplot");
        self.children.push(child);
        Ok(())
    }
}

impl Drop for GnuplotPlotter {
    fn drop(&mut self) {
        for child in &mut self.children {
            let _ = child.wait();
        }
    }
}

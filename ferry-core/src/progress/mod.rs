//! Nested progress levels with ETA prediction

mod ancestry;
mod clock;
mod plot;
mod samples;
mod view;

pub use ancestry::Ancestry;
pub use clock::{Seconds, format_duration, format_time, format_time_at, now};
pub use plot::{GnuplotPlotter, NullPlotter, Plotter, plot_points};
pub use samples::{Sample, TimeSamples};
pub use view::{BarColumns, LevelView, ProgressRenderer, Timing};

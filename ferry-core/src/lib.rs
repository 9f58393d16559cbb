pub mod config;
pub mod destination;
pub mod engine;
pub mod error;
pub mod progress;
pub mod scanner;
pub mod size;
pub mod stream;
pub mod tree;

pub use config::{SampleConfig, TransferConfig};
pub use destination::{destination_for, part_path_for};
pub use engine::{
    CopyEngine, CopyReport, NullReporter, ProgressFrame, ReadReport, Reporter, TreeReader, Warning,
    WarningKind, copy, read_tree,
};
pub use error::{FerryError, Result};
pub use progress::{Ancestry, GnuplotPlotter, LevelView, NullPlotter, Plotter, TimeSamples, Timing};
pub use scanner::{ScanConfig, ScanMessage, ScanProgress, Scanner, scan};
pub use size::{format_count, format_kmg, format_size, parse_kmg, size_percentage};
pub use stream::{
    Event, InteractiveController, KeySource, Keyboard, NoKeys, StreamReader, TreeWalker, WalkOrder,
};
pub use tree::{Counter, NodeKind, SizeTree};

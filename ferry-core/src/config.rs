use std::time::Duration;

/// Default number of bytes read and written per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 16;

/// Default number of time samples kept per ancestry level
pub const TIMES_CACHE_SIZE: usize = 200;

/// Default number of samples dropped when the cache overflows
pub const TIMES_CACHE_CHUNK: usize = 50;

/// Default minimum number of seconds between two samples
pub const TIMES_MIN_DISTANCE: f64 = 1.0;

/// Time-sample cache tuning shared by every ancestry level of one traversal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleConfig {
    /// Maximum number of samples kept
    pub cache_size: usize,
    /// Number of interior samples dropped on overflow
    pub cache_chunk: usize,
    /// Minimum distance in seconds between two samples
    pub min_distance: f64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            cache_size: TIMES_CACHE_SIZE,
            cache_chunk: TIMES_CACHE_CHUNK,
            min_distance: TIMES_MIN_DISTANCE,
        }
    }
}

/// Settings for reading (and copying) a scanned tree
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Size of the shared read buffer
    pub chunk_size: usize,
    /// Follow symbolic links instead of treating them as special files
    pub follow_symlinks: bool,
    /// Minimum time between two progress reports
    pub report_interval: Duration,
    /// ETA sample cache tuning
    pub samples: SampleConfig,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            follow_symlinks: false,
            report_interval: Duration::from_millis(50),
            samples: SampleConfig::default(),
        }
    }
}

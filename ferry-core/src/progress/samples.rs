use crate::config::SampleConfig;
use crate::error::{FerryError, Result};
use crate::tree::Counter;

use super::clock::Seconds;

/// One observation of a traversal position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub time: Seconds,
    pub counter: Counter,
}

/// Bounded, strictly time-ordered history of positions at one ancestry level.
///
/// Overflow drops the interior samples that lie most nearly on a straight line
/// with their neighbours; the first and last sample always survive.
#[derive(Debug, Clone)]
pub struct TimeSamples {
    samples: Vec<Sample>,
    config: SampleConfig,
}

impl TimeSamples {
    pub fn new(config: SampleConfig, time: Seconds, counter: Counter) -> Self {
        let mut samples = Vec::with_capacity(config.cache_size.min(64) + 1);
        samples.push(Sample { time, counter });
        Self { samples, config }
    }

    /// Append a sample unless the previous one is younger than the minimum
    /// distance. Returns whether the sample was kept.
    pub fn record(&mut self, time: Seconds, counter: Counter) -> bool {
        if let Some(last) = self.samples.last()
            && (time <= last.time || time < last.time + self.config.min_distance)
        {
            return false;
        }

        self.samples.push(Sample { time, counter });
        if self.samples.len() > self.config.cache_size {
            self.evict();
        }
        true
    }

    fn evict(&mut self) {
        let len = self.samples.len();
        if len < 3 {
            return;
        }
        let count = self.config.cache_chunk.clamp(1, len - 2);

        let mut scored: Vec<(f64, usize)> = (1..len - 1)
            .map(|i| (self.colinearity(i), i))
            .collect();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut doomed = vec![false; len];
        for &(_, index) in scored.iter().take(count) {
            doomed[index] = true;
        }

        let mut index = 0;
        self.samples.retain(|_| {
            let keep = !doomed[index];
            index += 1;
            keep
        });
    }

    /// Difference between the slopes left and right of sample `i`; small
    /// values mean the sample is linearly interpolatable from its neighbours.
    /// Coincident timestamps count as fully redundant.
    fn colinearity(&self, i: usize) -> f64 {
        let (prev, here, next) = (self.samples[i - 1], self.samples[i], self.samples[i + 1]);
        let left_dt = here.time - prev.time;
        let right_dt = next.time - here.time;
        if left_dt <= 0.0 || right_dt <= 0.0 {
            return 0.0;
        }
        let left = (here.counter.bytes as f64 - prev.counter.bytes as f64) / left_dt;
        let right = (next.counter.bytes as f64 - here.counter.bytes as f64) / right_dt;
        (left - right).abs()
    }

    /// Byte count at `time`, linearly interpolated between the bracketing
    /// samples. Times after the newest sample follow the last segment.
    pub fn counter_at(&self, time: Seconds) -> Result<f64> {
        let first = self.first();
        if time < first.time {
            return Err(FerryError::Extrapolation {
                requested: time,
                earliest: first.time,
            });
        }

        // Index of the first sample strictly after `time`
        let upper = self.samples.partition_point(|s| s.time <= time);
        let lower = upper - 1;
        let at = self.samples[lower];
        if at.time == time || self.samples.len() == 1 {
            return Ok(at.counter.bytes as f64);
        }

        let (a, b) = if upper < self.samples.len() {
            (at, self.samples[upper])
        } else {
            (self.samples[lower - 1], at)
        };
        let slope = (b.counter.bytes as f64 - a.counter.bytes as f64) / (b.time - a.time);
        Ok(a.counter.bytes as f64 + slope * (time - a.time))
    }

    pub fn first(&self) -> Sample {
        self.samples[0]
    }

    pub fn last(&self) -> Sample {
        self.samples[self.samples.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn config(&self) -> SampleConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(size: usize, chunk: usize) -> SampleConfig {
        SampleConfig {
            cache_size: size,
            cache_chunk: chunk,
            min_distance: 1.0,
        }
    }

    #[test]
    fn test_min_distance_is_enforced() {
        let mut samples = TimeSamples::new(SampleConfig::default(), 100.0, Counter::ZERO);
        assert!(!samples.record(100.5, Counter::data(5)));
        assert!(samples.record(101.0, Counter::data(10)));
        assert!(!samples.record(101.9, Counter::data(12)));
        assert!(!samples.record(50.0, Counter::data(12)));
        assert_eq!(samples.len(), 2);
    }

    #[test]
    fn test_counter_at_exact_and_interpolated() {
        let mut samples = TimeSamples::new(SampleConfig::default(), 10.0, Counter::data(0));
        samples.record(12.0, Counter::data(100));
        samples.record(14.0, Counter::data(100));
        samples.record(18.0, Counter::data(500));

        assert_eq!(samples.counter_at(10.0).unwrap(), 0.0);
        assert_eq!(samples.counter_at(12.0).unwrap(), 100.0);
        assert_eq!(samples.counter_at(18.0).unwrap(), 500.0);
        assert_eq!(samples.counter_at(11.0).unwrap(), 50.0);
        assert_eq!(samples.counter_at(13.0).unwrap(), 100.0);
        assert_eq!(samples.counter_at(15.0).unwrap(), 200.0);
        // beyond the newest sample the last segment is followed
        assert_eq!(samples.counter_at(19.0).unwrap(), 600.0);
    }

    #[test]
    fn test_counter_at_before_first_sample_fails() {
        let samples = TimeSamples::new(SampleConfig::default(), 10.0, Counter::ZERO);
        assert!(matches!(
            samples.counter_at(9.0),
            Err(FerryError::Extrapolation { .. })
        ));
        assert_eq!(samples.counter_at(10.0).unwrap(), 0.0);
        assert_eq!(samples.counter_at(11.0).unwrap(), 0.0);
    }

    #[test]
    fn test_cache_stays_bounded_and_keeps_endpoints() {
        let mut samples = TimeSamples::new(config(200, 50), 0.0, Counter::ZERO);
        let mut bytes = 0;
        for i in 1..=1000u64 {
            // uneven throughput so the scores differ
            bytes += (i % 7) * 1000 + 1;
            assert!(samples.record(i as f64 * 1.5, Counter::data(bytes)));
            assert!(samples.len() <= 200);
        }
        assert_eq!(samples.first().time, 0.0);
        assert_eq!(samples.last().time, 1500.0);
        assert_eq!(samples.last().counter.bytes, bytes);
        assert!(samples.iter().zip(samples.iter().skip(1)).all(|(a, b)| a.time < b.time));
    }

    #[test]
    fn test_eviction_prefers_colinear_samples() {
        let mut samples = TimeSamples::new(config(4, 1), 0.0, Counter::ZERO);
        samples.record(1.0, Counter::data(10));
        samples.record(2.0, Counter::data(20));
        // a bend at t=2 makes sample 1 the most redundant one
        samples.record(3.0, Counter::data(100));
        samples.record(4.0, Counter::data(180));

        let times: Vec<f64> = samples.iter().map(|s| s.time).collect();
        assert_eq!(times, vec![0.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_coincident_timestamps_are_most_redundant() {
        let mut samples = TimeSamples::new(
            SampleConfig {
                cache_size: 3,
                cache_chunk: 1,
                min_distance: 0.0,
            },
            0.0,
            Counter::ZERO,
        );
        samples.samples.push(Sample {
            time: 1.0,
            counter: Counter::data(1),
        });
        samples.samples.push(Sample {
            time: 1.0,
            counter: Counter::data(900),
        });
        assert_eq!(samples.colinearity(1), 0.0);
        assert!(samples.record(2.0, Counter::data(1000)));
        assert_eq!(samples.len(), 3);
    }
}

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// A (files, bytes) pair.
///
/// Used both for the size of a tree node and for cumulative progress through a
/// traversal, where it acts as an absolute offset into the whole tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Counter {
    pub files: u64,
    pub bytes: u64,
}

impl Counter {
    pub const ZERO: Counter = Counter { files: 0, bytes: 0 };

    pub const fn new(files: u64, bytes: u64) -> Self {
        Self { files, bytes }
    }

    /// Counter of a single regular file
    pub const fn file(bytes: u64) -> Self {
        Self { files: 1, bytes }
    }

    /// Counter of a chunk of data inside a file already counted
    pub const fn data(bytes: u64) -> Self {
        Self { files: 0, bytes }
    }
}

impl Add for Counter {
    type Output = Counter;

    fn add(self, other: Counter) -> Counter {
        Counter {
            files: self.files + other.files,
            bytes: self.bytes + other.bytes,
        }
    }
}

impl AddAssign for Counter {
    fn add_assign(&mut self, other: Counter) {
        self.files += other.files;
        self.bytes += other.bytes;
    }
}

impl Sum for Counter {
    fn sum<I: Iterator<Item = Counter>>(iter: I) -> Counter {
        iter.fold(Counter::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Counter> for Counter {
    fn sum<I: Iterator<Item = &'a Counter>>(iter: I) -> Counter {
        iter.copied().sum()
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.files, self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_monoid() {
        let a = Counter::new(1, 10);
        let b = Counter::new(2, 5);
        assert_eq!(a + b, b + a);
        assert_eq!(a + Counter::ZERO, a);
        assert_eq!((a + b) + Counter::file(3), a + (b + Counter::file(3)));
    }

    #[test]
    fn test_counter_sum() {
        let total: Counter = [Counter::file(4), Counter::file(6), Counter::data(2)]
            .iter()
            .sum();
        assert_eq!(total, Counter::new(2, 12));
    }
}

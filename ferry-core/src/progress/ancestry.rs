use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use crate::config::SampleConfig;
use crate::error::Result;
use crate::tree::Counter;

use super::clock::Seconds;
use super::samples::TimeSamples;

/// One level of the traversal path from the root to the current position.
///
/// A level describes the window `[start, end)` that its current entry occupies
/// inside the parent's window, plus the sample history used to predict when
/// the parent's window will be finished. Children hold their parent through an
/// `Rc`; parents never point down.
///
/// A level is reused for all siblings below one directory: moving to the next
/// sibling replaces the window and path but keeps the samples, so the history
/// covers the whole directory.
pub struct Ancestry {
    start: Cell<Counter>,
    end: Cell<Counter>,
    path: RefCell<PathBuf>,
    samples: RefCell<TimeSamples>,
    parent: Option<Rc<Ancestry>>,
}

impl Ancestry {
    /// Top level covering the whole tree
    pub fn root(end: Counter, path: PathBuf, config: SampleConfig, now: Seconds) -> Rc<Self> {
        Rc::new(Self {
            start: Cell::new(Counter::ZERO),
            end: Cell::new(end),
            path: RefCell::new(path),
            samples: RefCell::new(TimeSamples::new(config, now, Counter::ZERO)),
            parent: None,
        })
    }

    /// New level below `parent` whose first window is `[start, end)`
    pub fn child(
        parent: &Rc<Ancestry>,
        start: Counter,
        end: Counter,
        path: PathBuf,
        now: Seconds,
    ) -> Rc<Self> {
        let config = parent.samples.borrow().config();
        Rc::new(Self {
            start: Cell::new(start),
            end: Cell::new(end),
            path: RefCell::new(path),
            samples: RefCell::new(TimeSamples::new(config, now, start)),
            parent: Some(Rc::clone(parent)),
        })
    }

    /// Move this level to the next sibling's window and record the position
    /// on every level up to the root.
    pub fn set_window(&self, start: Counter, end: Counter, path: PathBuf, now: Seconds) {
        self.end.set(end);
        self.path.replace(path);
        self.advance(start, now);
    }

    /// Record `position` as the current start of this level and as a sample
    /// on every level up to the root
    pub fn advance(&self, position: Counter, now: Seconds) {
        self.start.set(position);
        let mut level = Some(self);
        while let Some(current) = level {
            current.samples.borrow_mut().record(now, position);
            level = current.parent.as_deref();
        }
    }

    pub fn start(&self) -> Counter {
        self.start.get()
    }

    pub fn end(&self) -> Counter {
        self.end.get()
    }

    pub fn path(&self) -> Ref<'_, PathBuf> {
        self.path.borrow()
    }

    pub fn parent(&self) -> Option<&Rc<Ancestry>> {
        self.parent.as_ref()
    }

    pub fn samples(&self) -> Ref<'_, TimeSamples> {
        self.samples.borrow()
    }

    /// Number of levels including this one, the root having depth 1
    pub fn depth(&self) -> usize {
        self.lineage().len()
    }

    /// Levels from the root down to this one
    pub fn lineage(&self) -> Vec<&Ancestry> {
        let mut levels = Vec::new();
        let mut level = Some(self);
        while let Some(current) = level {
            levels.push(current);
            level = current.parent.as_deref();
        }
        levels.reverse();
        levels
    }

    /// Level `up` steps above this one; `0` is this level
    pub fn ancestor(&self, up: usize) -> Option<&Ancestry> {
        let mut level = self;
        for _ in 0..up {
            level = level.parent.as_deref()?;
        }
        Some(level)
    }

    /// Interpolated byte position of this level at `time`
    pub fn counter_at(&self, time: Seconds) -> Result<f64> {
        self.samples.borrow().counter_at(time)
    }
}

impl fmt::Debug for Ancestry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ancestry")
            .field("start", &self.start.get())
            .field("end", &self.end.get())
            .field("path", &*self.path.borrow())
            .field("samples", &self.samples.borrow().len())
            .field("depth", &self.depth())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SampleConfig {
        SampleConfig::default()
    }

    #[test]
    fn test_lineage_and_depth() {
        let root = Ancestry::root(Counter::new(3, 30), PathBuf::new(), config(), 0.0);
        let dirs = Ancestry::child(&root, Counter::ZERO, Counter::new(2, 20), "a".into(), 0.0);
        let files = Ancestry::child(&dirs, Counter::ZERO, Counter::new(1, 5), "a/f".into(), 0.0);

        assert_eq!(root.depth(), 1);
        assert_eq!(files.depth(), 3);
        let paths: Vec<PathBuf> = files.lineage().iter().map(|l| l.path().clone()).collect();
        assert_eq!(paths, vec![PathBuf::new(), PathBuf::from("a"), PathBuf::from("a/f")]);
        assert_eq!(*files.ancestor(1).unwrap().path(), PathBuf::from("a"));
        assert!(files.ancestor(3).is_none());
    }

    #[test]
    fn test_advance_records_on_every_level() {
        let root = Ancestry::root(Counter::new(2, 100), PathBuf::new(), config(), 0.0);
        let level = Ancestry::child(&root, Counter::ZERO, Counter::new(1, 60), "a".into(), 0.0);

        level.advance(Counter::data(30), 2.0);
        level.set_window(Counter::new(1, 60), Counter::new(2, 100), "b".into(), 4.0);

        assert_eq!(level.start(), Counter::new(1, 60));
        assert_eq!(level.end(), Counter::new(2, 100));
        assert_eq!(*level.path(), PathBuf::from("b"));
        assert_eq!(level.samples().len(), 3);
        assert_eq!(root.samples().len(), 3);
        assert_eq!(root.counter_at(3.0).unwrap(), 45.0);
        // the root window itself never moves
        assert_eq!(root.start(), Counter::ZERO);
    }

    #[test]
    fn test_sibling_levels_share_parent_history() {
        let root = Ancestry::root(Counter::new(2, 10), PathBuf::new(), config(), 0.0);
        let first = Ancestry::child(&root, Counter::ZERO, Counter::new(1, 4), "x".into(), 0.0);
        first.advance(Counter::data(4), 1.0);
        drop(first);
        let second = Ancestry::child(&root, Counter::new(1, 4), Counter::new(2, 10), "y".into(), 1.0);
        second.advance(Counter::new(1, 10), 2.0);

        assert_eq!(root.samples().len(), 3);
        assert_eq!(second.samples().first().counter, Counter::new(1, 4));
        assert_eq!(Rc::strong_count(&root), 2);
    }
}

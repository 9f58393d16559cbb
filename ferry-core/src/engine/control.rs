use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::{ProgressFrame, Reporter};
use crate::progress::{Ancestry, Plotter, ProgressRenderer, now, plot_points};
use crate::stream::{InteractiveController, Key, KeySource, Keystroke};

/// How long a status message stays visible
const MESSAGE_TTL: Duration = Duration::from_secs(5);

/// First step of the artificial delay
const MIN_DELAY: Duration = Duration::from_micros(15_625);

const DELAY_FACTOR: f64 = 1.25;

/// Interactive command bound to a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    Pause,
    Plot,
    IncreaseDelay,
    DecreaseDelay,
    CursorUp,
    CursorDown,
    Unbound,
}

impl Command {
    pub fn from_key(key: Key) -> Self {
        match key {
            Key::Char('q') | Key::Char('\u{3}') => Command::Quit,
            Key::Char(' ') => Command::Pause,
            Key::Char('p') => Command::Plot,
            Key::Char('d') => Command::IncreaseDelay,
            Key::Char('D') => Command::DecreaseDelay,
            Key::Up => Command::CursorUp,
            Key::Down => Command::CursorDown,
            _ => Command::Unbound,
        }
    }
}

/// Whether the run goes on after a keystroke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Next delay after `d` (`increase`) or `D`
pub(crate) fn step_delay(current: Option<Duration>, increase: bool) -> Option<Duration> {
    match (current, increase) {
        (None, true) => Some(MIN_DELAY),
        (Some(delay), true) => Some(delay.mul_f64(DELAY_FACTOR)),
        (Some(delay), false) if delay > MIN_DELAY => Some(delay.div_f64(DELAY_FACTOR)),
        (_, false) => None,
    }
}

fn delay_message(delay: Duration, direction: &str) -> String {
    if delay >= Duration::from_secs(1) {
        format!("delay {} to {:.2}s", direction, delay.as_secs_f64())
    } else {
        format!("delay {} to {}ms", direction, delay.as_millis())
    }
}

/// State shared by the interactive consumers: throttled reporting, status
/// messages, the level cursor and the key bindings.
pub struct Control<'r> {
    reporter: &'r mut dyn Reporter,
    plotter: &'r mut dyn Plotter,
    renderer: ProgressRenderer,
    report_interval: Duration,
    last_report: Option<Instant>,
    message: String,
    message_set: Option<Instant>,
    cursor: usize,
    current: Option<(PathBuf, Rc<Ancestry>)>,
}

impl<'r> Control<'r> {
    pub fn new(
        reporter: &'r mut dyn Reporter,
        plotter: &'r mut dyn Plotter,
        report_interval: Duration,
    ) -> Self {
        Self {
            reporter,
            plotter,
            renderer: ProgressRenderer::new(),
            report_interval,
            last_report: None,
            message: String::new(),
            message_set: None,
            cursor: 0,
            current: None,
        }
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.message_set = Some(Instant::now());
    }

    /// Current status message, empty once it has expired
    pub fn message(&self) -> &str {
        match self.message_set {
            Some(set) if set.elapsed() < MESSAGE_TTL => &self.message,
            _ => "",
        }
    }

    #[cfg(test)]
    fn cursor(&self) -> usize {
        self.cursor
    }

    /// Remember the latest position and report it unless the previous
    /// report is too recent
    pub fn observe(&mut self, path: &Path, ancestry: &Rc<Ancestry>) {
        self.current = Some((path.to_path_buf(), Rc::clone(ancestry)));
        let due = self
            .last_report
            .is_none_or(|last| last.elapsed() >= self.report_interval);
        if due {
            self.report();
        }
    }

    fn report(&mut self) {
        let Some((path, ancestry)) = &self.current else {
            return;
        };
        self.last_report = Some(Instant::now());

        let levels = self.renderer.render(ancestry, now());
        let cursor = self.cursor.min(levels.len().saturating_sub(1));
        let message = self.message().to_owned();
        let frame = ProgressFrame {
            path,
            levels: &levels,
            message: &message,
            cursor,
        };
        if let Err(e) = self.reporter.report(&frame) {
            debug!(error = %e, "report failed");
        }
    }

    /// Carry out the command bound to `stroke`
    pub fn handle<K: KeySource>(
        &mut self,
        stroke: &Keystroke,
        controller: &mut InteractiveController<'_, K>,
    ) -> io::Result<Flow> {
        let command = Command::from_key(stroke.key());
        debug!(?stroke, ?command, "key");

        match command {
            Command::Quit => return Ok(Flow::Quit),
            Command::Pause => {
                if let Err(e) = self.reporter.paused() {
                    debug!(error = %e, "report failed");
                }
                controller.wait_key()?;
                self.set_message("continued");
            }
            Command::Plot => self.plot(),
            Command::IncreaseDelay | Command::DecreaseDelay => {
                let increase = command == Command::IncreaseDelay;
                let delay = step_delay(controller.delay(), increase);
                controller.set_delay(delay);
                let direction = if increase { "increased" } else { "decreased" };
                match delay {
                    Some(delay) => self.set_message(delay_message(delay, direction)),
                    None => self.set_message("delay disabled"),
                }
            }
            Command::CursorUp => self.cursor = self.cursor.saturating_sub(1),
            Command::CursorDown => {
                let levels = self
                    .current
                    .as_ref()
                    .map_or(0, |(_, ancestry)| ancestry.depth() - 1);
                if self.cursor + 1 < levels {
                    self.cursor += 1;
                }
            }
            Command::Unbound => self.set_message(format!("key not bound: {stroke:?}")),
        }

        self.last_report = None;
        self.report();
        Ok(Flow::Continue)
    }

    /// Plot the history of the level under the cursor
    fn plot(&mut self) {
        let Some((_, ancestry)) = &self.current else {
            return;
        };
        let lineage = ancestry.lineage();
        let index = (self.cursor + 1).min(lineage.len() - 1);
        let points = plot_points(lineage[index]);
        if let Err(e) = self.plotter.plot(&points) {
            warn!(error = %e, "plot failed");
            self.set_message(format!("plot failed: {e}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SampleConfig;
    use crate::engine::NullReporter;
    use crate::progress::NullPlotter;
    use crate::tree::Counter;

    #[test]
    fn test_key_bindings() {
        assert_eq!(Command::from_key(Key::Char('q')), Command::Quit);
        assert_eq!(Command::from_key(Key::Char('\u{3}')), Command::Quit);
        assert_eq!(Command::from_key(Key::Char(' ')), Command::Pause);
        assert_eq!(Command::from_key(Key::Char('p')), Command::Plot);
        assert_eq!(Command::from_key(Key::Char('d')), Command::IncreaseDelay);
        assert_eq!(Command::from_key(Key::Char('D')), Command::DecreaseDelay);
        assert_eq!(Command::from_key(Key::Down), Command::CursorDown);
        assert_eq!(Command::from_key(Key::Char('x')), Command::Unbound);
        assert_eq!(Command::from_key(Key::Left), Command::Unbound);
    }

    #[test]
    fn test_delay_steps() {
        let first = step_delay(None, true).unwrap();
        assert_eq!(first, Duration::from_micros(15_625));
        let second = step_delay(Some(first), true).unwrap();
        assert_eq!(second.as_micros(), 19_531);
        assert_eq!(delay_message(second, "increased"), "delay increased to 19ms");
        assert_eq!(step_delay(Some(second), false).map(|d| d.as_micros()), Some(15_625));
        assert_eq!(step_delay(Some(first), false), None);
        assert_eq!(step_delay(None, false), None);
        assert_eq!(
            delay_message(Duration::from_millis(1500), "increased"),
            "delay increased to 1.50s"
        );
    }

    #[derive(Default)]
    struct Recording {
        frames: Vec<(PathBuf, usize, String)>,
    }

    impl Reporter for Recording {
        fn report(&mut self, frame: &ProgressFrame<'_>) -> io::Result<()> {
            self.frames
                .push((frame.path.to_path_buf(), frame.levels.len(), frame.message.to_string()));
            Ok(())
        }
    }

    #[test]
    fn test_reports_are_throttled() {
        let root = Ancestry::root(Counter::new(1, 10), PathBuf::new(), SampleConfig::default(), now());
        let level = Ancestry::child(&root, Counter::ZERO, Counter::new(1, 10), "f".into(), now());

        let mut reporter = Recording::default();
        let mut plotter = NullPlotter;
        let mut control = Control::new(&mut reporter, &mut plotter, Duration::from_secs(3600));
        control.observe(Path::new("f"), &level);
        control.observe(Path::new("f"), &level);
        control.set_message("hello");
        assert_eq!(control.message(), "hello");
        drop(control);

        assert_eq!(reporter.frames, vec![(PathBuf::from("f"), 1, String::new())]);
    }

    #[test]
    fn test_frames_carry_only_live_messages() {
        let root = Ancestry::root(Counter::new(1, 10), PathBuf::new(), SampleConfig::default(), now());
        let level = Ancestry::child(&root, Counter::ZERO, Counter::new(1, 10), "f".into(), now());

        let mut reporter = Recording::default();
        let mut plotter = NullPlotter;
        let mut control = Control::new(&mut reporter, &mut plotter, Duration::ZERO);
        control.set_message("fresh");
        control.observe(Path::new("f"), &level);
        control.message_set = Instant::now().checked_sub(MESSAGE_TTL + Duration::from_secs(1));
        control.observe(Path::new("f"), &level);
        drop(control);

        let messages: Vec<&str> = reporter.frames.iter().map(|(_, _, m)| m.as_str()).collect();
        assert_eq!(messages, vec!["fresh", ""]);
    }

    #[test]
    fn test_null_sinks_accept_frames() {
        let root = Ancestry::root(Counter::ZERO, PathBuf::new(), SampleConfig::default(), now());
        let mut reporter = NullReporter;
        let mut plotter = NullPlotter;
        let mut control = Control::new(&mut reporter, &mut plotter, Duration::ZERO);
        control.observe(Path::new(""), &root);
        control.plot();
        assert_eq!(control.cursor(), 0);
    }
}

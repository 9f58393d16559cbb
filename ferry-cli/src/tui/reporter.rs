use std::fmt;
use std::io::{self, Stdout};
use std::path::PathBuf;

use ferry_core::{LevelView, ProgressFrame, Reporter};
use ratatui::{Terminal, backend::CrosstermBackend, style::Style, widgets::Widget};

use crate::ui::{AppLayout, Footer, Header, LevelsView, Theme, TotalBar};

/// Operation shown in the header
#[derive(Debug, Clone)]
pub enum Mode {
    Copy { destination: PathBuf },
    Read,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Copy { destination } => write!(f, "cp → {}", destination.display()),
            Mode::Read => f.write_str("read"),
        }
    }
}

/// Last frame, kept to redraw the screen while paused
#[derive(Debug, Default)]
struct Snapshot {
    path: PathBuf,
    levels: Vec<LevelView>,
    message: String,
    cursor: usize,
}

/// Draws progress frames on the alternate screen
pub struct TerminalReporter {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    mode: Mode,
    theme: Theme,
    last: Snapshot,
}

impl TerminalReporter {
    pub fn new(terminal: Terminal<CrosstermBackend<Stdout>>, mode: Mode) -> Self {
        Self {
            terminal,
            mode,
            theme: Theme::default(),
            last: Snapshot::default(),
        }
    }

    fn draw(&mut self, paused: bool) -> io::Result<()> {
        let theme = &self.theme;
        let mode = &self.mode;
        let last = &self.last;

        self.terminal.draw(|frame| {
            let area = frame.area();
            let layout = AppLayout::new(area);
            let buf = frame.buffer_mut();

            // Background
            buf.set_style(area, Style::default().bg(theme.bg));

            Header::new(mode, &last.path, theme).render(layout.header, buf);
            if !last.message.is_empty() {
                buf.set_string(
                    layout.message.x + 1,
                    layout.message.y,
                    &last.message,
                    Style::default().fg(theme.yellow),
                );
            }
            TotalBar::new(last.levels.first(), theme).render(layout.total_bar, buf);
            LevelsView::new(&last.levels, last.cursor, &last.path, theme)
                .render(layout.levels, buf);
            Footer::new(paused, theme).render(layout.footer, buf);
        })?;
        Ok(())
    }
}

impl Reporter for TerminalReporter {
    fn report(&mut self, frame: &ProgressFrame<'_>) -> io::Result<()> {
        self.last.path.clear();
        self.last.path.push(frame.path);
        self.last.levels.clear();
        self.last.levels.extend_from_slice(frame.levels);
        self.last.message.clear();
        self.last.message.push_str(frame.message);
        self.last.cursor = frame.cursor;
        self.draw(false)
    }

    fn paused(&mut self) -> io::Result<()> {
        self.draw(true)
    }
}

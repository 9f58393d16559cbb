use std::path::Path;

use ferry_core::{LevelView, Timing};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Borders, Padding, Widget},
};

use super::theme::Theme;

/// Rows used by one level: bar, timing and name
const LEVEL_HEIGHT: u16 = 3;

/// One block per ancestry level, outermost first
pub struct LevelsView<'a> {
    levels: &'a [LevelView],
    cursor: usize,
    current: &'a Path,
    theme: &'a Theme,
}

impl<'a> LevelsView<'a> {
    pub fn new(levels: &'a [LevelView], cursor: usize, current: &'a Path, theme: &'a Theme) -> Self {
        Self {
            levels,
            cursor,
            current,
            theme,
        }
    }

    /// First level shown when only `visible` levels fit, keeping the
    /// innermost levels and the cursor on screen
    fn first_visible(&self, visible: usize) -> usize {
        self.levels
            .len()
            .saturating_sub(visible)
            .min(self.cursor)
    }

    fn render_bar(&self, level: &LevelView, x: u16, y: u16, width: usize, buf: &mut Buffer) {
        let text = format!("{:<width$}", level.status_text());
        let columns = level.columns(width);
        let base = Style::default().fg(self.theme.fg);

        for (column, ch) in text.chars().take(width).enumerate() {
            let mut style = base;
            if let Some(columns) = columns {
                if columns.is_filled(column) {
                    style = style.fg(self.theme.bg).bg(self.theme.blue);
                }
                if columns.is_marked(column) {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }
            }
            if let Some(cell) = buf.cell_mut((x + column as u16, y)) {
                cell.set_char(ch).set_style(style);
            }
        }
    }

    fn render_timing(&self, level: &LevelView, x: u16, y: u16, buf: &mut Buffer) {
        let color = self.theme.timing_color(
            matches!(level.timing, Timing::Imminent { .. }),
            matches!(level.timing, Timing::Predicted { .. }),
        );
        let mut text = level.timing_text();
        if let Some(speed) = level.speed_text() {
            text.push_str("   ");
            text.push_str(&speed);
        }
        buf.set_string(x, y, &text, Style::default().fg(color));
    }

    fn render_name(&self, level: &LevelView, selected: bool, x: u16, y: u16, buf: &mut Buffer) {
        let mut name = level.name();
        if name.is_empty() {
            name = self
                .current
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
        }

        let (marker, style) = if selected {
            (
                "▶ ",
                Style::default()
                    .fg(self.theme.selection_fg)
                    .bg(self.theme.selection_bg)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            ("  ", Style::default().fg(self.theme.fg_dim))
        };
        buf.set_string(x, y, format!("{marker}{name}"), style);
    }
}

impl Widget for LevelsView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border))
            .padding(Padding::horizontal(1));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height < LEVEL_HEIGHT || inner.width < 20 {
            return;
        }

        let visible = (inner.height / LEVEL_HEIGHT) as usize;
        let first = self.first_visible(visible);
        let width = inner.width as usize;

        for (row, (index, level)) in self
            .levels
            .iter()
            .enumerate()
            .skip(first)
            .take(visible)
            .enumerate()
        {
            let y = inner.y + row as u16 * LEVEL_HEIGHT;
            self.render_bar(level, inner.x, y, width, buf);
            self.render_timing(level, inner.x, y + 1, buf);
            self.render_name(level, index == self.cursor, inner.x, y + 2, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn level(name: &str, position: u64) -> LevelView {
        LevelView {
            label: PathBuf::from(name),
            start: 0,
            position,
            end: 50,
            size: 100,
            percent: Some(position as f64),
            speed: None,
            timing: Timing::Unknown {
                started: 0.0,
                elapsed: 0.0,
            },
        }
    }

    #[test]
    fn test_first_visible_keeps_cursor() {
        let theme = Theme::default();
        let levels = vec![level("/a", 10), level("/a/b", 20), level("/a/b/c", 30)];
        let current = PathBuf::from("/a/b/c/f");

        assert_eq!(LevelsView::new(&levels, 2, &current, &theme).first_visible(3), 0);
        assert_eq!(LevelsView::new(&levels, 2, &current, &theme).first_visible(1), 2);
        assert_eq!(LevelsView::new(&levels, 0, &current, &theme).first_visible(1), 0);
    }

    #[test]
    fn test_render_marks_cursor_level() {
        let theme = Theme::default();
        let levels = vec![level("/a", 10), level("", 20)];
        let current = PathBuf::from("/a/file.txt");
        let area = Rect::new(0, 0, 40, 8);
        let mut buf = Buffer::empty(area);

        LevelsView::new(&levels, 1, &current, &theme).render(area, &mut buf);

        let row = |y: u16| -> String {
            (0..area.width)
                .map(|x| buf[(x, y)].symbol().to_string())
                .collect()
        };
        assert!(row(1).contains(" 10.0%"));
        assert!(row(3).contains("  a"));
        assert!(row(6).contains("▶ file.txt"));
    }
}

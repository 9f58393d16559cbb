use std::path::Path;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::Widget,
};

use crate::tui::Mode;

use super::theme::Theme;

/// Header widget showing title, operation and the entry being transferred
pub struct Header<'a> {
    mode: &'a Mode,
    path: &'a Path,
    theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(mode: &'a Mode, path: &'a Path, theme: &'a Theme) -> Self {
        Self { mode, path, theme }
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 10 || area.height < 1 {
            return;
        }

        // Title
        let title = "FERRY";
        let title_style = Style::default()
            .fg(self.theme.blue)
            .add_modifier(Modifier::BOLD);
        buf.set_string(area.x + 1, area.y, title, title_style);

        // Separator
        buf.set_string(
            area.x + 7,
            area.y,
            "─",
            Style::default().fg(self.theme.border),
        );

        let operation = self.mode.to_string();
        buf.set_string(
            area.x + 9,
            area.y,
            &operation,
            Style::default().fg(self.theme.yellow),
        );

        let path_x = area.x + 10 + operation.chars().count() as u16;
        let max_path_len = area.width.saturating_sub(path_x - area.x + 1) as usize;
        buf.set_string(
            path_x,
            area.y,
            truncate_left(&self.path.to_string_lossy(), max_path_len),
            Style::default().fg(self.theme.fg),
        );
    }
}

/// Keep the tail of `text` within `max` characters, prefixed with `...`
pub fn truncate_left(text: &str, max: usize) -> String {
    let len = text.chars().count();
    if len <= max {
        return text.to_string();
    }
    if max <= 3 {
        return ".".repeat(max);
    }
    let tail: String = text.chars().skip(len - (max - 3)).collect();
    format!("...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_left() {
        assert_eq!(truncate_left("/a/b", 10), "/a/b");
        assert_eq!(truncate_left("/home/user/file", 8), ".../file");
        assert_eq!(truncate_left("/home", 2), "..");
    }
}

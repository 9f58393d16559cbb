use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::Widget,
};

use super::theme::Theme;

const HINTS: [(&str, &str); 5] = [
    ("q", "Quit"),
    ("Space", "Pause"),
    ("↑↓", "Level"),
    ("p", "Plot"),
    ("d/D", "Delay"),
];

/// Footer widget showing keyboard hints and the paused state
pub struct Footer<'a> {
    paused: bool,
    theme: &'a Theme,
}

impl<'a> Footer<'a> {
    pub fn new(paused: bool, theme: &'a Theme) -> Self {
        Self { paused, theme }
    }
}

impl Widget for Footer<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 20 || area.height < 1 {
            return;
        }

        if self.paused {
            buf.set_string(
                area.x + 1,
                area.y,
                "Paused. Press any key to continue ...",
                Style::default()
                    .fg(self.theme.yellow)
                    .add_modifier(Modifier::BOLD),
            );
            return;
        }

        let key_style = Style::default()
            .fg(self.theme.fg)
            .add_modifier(Modifier::BOLD);
        let desc_style = Style::default().fg(self.theme.fg_dim);
        let sep_style = Style::default().fg(self.theme.border);

        let mut x = area.x + 1;
        for (i, (key, desc)) in HINTS.iter().enumerate() {
            // Key
            buf.set_string(x, area.y, *key, key_style);
            x += key.chars().count() as u16 + 1;

            // Description
            buf.set_string(x, area.y, *desc, desc_style);
            x += desc.len() as u16;

            // Separator
            if i < HINTS.len() - 1 {
                buf.set_string(x, area.y, "  │  ", sep_style);
                x += 5;
            }

            if x >= area.x + area.width - 5 {
                break;
            }
        }
    }
}

use ratatui::{buffer::Buffer, layout::Rect, style::Style, widgets::Widget};

use ferry_core::{LevelView, format_kmg};

use super::theme::Theme;

/// Unicode partial block characters for smooth progress bars
const BLOCKS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];

/// Render a progress bar using partial block characters
pub fn render_bar(percentage: f64, width: usize) -> String {
    if width == 0 {
        return String::new();
    }

    let percentage = percentage.clamp(0.0, 100.0);
    let filled_width = (percentage / 100.0) * width as f64;
    let full_blocks = filled_width.floor() as usize;
    let partial = ((filled_width - full_blocks as f64) * 8.0).round() as usize;

    let mut bar = String::with_capacity(width * 3); // Unicode chars can be multi-byte

    // Full blocks
    for _ in 0..full_blocks.min(width) {
        bar.push(BLOCKS[8]);
    }

    // Partial block
    if full_blocks < width && partial > 0 {
        bar.push(BLOCKS[partial.min(8)]);
    }

    // Pad to width
    let current_len = bar.chars().count();
    for _ in current_len..width {
        bar.push(' ');
    }

    bar
}

/// Overall progress through the whole tree, from the outermost level
pub struct TotalBar<'a> {
    level: Option<&'a LevelView>,
    theme: &'a Theme,
}

impl<'a> TotalBar<'a> {
    pub fn new(level: Option<&'a LevelView>, theme: &'a Theme) -> Self {
        Self { level, theme }
    }
}

impl Widget for TotalBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 10 {
            return;
        }
        let Some(level) = self.level else {
            return;
        };

        let label = match level.percent {
            Some(percent) => format!("{:.0}% of {}", percent, format_kmg(level.size)),
            None => "nothing to transfer".to_string(),
        };
        let bar_width = area.width.saturating_sub(label.len() as u16 + 3) as usize;
        let bar = render_bar(level.percent.unwrap_or(100.0), bar_width);

        buf.set_string(area.x + 1, area.y, &bar, Style::default().fg(self.theme.green));
        buf.set_string(
            (area.x + area.width).saturating_sub(label.len() as u16 + 1).max(area.x),
            area.y,
            &label,
            Style::default().fg(self.theme.fg_dim),
        );
    }
}

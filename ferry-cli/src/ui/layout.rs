use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Live display layout
pub struct AppLayout {
    pub header: Rect,
    pub message: Rect,
    pub total_bar: Rect,
    pub levels: Rect,
    pub footer: Rect,
}

impl AppLayout {
    pub fn new(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Length(1), // Status message
                Constraint::Length(1), // Overall bar
                Constraint::Min(3),    // Ancestry levels
                Constraint::Length(1), // Footer
            ])
            .split(area);

        Self {
            header: chunks[0],
            message: chunks[1],
            total_bar: chunks[2],
            levels: chunks[3],
            footer: chunks[4],
        }
    }
}

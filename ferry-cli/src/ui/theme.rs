use ratatui::style::Color;

/// Catppuccin Mocha-inspired dark theme with 24-bit RGB colors
pub struct Theme {
    // Base colors
    pub bg: Color,
    pub fg: Color,
    pub fg_dim: Color,
    pub fg_muted: Color,

    // Accent colors
    pub blue: Color,
    pub green: Color,
    pub yellow: Color,
    pub red: Color,

    // UI elements
    pub border: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            // Catppuccin Mocha base
            bg: Color::Rgb(30, 30, 46),           // Base
            fg: Color::Rgb(205, 214, 244),        // Text
            fg_dim: Color::Rgb(166, 173, 200),    // Subtext0
            fg_muted: Color::Rgb(127, 132, 156),  // Overlay0

            // Accent colors
            blue: Color::Rgb(137, 180, 250),   // Blue
            green: Color::Rgb(166, 227, 161),  // Green
            yellow: Color::Rgb(249, 226, 175), // Yellow
            red: Color::Rgb(243, 139, 168),    // Red

            // UI
            border: Color::Rgb(88, 91, 112),         // Surface2
            selection_bg: Color::Rgb(137, 180, 250), // Blue
            selection_fg: Color::Rgb(30, 30, 46),    // Base
        }
    }
}

impl Theme {
    /// Color of a timing line: red once the prediction is overdue, dim
    /// while there is none
    pub fn timing_color(&self, imminent: bool, predicted: bool) -> Color {
        if imminent {
            self.red
        } else if predicted {
            self.fg
        } else {
            self.fg_muted
        }
    }
}

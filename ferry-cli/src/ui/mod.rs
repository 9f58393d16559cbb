pub mod bar_chart;
mod footer;
mod header;
mod layout;
mod levels;
mod theme;

pub use bar_chart::TotalBar;
pub use footer::Footer;
pub use header::{Header, truncate_left};
pub use layout::AppLayout;
pub use levels::LevelsView;
pub use theme::Theme;

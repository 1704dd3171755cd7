pub mod list_pane;
pub mod spinner;

pub use list_pane::ListPane;
pub use spinner::ArcIndicator;

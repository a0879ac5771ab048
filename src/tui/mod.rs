//! TUI module: Terminal User Interface using Ratatui.
//!
//! Two screens:
//! - Dashboard with the current prediction and tabbed cohort views
//! - Patient form for entering clinical attributes

mod app;
mod styles;
mod ui;

pub use app::{App, Screen};
pub use styles::MedicalTheme;

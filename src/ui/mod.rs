//! Terminal playground built on ratatui.
//!
//! - [`app`]: state and the keyboard event loop
//! - [`editor`]: the text buffer behind the editing pane
//! - [`panes`]: stateless render functions for each pane
//! - [`theme`]: colors

pub mod app;
pub mod editor;
pub mod panes;
pub mod theme;

pub use app::App;

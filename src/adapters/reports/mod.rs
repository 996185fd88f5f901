//! Report artifact renderers.

pub mod text_renderer;

pub use text_renderer::{render_text, TextReportRenderer};

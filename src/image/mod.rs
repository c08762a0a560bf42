//! Local image handling
//!
//! Synthesizes the placeholder images used when generation fails and scales
//! generated images down for display.

pub mod display;
pub mod placeholder;

pub use display::{display_dimensions, fit_for_display};
pub use placeholder::{read_overlay_lines, PlaceholderRenderer};

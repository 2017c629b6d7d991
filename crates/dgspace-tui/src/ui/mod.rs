//! Terminal UI module using ratatui.
//!
//! - `render`: Frame layout, navbar and overlays
//! - `views`: Page bodies (loading, login, dashboard, placeholders)
//! - `input`: Keyboard event handling
//! - `styles`: Color schemes and text styling

pub mod input;
pub mod render;
pub mod styles;
pub mod views;

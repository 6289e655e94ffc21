//! Output formatting and terminal display.

pub mod display;

pub use display::*;

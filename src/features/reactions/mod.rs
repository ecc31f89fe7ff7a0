//! # Reactions Feature
//!
//! Adds a celebration reaction to birthday and anniversary wishes.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0
//! - **Toggleable**: false

pub mod celebration;

pub use celebration::{is_celebration, react_if_celebration};

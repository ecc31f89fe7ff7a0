//! # Rate Limiting Feature
//!
//! Prevents command spam with per-user request limits.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false

pub mod limiter;

pub use limiter::RateLimiter;

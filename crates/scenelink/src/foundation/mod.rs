//! Foundation utilities shared across the crate
//!
//! Math types, logging setup, and other low-level support code that the
//! scene and render layers build on.

pub mod logging;
pub mod math;

//! Provide Device Control.
//!
pub mod camera;
pub mod power;

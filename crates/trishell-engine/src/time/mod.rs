//! Time subsystem.
//!
//! Frame-rate accounting over platform ticks. Nothing here reads a clock, so
//! every computation can be driven by synthetic tick sequences.

mod fps;

pub use fps::{FPS_INTERVAL_MS, FpsCounter, write_title};

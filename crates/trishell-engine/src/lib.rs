//! Trishell engine crate.
//!
//! A window, a rendering context, one static triangle and a frame-rate
//! readout in the title bar. The [`core::Application`] is written against the
//! [`platform`] traits; [`window::WinitBackend`] implements them with winit
//! and wgpu.

pub mod core;
pub mod device;
pub mod platform;
pub mod render;
pub mod time;
pub mod window;

pub mod coords;
pub mod logging;
pub mod paint;

#[cfg(test)]
mod testing;

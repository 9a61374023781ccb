//! GPU device + surface management.
//!
//! This module is responsible for:
//! - turning [`ContextHints`] into a wgpu instance/adapter/device/queue
//! - creating and configuring the window surface
//! - the registry of GPU objects addressed by [`GpuId`](crate::platform::GpuId)

mod gpu;
mod init;
pub(crate) mod objects;
mod surface;

pub use gpu::{Gpu, GpuFrame};
pub use init::{ContextHints, ContextProfile};
pub use surface::SurfaceErrorAction;

pub(crate) use init::present_mode_for_interval;

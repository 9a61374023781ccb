//! Pixel-space geometry shared by the platform seam and the GPU backend.

mod viewport;

pub use viewport::Viewport;

//! Static scene content and scoped draw helpers.
//!
//! Geometry is authored directly in normalized device coordinates; the vertex
//! shader passes positions through unchanged.

mod binding;
pub mod triangle;

pub use binding::BoundVertexArray;

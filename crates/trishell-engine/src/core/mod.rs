//! Application core.
//!
//! Owns the window, the rendering context and the three GPU objects, and runs
//! the poll → clear → draw → present loop. Talks to the outside world only
//! through [`Backend`](crate::platform::Backend).

mod app;
mod config;

pub use app::Application;
pub use config::AppConfig;

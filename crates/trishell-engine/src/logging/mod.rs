//! Logging.
//!
//! The process-wide diagnostic sink. Fatal startup errors and unhandled
//! failures at the process boundary are reported here.

mod init;

pub use init::{LoggingConfig, init_logging};

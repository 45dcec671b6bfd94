//! Observability module for logging.

pub mod logging;

pub use logging::{init_logging, LogConfig, LogLevel};

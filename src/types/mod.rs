//! Type definitions for the Mailgun API.

pub mod common;
pub mod suppressions;

pub use suppressions::*;

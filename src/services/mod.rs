//! Service implementations for the Mailgun API.

pub mod suppressions;

pub use suppressions::{DefaultSuppressionsService, SuppressionsService};

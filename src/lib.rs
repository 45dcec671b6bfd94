//! Mailgun Client Library
//!
//! An async Rust client for the Mailgun v3 HTTP API, focused on the
//! suppression lists: bounces, complaints, unsubscribes and whitelists.
//!
//! # Features
//!
//! - **Suppressions**: list, get, create and destroy for all four kinds
//! - **Pagination**: typed cursors parsed from the `paging` links
//! - **Resilience**: idempotent requests retried on transient failures
//! - **Observability**: structured logging with `tracing`
//! - **Testing**: a mock transport behind the `mocks` feature
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use integrations_mailgun::{MailgunClient, SuppressionCreationData, SuppressionsService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MailgunClient::builder()
//!         .key("your-api-key")
//!         .build()?;
//!
//!     let suppressions = client.suppressions();
//!
//!     suppressions
//!         .create(
//!             "example.com",
//!             "bounces",
//!             SuppressionCreationData::new("bob@example.com").code(550).into(),
//!         )
//!         .await?;
//!
//!     let page = suppressions.list("example.com", "bounces", None).await?;
//!     for record in &page.items {
//!         println!("{}", record.address_or_value());
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod observability;
pub mod pagination;
pub mod request;
pub mod resilience;
pub mod services;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use client::{MailgunClient, MailgunClientBuilder};
pub use config::MailgunConfig;
pub use errors::{MailgunError, MailgunResult};
pub use pagination::{ListPage, PaginationLinks, ParsedPage};
pub use request::{ApiResponse, RequestGateway, RequestOptions};
pub use services::{DefaultSuppressionsService, SuppressionsService};

// Type re-exports
pub use types::suppressions::{
    Bounce, Complaint, CreationPayload, Suppression, SuppressionCreation,
    SuppressionCreationData, SuppressionCreationResult, SuppressionDestroyResult,
    SuppressionList, SuppressionListQuery, SuppressionType, TagValue, Unsubscribe, WhiteList,
};

/// Mock implementations for testing.
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

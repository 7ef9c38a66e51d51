//! # strava-rename
//!
//! Refreshes a Strava access token, looks up the athlete's activities and
//! renames one of them.
//!
//! ## Configuration
//!
//! Credentials come from the environment, usually through a `.env` file:
//!
//! ```text
//! STRAVA_CLIENT_ID=12345
//! STRAVA_CLIENT_SECRET=...
//! STRAVA_REFRESH_TOKEN=...
//! STRAVA_TEST_ACTIVITY_ID=987654321   # optional
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use strava_rename::{Client, Config, ListParameters};
//!
//! let config = Config::from_env()?;
//! let client = Client::from_config(&config).await?;
//!
//! if let Some(latest) = client.activities().latest().await? {
//!     client.activities().rename(latest.id, "Evening Ride").await?;
//! }
//! ```
//!
//! Errors carry `miette` diagnostics. Install `tracing_error::ErrorLayer`
//! in your subscriber to get span traces alongside them.

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

#[macro_use]
extern crate tracing;

pub mod client;
pub mod config;
pub mod endpoints;
pub mod entities;
pub mod error;
pub mod oauth;
pub mod script;

pub use client::{ActivitiesApi, Client, RateLimitInfo};
pub use config::Config;
pub use endpoints::StravaEndpoint;
pub use entities::*;
pub use error::{Error, Result};
pub use oauth::Credentials;
pub use script::Script;

// Re-export SpanTrace for users who want to access it
pub use tracing_error::SpanTrace;

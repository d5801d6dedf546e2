//! `cloudcraft-http` is an async HTTP client for the Cloudcraft developer API.
//!
//! Every call goes through one retrying executor:
//! - request bodies are buffered and replayed identically on each attempt
//! - transient failures (transport errors, 202, 408, 429, 502, 503, 504) are
//!   retried with exponential backoff and ±10% jitter
//! - a [`tokio_util::sync::CancellationToken`] preempts sends and backoff waits
//!
//! Resources are reached through [`CloudcraftClient::aws`],
//! [`CloudcraftClient::azure`], [`CloudcraftClient::blueprints`] and
//! [`CloudcraftClient::users`].

mod aws;
mod azure;
mod blueprint;
mod client;
pub mod config;
mod decode;
pub mod endpoint;
mod error;
mod executor;
mod limiter;
pub mod options;
pub mod params;
mod response;
pub mod retry;
mod transport;
mod user;
mod wire;

pub use aws::{AwsAccount, AwsService, IamParams, IamPolicy, IamStatement};
pub use azure::{AzureAccount, AzureService};
pub use blueprint::{Blueprint, BlueprintData, BlueprintService, LiveAccount, LiveOptions, Theme};
pub use client::CloudcraftClient;
pub use config::Config;
pub use error::{CloudcraftError, ConfigError};
pub use executor::PreparedRequest;
pub use options::ClientOptions;
pub use params::{BudgetExportParams, ImageExportParams, SnapshotParams};
pub use response::Response;
pub use retry::RetryPolicy;
pub use user::{User, UserService};

/// Re-exported so callers do not need a direct `tokio-util` dependency.
pub use tokio_util::sync::CancellationToken;

/// `User-Agent` sent with every request.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Error trait object handed to retry predicates.
pub type DynError = dyn std::error::Error + Send + Sync + 'static;

pub type Result<T> = std::result::Result<T, CloudcraftError>;

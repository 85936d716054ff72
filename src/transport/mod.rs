//! # Transport
//!
//! Delivers complete controller snapshots to the device. The core only needs
//! one thing from a transport: given a snapshot, try once and report whether
//! it arrived, with a diagnostic when it did not.
//!
//! ```text
//! transport/
//! ├── config.rs        - device endpoint
//! └── http_handler.rs  - JSON over HTTP POST
//! ```
//!
//! There is no retry, queueing or acknowledgement tracking. A failed send is
//! logged by the caller and the session moves on.

pub mod config;
pub mod http_handler;

use crate::controller::ControllerSnapshot;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::time::Duration;
use thiserror::Error;

pub use config::DeviceEndpoint;
pub use http_handler::HttpTransport;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to create HTTP client: {0}")]
    ClientError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The device answered with a non-success status
    #[error("Device returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to serialize snapshot: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Receipt of a successful transmission
#[derive(Debug, Clone)]
pub struct Delivery {
    pub status: u16,
    pub sent_at: DateTime<Local>,
    pub round_trip: Duration,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one snapshot, exactly once
    async fn send(&self, snapshot: &ControllerSnapshot) -> Result<Delivery, TransportError>;

    /// Human-readable description of where snapshots go
    fn describe(&self) -> String;
}

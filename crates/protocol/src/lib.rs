//! Types that cross the native backend boundary.
//!
//! Everything in this crate is plain serde data: the request handed to the
//! backend's `transfer_item` call, the result it returns, and the progress
//! notifications it streams while a transfer is in flight.

pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use messages::{
    BackendCompression, BackendEncryption, BackendSettings, TransferRequest, TransferResponse,
};
pub use types::{KeyBundle, SourceLocator, UploadProgress};

/// Errors produced when decoding backend payloads.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

//! Native backend trait.
//!
//! `TransferBackend` is implemented by the host application on top of
//! whatever actually compresses, encrypts and stores bytes. Using a trait
//! keeps the queue decoupled from that layer and testable with mocks.

use std::future::Future;
use std::pin::Pin;

use mediastash_compression::{Algorithm, available_algorithms};
use mediastash_protocol::{TransferRequest, TransferResponse};

use crate::error::BackendError;

/// Abstract native backend.
pub trait TransferBackend: Send + Sync {
    /// Runs the compress/encrypt/store chain for one item.
    ///
    /// Progress for the item is reported separately, through the progress
    /// channel, keyed by `request.item_id`.
    fn transfer_item(
        &self,
        request: TransferRequest,
    ) -> Pin<Box<dyn Future<Output = Result<TransferResponse, BackendError>> + Send + '_>>;

    /// Lists the compression algorithm names the backend supports.
    fn list_compression_algorithms(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, BackendError>> + Send + '_>>;
}

/// Asks the backend for its algorithms, falling back to the built-in list.
pub async fn list_algorithms(backend: &dyn TransferBackend) -> Vec<Algorithm> {
    available_algorithms(backend.list_compression_algorithms().await)
}

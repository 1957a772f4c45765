//! Upload queue and processor.
//!
//! [`UploadQueue`] owns the list of transfer items and drives them one at a
//! time through a [`TransferBackend`]. Each item carries the processing
//! settings resolved for it at enqueue time; the backend receives them in
//! its own field layout (see [`translate`]) and streams progress back over
//! a channel attached with [`UploadQueue::attach_progress`].

pub mod backend;
pub mod error;
pub mod progress;
pub mod queue;
pub mod translate;
pub mod types;

// Re-export primary types for convenience.
pub use backend::{TransferBackend, list_algorithms};
pub use error::{BackendError, UploadError, strip_error_prefixes};
pub use progress::{ProgressSubscription, overall_progress};
pub use queue::{DEFAULT_EVENT_BUFFER, UploadQueue};
pub use translate::{TransferJob, build_request, generated_name, sanitize_filename, to_backend_settings};
pub use types::{QueueCounts, QueueEvent, RemoteObject, UploadItem, UploadStatus};

//! Queue data types.

use mediastash_protocol::SourceLocator;
use mediastash_settings::ProcessingSettings;
use serde::Serialize;

/// Lifecycle of an upload item.
///
/// `Pending -> Active -> Success | Failed`, and `Failed -> Pending` only
/// through a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Active,
    Success,
    Failed,
}

impl std::fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UploadStatus::Pending => "pending",
            UploadStatus::Active => "active",
            UploadStatus::Success => "success",
            UploadStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// An object stored remotely, as listed in the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteObject {
    pub name: String,
    pub url: String,
    pub content_id: String,
}

/// One file in the queue.
///
/// Items are never persisted. The secret lives only in memory and is
/// neither serialized nor shown by `Debug`.
#[derive(Clone, Serialize)]
pub struct UploadItem {
    pub id: String,
    pub source: SourceLocator,
    pub name: String,
    pub folder: Option<String>,
    pub status: UploadStatus,
    /// 0-100.
    pub progress: u8,
    pub error: Option<String>,
    pub result: Option<RemoteObject>,
    /// Captured at enqueue time.
    pub settings: ProcessingSettings,
    #[serde(skip)]
    pub(crate) secret: Option<String>,
}

impl UploadItem {
    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }
}

impl std::fmt::Debug for UploadItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadItem")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("folder", &self.folder)
            .field("status", &self.status)
            .field("progress", &self.progress)
            .field("error", &self.error)
            .field("result", &self.result)
            .field("settings", &self.settings)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Per-status totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueCounts {
    pub pending: usize,
    pub active: usize,
    pub success: usize,
    pub failed: usize,
}

impl QueueCounts {
    pub fn total(&self) -> usize {
        self.pending + self.active + self.success + self.failed
    }
}

/// Change notification emitted by the queue.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent {
    /// An item was enqueued.
    ItemAdded { id: String, name: String },
    /// An item changed status. `error` is set for failures.
    StatusChanged {
        id: String,
        status: UploadStatus,
        error: Option<String>,
    },
    /// The active item's progress moved forward.
    Progress { id: String, percent: u8 },
    /// A transfer finished and produced a remote object.
    Completed { id: String, object: RemoteObject },
    /// No pending items remain and the worker stopped.
    Idle,
}

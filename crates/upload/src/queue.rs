//! The upload queue and its single worker.
//!
//! At most one worker task runs per queue, and only the worker moves an
//! item to `Active`, so at most one item is ever active. The worker pulls
//! the earliest pending item, sends it to the backend, records the outcome
//! and repeats until nothing is pending.

use std::sync::{Arc, Mutex, RwLock};

use mediastash_compression::Algorithm;
use mediastash_protocol::{KeyBundle, SourceLocator, TransferResponse, UploadProgress};
use mediastash_settings::{ProcessingSettings, SettingsManager};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::backend::{TransferBackend, list_algorithms};
use crate::error::UploadError;
use crate::progress::{ProgressSubscription, overall_progress};
use crate::translate::{TransferJob, build_request};
use crate::types::{QueueCounts, QueueEvent, RemoteObject, UploadItem, UploadStatus};

/// Default capacity of the queue event channel.
pub const DEFAULT_EVENT_BUFFER: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerState {
    Idle,
    Running,
}

struct QueueState {
    items: Vec<UploadItem>,
    /// Most recent first.
    listing: Vec<RemoteObject>,
    worker: WorkerState,
}

pub(crate) struct QueueInner {
    state: Mutex<QueueState>,
    backend: Arc<dyn TransferBackend>,
    settings: Arc<SettingsManager>,
    destination: String,
    key_bundle: RwLock<Option<KeyBundle>>,
    events_tx: mpsc::Sender<QueueEvent>,
    events_rx: Mutex<Option<mpsc::Receiver<QueueEvent>>>,
    uploading: watch::Sender<bool>,
}

/// Cloneable handle to an upload queue.
///
/// Operations that may start the worker spawn a Tokio task and must be
/// called from within a Tokio runtime.
#[derive(Clone)]
pub struct UploadQueue {
    inner: Arc<QueueInner>,
}

impl UploadQueue {
    /// Creates a queue that uploads to `destination` through `backend`.
    pub fn new(
        backend: Arc<dyn TransferBackend>,
        settings: Arc<SettingsManager>,
        destination: impl Into<String>,
    ) -> Self {
        Self::with_event_buffer(backend, settings, destination, DEFAULT_EVENT_BUFFER)
    }

    pub fn with_event_buffer(
        backend: Arc<dyn TransferBackend>,
        settings: Arc<SettingsManager>,
        destination: impl Into<String>,
        event_buffer: usize,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(event_buffer.max(1));
        let (uploading, _) = watch::channel(false);
        Self {
            inner: Arc::new(QueueInner {
                state: Mutex::new(QueueState {
                    items: Vec::new(),
                    listing: Vec::new(),
                    worker: WorkerState::Idle,
                }),
                backend,
                settings,
                destination: destination.into(),
                key_bundle: RwLock::new(None),
                events_tx,
                events_rx: Mutex::new(Some(events_rx)),
                uploading,
            }),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&self) -> Option<mpsc::Receiver<QueueEvent>> {
        self.inner.events_rx.lock().unwrap().take()
    }

    /// Sets or clears the ambient key bundle used for keypair encryption.
    pub fn set_key_bundle(&self, bundle: Option<KeyBundle>) {
        *self.inner.key_bundle.write().unwrap() = bundle;
    }

    pub fn has_key_bundle(&self) -> bool {
        self.inner
            .key_bundle
            .read()
            .unwrap()
            .as_ref()
            .is_some_and(|b| !b.is_empty())
    }

    /// Appends one pending item per source and starts the worker if idle.
    ///
    /// Without `explicit_settings`, each item gets the effective settings
    /// for its own path within `folder`. The settings are captured now and
    /// never re-resolved. Returns the new item ids in order.
    pub fn enqueue(
        &self,
        sources: Vec<SourceLocator>,
        folder: Option<&str>,
        explicit_settings: Option<ProcessingSettings>,
        secret: Option<String>,
    ) -> Vec<String> {
        let mut ids = Vec::with_capacity(sources.len());
        let mut added = Vec::with_capacity(sources.len());
        {
            let mut state = self.inner.state.lock().unwrap();
            for source in sources {
                let settings = match &explicit_settings {
                    Some(s) => s.clone(),
                    None => self
                        .inner
                        .settings
                        .resolve_for_file(&source.settings_key(), folder),
                };
                let item = UploadItem {
                    id: uuid::Uuid::new_v4().to_string(),
                    name: source.display_name(),
                    source,
                    folder: folder.map(str::to_string),
                    status: UploadStatus::Pending,
                    progress: 0,
                    error: None,
                    result: None,
                    settings,
                    secret: secret.clone(),
                };
                debug!(item = %item.id, name = %item.name, "item enqueued");
                ids.push(item.id.clone());
                added.push(QueueEvent::ItemAdded {
                    id: item.id.clone(),
                    name: item.name.clone(),
                });
                state.items.push(item);
            }
        }
        for event in added {
            self.inner.emit(event);
        }
        self.inner.kick();
        ids
    }

    /// Moves every failed item back to pending and restarts the worker.
    /// Returns how many items were reset.
    pub fn retry_failed(&self) -> usize {
        let mut reset = Vec::new();
        {
            let mut state = self.inner.state.lock().unwrap();
            for item in state
                .items
                .iter_mut()
                .filter(|i| i.status == UploadStatus::Failed)
            {
                item.status = UploadStatus::Pending;
                item.progress = 0;
                item.error = None;
                reset.push(item.id.clone());
            }
        }
        let count = reset.len();
        if count > 0 {
            info!(count, "retrying failed uploads");
        }
        for id in reset {
            self.inner.emit(QueueEvent::StatusChanged {
                id,
                status: UploadStatus::Pending,
                error: None,
            });
        }
        self.inner.kick();
        count
    }

    /// Removes an item. The active item cannot be removed.
    pub fn remove(&self, id: &str) -> Result<UploadItem, UploadError> {
        let mut state = self.inner.state.lock().unwrap();
        let pos = state
            .items
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| UploadError::ItemNotFound(id.into()))?;
        if state.items[pos].status == UploadStatus::Active {
            return Err(UploadError::ItemActive(id.into()));
        }
        Ok(state.items.remove(pos))
    }

    /// Removes all successful items. Returns how many were removed.
    pub fn clear_completed(&self) -> usize {
        let mut state = self.inner.state.lock().unwrap();
        let before = state.items.len();
        state.items.retain(|i| i.status != UploadStatus::Success);
        before - state.items.len()
    }

    /// Removes every item except the active one, which cannot be cancelled.
    pub fn clear_all(&self) -> usize {
        let mut state = self.inner.state.lock().unwrap();
        let before = state.items.len();
        state.items.retain(|i| i.status == UploadStatus::Active);
        before - state.items.len()
    }

    /// Applies one progress notification to the active item. Unknown or
    /// inactive ids are ignored; progress is clamped to 100 and never moves
    /// backwards. Returns whether the item changed.
    pub fn ingest_progress(&self, progress: &UploadProgress) -> bool {
        self.inner.ingest_progress(progress)
    }

    /// Consumes a backend progress channel for as long as the returned
    /// subscription lives.
    pub fn attach_progress(&self, rx: mpsc::Receiver<UploadProgress>) -> ProgressSubscription {
        ProgressSubscription::spawn(Arc::downgrade(&self.inner), rx)
    }

    /// Snapshot of all items in queue order.
    pub fn items(&self) -> Vec<UploadItem> {
        self.inner.state.lock().unwrap().items.clone()
    }

    pub fn item(&self, id: &str) -> Option<UploadItem> {
        self.inner
            .state
            .lock()
            .unwrap()
            .items
            .iter()
            .find(|i| i.id == id)
            .cloned()
    }

    /// Rounded mean of every item's progress; 0 when empty.
    pub fn overall_progress(&self) -> u8 {
        overall_progress(&self.inner.state.lock().unwrap().items)
    }

    pub fn counts(&self) -> QueueCounts {
        let state = self.inner.state.lock().unwrap();
        let mut counts = QueueCounts::default();
        for item in &state.items {
            match item.status {
                UploadStatus::Pending => counts.pending += 1,
                UploadStatus::Active => counts.active += 1,
                UploadStatus::Success => counts.success += 1,
                UploadStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }

    /// True while the worker is running.
    pub fn is_uploading(&self) -> bool {
        *self.inner.uploading.borrow()
    }

    /// Resolves once the worker has drained the queue.
    pub async fn wait_idle(&self) {
        let mut rx = self.inner.uploading.subscribe();
        let _ = rx.wait_for(|busy| !*busy).await;
    }

    /// Remote objects, most recent first.
    pub fn listing(&self) -> Vec<RemoteObject> {
        self.inner.state.lock().unwrap().listing.clone()
    }

    /// Replaces the listing cache, e.g. after a fresh remote listing.
    pub fn set_listing(&self, objects: Vec<RemoteObject>) {
        self.inner.state.lock().unwrap().listing = objects;
    }

    /// Algorithms the backend supports, or the built-in list.
    pub async fn available_algorithms(&self) -> Vec<Algorithm> {
        list_algorithms(self.inner.backend.as_ref()).await
    }

    pub fn destination(&self) -> &str {
        &self.inner.destination
    }
}

impl QueueInner {
    fn emit(&self, event: QueueEvent) {
        if let Err(e) = self.events_tx.try_send(event) {
            match e {
                mpsc::error::TrySendError::Full(ev) => {
                    debug!(event = ?ev, "event channel full, dropping event");
                }
                mpsc::error::TrySendError::Closed(_) => {}
            }
        }
    }

    /// Starts the worker unless it is already running or nothing is pending.
    fn kick(self: &Arc<Self>) {
        {
            let mut state = self.state.lock().unwrap();
            if state.worker == WorkerState::Running
                || !state.items.iter().any(|i| i.status == UploadStatus::Pending)
            {
                return;
            }
            state.worker = WorkerState::Running;
            self.uploading.send_replace(true);
        }

        info!("upload worker started");
        let inner = Arc::clone(self);
        tokio::spawn(async move { inner.run().await });
    }

    async fn run(self: Arc<Self>) {
        while let Some(job) = self.next_job() {
            let outcome = self.process(&job).await;
            self.finish(&job, outcome);
        }
        info!("upload worker idle");
        self.emit(QueueEvent::Idle);
    }

    /// Activates the earliest pending item, or marks the worker idle.
    fn next_job(&self) -> Option<(TransferJob, i64)> {
        let job = {
            let mut state = self.state.lock().unwrap();
            let Some(item) = state
                .items
                .iter_mut()
                .find(|i| i.status == UploadStatus::Pending)
            else {
                state.worker = WorkerState::Idle;
                self.uploading.send_replace(false);
                return None;
            };
            item.status = UploadStatus::Active;
            item.progress = 0;
            item.error = None;
            TransferJob {
                item_id: item.id.clone(),
                source: item.source.clone(),
                name: item.name.clone(),
                settings: item.settings.clone(),
                secret: item.secret.clone(),
            }
        };

        info!(item = %job.item_id, name = %job.name, "upload started");
        self.emit(QueueEvent::StatusChanged {
            id: job.item_id.clone(),
            status: UploadStatus::Active,
            error: None,
        });
        Some((job, chrono::Utc::now().timestamp_millis()))
    }

    async fn process(
        &self,
        (job, now_millis): &(TransferJob, i64),
    ) -> Result<(String, TransferResponse), UploadError> {
        let request = {
            let bundle = self.key_bundle.read().unwrap();
            build_request(job, &self.destination, bundle.as_ref(), *now_millis)?
        };
        debug!(item = %job.item_id, request = ?request, "sending transfer request");
        let generated_name = request.generated_name.clone();
        let response = self.backend.transfer_item(request).await?;
        Ok((generated_name, response))
    }

    fn finish(
        &self,
        (job, _): &(TransferJob, i64),
        outcome: Result<(String, TransferResponse), UploadError>,
    ) {
        let id = &job.item_id;
        let event = {
            let mut state = self.state.lock().unwrap();
            let state = &mut *state;
            let Some(item) = state.items.iter_mut().find(|i| &i.id == id) else {
                warn!(item = %id, "active item vanished before completion");
                return;
            };
            match outcome {
                Ok((name, response)) => {
                    let object = RemoteObject {
                        name,
                        url: response.url,
                        content_id: response.content_id,
                    };
                    item.status = UploadStatus::Success;
                    item.progress = 100;
                    item.result = Some(object.clone());
                    state.listing.insert(0, object.clone());
                    info!(item = %id, url = %object.url, "upload succeeded");
                    QueueEvent::Completed {
                        id: id.clone(),
                        object,
                    }
                }
                Err(e) => {
                    let message = e.user_message();
                    item.status = UploadStatus::Failed;
                    item.progress = 0;
                    item.error = Some(message.clone());
                    warn!(item = %id, error = %message, "upload failed");
                    QueueEvent::StatusChanged {
                        id: id.clone(),
                        status: UploadStatus::Failed,
                        error: Some(message),
                    }
                }
            }
        };

        if matches!(event, QueueEvent::Completed { .. }) {
            self.emit(QueueEvent::StatusChanged {
                id: id.clone(),
                status: UploadStatus::Success,
                error: None,
            });
        }
        self.emit(event);
    }

    /// Updates the active item's progress.
    ///
    /// Notifications for unknown or non-active items are ignored. Progress
    /// is clamped to 100 and never moves backwards. Returns whether the
    /// item changed.
    pub(crate) fn ingest_progress(&self, progress: &UploadProgress) -> bool {
        let percent = progress.clamped_percent();
        {
            let mut state = self.state.lock().unwrap();
            let Some(item) = state
                .items
                .iter_mut()
                .find(|i| i.id == progress.id && i.status == UploadStatus::Active)
            else {
                debug!(item = %progress.id, "ignoring progress for inactive item");
                return false;
            };
            if percent <= item.progress {
                return false;
            }
            item.progress = percent;
        }
        debug!(item = %progress.id, percent, "progress");
        self.emit(QueueEvent::Progress {
            id: progress.id.clone(),
            percent,
        });
        true
    }
}

//! MediaStash service object.
//!
//! [`MediaStash`] is built once at startup and handed to whatever needs
//! the queue, the settings or the pipelines. Nothing in the workspace
//! keeps global state.

pub mod config;

use std::sync::{Arc, Mutex};

use mediastash_pipeline::{PipelineComposer, PipelineEstimate};
use mediastash_protocol::UploadProgress;
use mediastash_settings::{JsonFileStore, KeyValueStore, MemoryStore, SettingsManager};
use mediastash_upload::{ProgressSubscription, TransferBackend, UploadQueue};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

pub use config::ServiceConfig;

/// Installs the global `tracing` subscriber.
///
/// Reads `RUST_LOG`, defaulting to `info,mediastash=debug`. Later calls
/// are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,mediastash=debug")),
        )
        .try_init();
}

/// Wired-up upload subsystem.
pub struct MediaStash {
    config: ServiceConfig,
    settings: Arc<SettingsManager>,
    queue: UploadQueue,
    pipelines: Mutex<PipelineComposer>,
    progress_tx: mpsc::Sender<UploadProgress>,
    _progress: ProgressSubscription,
}

impl MediaStash {
    /// Builds the service. Must be called from within a Tokio runtime.
    ///
    /// A corrupt settings file opens empty and is rewritten on the next
    /// change. A file that cannot be read at all is logged and replaced by
    /// an in-memory store, so startup never fails on saved preferences.
    pub fn start(config: ServiceConfig, backend: Arc<dyn TransferBackend>) -> Self {
        let store: Arc<dyn KeyValueStore> =
            match JsonFileStore::open(config.settings_store_path.clone()) {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    tracing::warn!(
                        path = %config.settings_store_path.display(),
                        error = %e,
                        "failed to open settings store, using memory store"
                    );
                    Arc::new(MemoryStore::new())
                }
            };
        let settings = Arc::new(SettingsManager::load(store));

        let queue = UploadQueue::with_event_buffer(
            backend,
            settings.clone(),
            config.destination.clone(),
            config.event_buffer,
        );
        let (progress_tx, progress_rx) = mpsc::channel(config.progress_buffer.max(1));
        let progress = queue.attach_progress(progress_rx);

        tracing::info!(destination = %config.destination, "mediastash started");

        Self {
            config,
            settings,
            queue,
            pipelines: Mutex::new(PipelineComposer::new()),
            progress_tx,
            _progress: progress,
        }
    }

    /// Loads [`ServiceConfig`] from its default location and starts.
    pub fn start_default(backend: Arc<dyn TransferBackend>) -> anyhow::Result<Self> {
        let config = ServiceConfig::load()?;
        Ok(Self::start(config, backend))
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn settings(&self) -> &Arc<SettingsManager> {
        &self.settings
    }

    pub fn queue(&self) -> &UploadQueue {
        &self.queue
    }

    /// Sender the backend uses to report transfer progress.
    pub fn progress_sender(&self) -> mpsc::Sender<UploadProgress> {
        self.progress_tx.clone()
    }

    /// Runs `f` with exclusive access to the pipeline composer.
    pub fn with_pipelines<R>(&self, f: impl FnOnce(&mut PipelineComposer) -> R) -> R {
        f(&mut self.pipelines.lock().unwrap())
    }

    /// Estimate for the active pipeline, if any.
    pub fn estimate_active(&self, input_size: u64) -> Option<PipelineEstimate> {
        self.pipelines.lock().unwrap().estimate_active(input_size)
    }

    /// Flushes settings and stops progress ingestion.
    pub fn shutdown(self) {
        self.settings.save_all();
        tracing::info!("mediastash stopped");
    }
}

//! Task-level entry points for collaborators
//!
//! `CaptureService` starts capture tasks in the background, hands back an
//! event stream per task, and cancels tasks by id.

use crate::config::CaptureSettings;
use crate::crawler::{http_collaborators, run_capture, AssetFetcher, EventSink, PageMaterializer};
use crate::state::{CaptureMode, CaptureTask, TaskId};
use crate::{CaptureError, CaptureOutcome};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub use crate::crawler::CaptureEvent;

type Registry = Arc<Mutex<HashMap<TaskId, CancellationToken>>>;

fn lock(registry: &Registry) -> MutexGuard<'_, HashMap<TaskId, CancellationToken>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// How pages and assets are fetched
#[derive(Clone)]
enum Collaborators {
    /// A fresh HTTP client per task, built from its settings
    Http,
    Custom {
        materializer: Arc<dyn PageMaterializer>,
        fetcher: Arc<dyn AssetFetcher>,
    },
}

/// Handle to a running capture task
pub struct CaptureHandle {
    /// Id accepted by `CaptureService::cancel`
    pub id: TaskId,

    /// Progress and terminal events of the task
    pub events: UnboundedReceiver<CaptureEvent>,

    /// The background task itself
    pub task: JoinHandle<Result<CaptureOutcome, CaptureError>>,
}

impl CaptureHandle {
    /// Waits for the task to finish
    pub async fn wait(self) -> Result<CaptureOutcome, CaptureError> {
        self.task
            .await
            .map_err(|e| CaptureError::TaskAborted(e.to_string()))?
    }
}

/// Starts and cancels capture tasks
#[derive(Clone)]
pub struct CaptureService {
    collaborators: Collaborators,
    registry: Registry,
}

impl CaptureService {
    /// Creates a service that captures over HTTP
    pub fn new() -> Self {
        Self {
            collaborators: Collaborators::Http,
            registry: Arc::default(),
        }
    }

    /// Creates a service that uses the given page and asset collaborators
    ///
    /// Hosts that render pages in a browser plug their driver in here.
    pub fn with_collaborators(
        materializer: Arc<dyn PageMaterializer>,
        fetcher: Arc<dyn AssetFetcher>,
    ) -> Self {
        Self {
            collaborators: Collaborators::Custom {
                materializer,
                fetcher,
            },
            registry: Arc::default(),
        }
    }

    /// Validates and starts a capture task in the background
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Returns
    ///
    /// * `Ok(CaptureHandle)` - Task accepted; its outcome arrives as events
    /// * `Err(CaptureError::InvalidSeedUrl)` - Seed rejected before any work
    /// * `Err(CaptureError::Config)` - Settings failed validation
    pub fn start_capture(
        &self,
        seed_url: &str,
        mode: CaptureMode,
        settings: CaptureSettings,
    ) -> Result<CaptureHandle, CaptureError> {
        let mut task = CaptureTask::new(seed_url, mode, settings)?;

        let (materializer, fetcher): (Arc<dyn PageMaterializer>, Arc<dyn AssetFetcher>) =
            match &self.collaborators {
                Collaborators::Http => {
                    let (materializer, fetcher) = http_collaborators(task.settings())?;
                    (
                        Arc::new(materializer) as Arc<dyn PageMaterializer>,
                        fetcher as Arc<dyn AssetFetcher>,
                    )
                }
                Collaborators::Custom {
                    materializer,
                    fetcher,
                } => (Arc::clone(materializer), Arc::clone(fetcher)),
            };

        let id = task.id();
        lock(&self.registry).insert(id, task.cancellation_token());

        let (tx, rx) = mpsc::unbounded_channel();
        let registry = Arc::clone(&self.registry);
        let join = tokio::spawn(async move {
            let events = EventSink::new(tx);
            let result = run_capture(&mut task, materializer.as_ref(), fetcher, &events).await;
            lock(&registry).remove(&id);
            result
        });

        tracing::info!("Accepted capture {} of {}", id, seed_url.trim());
        Ok(CaptureHandle {
            id,
            events: rx,
            task: join,
        })
    }

    /// Requests cancellation of a running task
    ///
    /// Returns true if a live task with this id was found.
    pub fn cancel(&self, id: TaskId) -> bool {
        match lock(&self.registry).get(&id) {
            Some(token) => {
                token.cancel();
                tracing::info!("Cancellation requested for {}", id);
                true
            }
            None => false,
        }
    }

    /// Ids of tasks that have not finished yet
    pub fn active_tasks(&self) -> Vec<TaskId> {
        lock(&self.registry).keys().copied().collect()
    }
}

impl Default for CaptureService {
    fn default() -> Self {
        Self::new()
    }
}

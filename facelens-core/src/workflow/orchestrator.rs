//! Async driver for the workflow state machine
//!
//! The [`Orchestrator`] owns two independent state slices, both published
//! through `tokio::sync::watch` so the presentation layer can subscribe
//! read-only:
//!
//! - the [`WorkflowState`] (selection → upload → analysis → result)
//! - the [`AnalyticsView`] cache
//!
//! Network calls never fail past [`Orchestrator::start_analysis`]; they are
//! turned into events and folded into the workflow state.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::client::{AnalysisClient, AnalyticsClient, HttpClients, UploadClient};
use crate::error::Error;
use crate::types::{AnalyticsView, ImageReference};

use super::state::{Effect, Event, Phase, Rejection, WorkflowState};

/// How a call to [`Orchestrator::start_analysis`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Nothing was started; state unchanged
    Rejected(Rejection),
    /// The submission ran to completion; the phase it left behind
    Finished(Phase),
}

/// Workflow orchestrator handle.
///
/// Cheap to clone; clones drive the same state. Each screen or session
/// should own its own orchestrator.
#[derive(Clone)]
pub struct Orchestrator {
    shared: Arc<Shared>,
}

struct Shared {
    upload: Arc<dyn UploadClient>,
    analysis: Arc<dyn AnalysisClient>,
    analytics: Arc<dyn AnalyticsClient>,
    workflow: watch::Sender<WorkflowState>,
    analytics_view: watch::Sender<AnalyticsView>,
    /// Outstanding analytics fetches, drives `AnalyticsView::loading`
    pending_fetches: AtomicUsize,
    /// Fire-and-forget refreshes spawned after successful analyses
    refreshes: Mutex<Vec<JoinHandle<()>>>,
}

impl Orchestrator {
    pub fn new(
        upload: Arc<dyn UploadClient>,
        analysis: Arc<dyn AnalysisClient>,
        analytics: Arc<dyn AnalyticsClient>,
    ) -> Self {
        let (workflow, _) = watch::channel(WorkflowState::new());
        let (analytics_view, _) = watch::channel(AnalyticsView::default());

        Self {
            shared: Arc::new(Shared {
                upload,
                analysis,
                analytics,
                workflow,
                analytics_view,
                pending_fetches: AtomicUsize::new(0),
                refreshes: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Build an orchestrator over the HTTP service clients
    pub fn with_http(clients: HttpClients) -> Self {
        Self::new(
            Arc::new(clients.upload),
            Arc::new(clients.analysis),
            Arc::new(clients.analytics),
        )
    }

    /// Initial load: fetch the analytics summary once
    pub async fn mount(&self) {
        tracing::debug!("Mounting workflow orchestrator");
        self.refresh_analytics().await;
    }

    /// Snapshot of the workflow state
    pub fn state(&self) -> WorkflowState {
        self.shared.workflow.borrow().clone()
    }

    /// Snapshot of the analytics cache
    pub fn analytics(&self) -> AnalyticsView {
        self.shared.analytics_view.borrow().clone()
    }

    /// Receive every workflow transition
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.shared.workflow.subscribe()
    }

    /// Receive every analytics cache change
    pub fn subscribe_analytics(&self) -> watch::Receiver<AnalyticsView> {
        self.shared.analytics_view.subscribe()
    }

    /// Select a new image. Refused while a submission is in flight.
    pub fn select_image(&self, image: ImageReference) -> std::result::Result<(), Rejection> {
        tracing::debug!(image = %image, "Selecting image");
        match self.shared.dispatch(Event::SelectImage(image)) {
            Effect::Rejected(rejection) => {
                tracing::debug!(%rejection, "Image selection refused");
                Err(rejection)
            }
            _ => Ok(()),
        }
    }

    /// Drop the current image and any result. Does not cancel an in-flight submission.
    pub fn clear_image(&self) {
        self.shared.dispatch(Event::ClearImage);
    }

    /// Upload (unless an asset is already held) and analyze the current image.
    ///
    /// A no-op while another submission is outstanding. The submission runs
    /// on its own task, so dropping the returned future does not abandon it.
    pub async fn start_analysis(&self) -> StartOutcome {
        let effect = self.shared.dispatch(Event::StartAnalysis);
        if let Effect::Rejected(rejection) = effect {
            tracing::debug!(%rejection, "Analysis not started");
            return StartOutcome::Rejected(rejection);
        }

        let shared = Arc::clone(&self.shared);
        let submission = tokio::spawn(async move { drive(shared, effect).await });

        if let Err(e) = submission.await {
            tracing::error!(error = %e, "Submission task failed");
        }

        StartOutcome::Finished(self.shared.workflow.borrow().phase())
    }

    /// Fetch the analytics summary and wait for it.
    ///
    /// Failures are logged and leave the cached summary in place.
    pub async fn refresh_analytics(&self) {
        refresh_analytics(
            Arc::clone(&self.shared.analytics),
            Arc::downgrade(&self.shared),
        )
        .await;
    }

    /// Wait for every fire-and-forget analytics refresh spawned so far
    pub async fn settle(&self) {
        loop {
            let handles = std::mem::take(&mut *self.shared.lock_refreshes());
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    tracing::warn!(error = %e, "Analytics refresh task failed");
                }
            }
        }
    }
}

impl Shared {
    /// Apply one event atomically and notify subscribers if the state changed
    fn dispatch(&self, event: Event) -> Effect {
        let mut effect = Effect::None;
        self.workflow.send_if_modified(|state| {
            let transition = state.apply(event);
            effect = transition.effect;
            if transition.state == *state {
                false
            } else {
                tracing::debug!(
                    from = %state.phase(),
                    to = %transition.state.phase(),
                    "Workflow transition"
                );
                *state = transition.state;
                true
            }
        });
        effect
    }

    fn lock_refreshes(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.refreshes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn spawn_refresh(self: &Arc<Self>) {
        let handle = tokio::spawn(refresh_analytics(
            Arc::clone(&self.analytics),
            Arc::downgrade(self),
        ));

        let mut refreshes = self.lock_refreshes();
        refreshes.retain(|h| !h.is_finished());
        refreshes.push(handle);
    }
}

/// Run effects until the submission settles
async fn drive(shared: Arc<Shared>, mut effect: Effect) {
    loop {
        effect = match effect {
            Effect::None => return,
            Effect::Rejected(rejection) => {
                tracing::debug!(%rejection, "Completion ignored");
                return;
            }
            Effect::Abandoned { submission } => {
                tracing::debug!(submission, "Image cleared during submission; outcome dropped");
                return;
            }
            Effect::RefreshAnalytics => {
                shared.spawn_refresh();
                Effect::None
            }
            Effect::Upload { submission, image } => {
                tracing::info!(submission, image = %image, "Uploading image");
                let request = image.upload_request();
                match shared.upload.upload(&request).await {
                    Ok(asset) => {
                        tracing::debug!(submission, url = %asset.url, "Upload complete");
                        shared.dispatch(Event::UploadSucceeded { submission, asset })
                    }
                    Err(e) => {
                        tracing::warn!(submission, error = %e, "Upload failed");
                        let message = match e {
                            Error::Upload(message) => message,
                            other => other.to_string(),
                        };
                        shared.dispatch(Event::UploadFailed {
                            submission,
                            message,
                        })
                    }
                }
            }
            Effect::Analyze { submission, asset } => {
                tracing::info!(submission, url = %asset.url, "Analyzing photo");
                match shared.analysis.analyze(&asset.url).await {
                    Ok(result) => {
                        tracing::info!(submission, "Analysis complete");
                        shared.dispatch(Event::AnalysisSucceeded { submission, result })
                    }
                    Err(e) => {
                        tracing::warn!(submission, error = %e, "Analysis failed");
                        let (status, body) = match e {
                            Error::Analysis { status, body } => (status, body),
                            other => (None, other.to_string()),
                        };
                        shared.dispatch(Event::AnalysisFailed {
                            submission,
                            status,
                            body,
                        })
                    }
                }
            }
        };
    }
}

/// Fetch the summary and fold it into the analytics slice.
///
/// Holds only a weak reference so a refresh that outlives its orchestrator is dropped quietly.
async fn refresh_analytics(client: Arc<dyn AnalyticsClient>, shared: Weak<Shared>) {
    match shared.upgrade() {
        Some(shared) => {
            shared.pending_fetches.fetch_add(1, Ordering::SeqCst);
            shared.analytics_view.send_modify(|view| view.loading = true);
        }
        None => return,
    }

    let outcome = client.fetch_summary().await;

    let Some(shared) = shared.upgrade() else {
        tracing::debug!("Orchestrator dropped before analytics refresh completed");
        return;
    };

    let still_loading = shared.pending_fetches.fetch_sub(1, Ordering::SeqCst) > 1;
    match outcome {
        Ok(summary) => {
            tracing::debug!(
                total = summary.total_analyses,
                today = summary.today_analyses,
                "Analytics refreshed"
            );
            shared.analytics_view.send_modify(|view| {
                view.summary = summary;
                view.loading = still_loading;
                view.stale = false;
                view.refreshed_at = Some(Utc::now());
            });
        }
        Err(e) => {
            tracing::warn!(error = %e, "Analytics fetch failed; keeping cached summary");
            shared.analytics_view.send_modify(|view| {
                view.loading = still_loading;
                view.stale = true;
            });
        }
    }
}

//! Pure workflow state machine
//!
//! Every transition is `(WorkflowState, Event) -> (WorkflowState, Effect)`
//! with no I/O. The orchestrator executes the returned [`Effect`] and feeds
//! the outcome back in as the next [`Event`].
//!
//! ```text
//!  Idle ──select──▶ Ready ──start──▶ Uploading ──ok──▶ Analyzing ──ok──▶ Success
//!                                       │                 │
//!                                       └──err──▶ Failed ◀┘err
//!
//!  Failed | Success ──start──▶ Uploading, or Analyzing when the asset is kept
//!  any ──select──▶ Ready (refused while in flight)
//!  any ──clear───▶ Idle
//! ```
//!
//! Completion events carry the submission id they belong to. A completion
//! whose submission was abandoned by `ClearImage` is absorbed without
//! touching the visible state.

use thiserror::Error;

use crate::types::{AnalysisResult, ImageReference, UploadedAsset};

/// Identifies one upload/analysis run
pub type SubmissionId = u64;

/// Visible workflow phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    /// No image selected
    #[default]
    Idle,
    /// Image selected, no result yet
    Ready,
    Uploading,
    Analyzing,
    /// Result present
    Success,
    /// Error present, image retained
    Failed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Ready => "ready",
            Phase::Uploading => "uploading",
            Phase::Analyzing => "analyzing",
            Phase::Success => "success",
            Phase::Failed => "failed",
        }
    }

    /// Uploading or analyzing
    pub fn is_busy(&self) -> bool {
        matches!(self, Phase::Uploading | Phase::Analyzing)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a submission ended in [`Phase::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("upload failed: {0}")]
    Upload(String),

    #[error("analysis failed ({}): {body}", describe_status(.status))]
    Analysis { status: Option<u16>, body: String },
}

fn describe_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "no response".to_string(),
    }
}

/// Why an event was refused. The state is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("image selection is disabled while a submission is in flight")]
    Busy,

    #[error("analysis already in progress")]
    InFlight,

    #[error("no image selected")]
    NoImage,

    #[error("completion for a submission that is no longer in flight")]
    Stale,
}

/// Input to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    SelectImage(ImageReference),
    ClearImage,
    StartAnalysis,
    UploadSucceeded {
        submission: SubmissionId,
        asset: UploadedAsset,
    },
    UploadFailed {
        submission: SubmissionId,
        message: String,
    },
    AnalysisSucceeded {
        submission: SubmissionId,
        result: AnalysisResult,
    },
    AnalysisFailed {
        submission: SubmissionId,
        status: Option<u16>,
        body: String,
    },
}

/// Side effect the driver must perform after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Rejected(Rejection),
    Upload {
        submission: SubmissionId,
        image: ImageReference,
    },
    Analyze {
        submission: SubmissionId,
        asset: UploadedAsset,
    },
    /// Fire-and-forget analytics refresh
    RefreshAnalytics,
    /// The submission finished after its image was cleared; outcome dropped
    Abandoned { submission: SubmissionId },
}

/// Result of applying one event
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: WorkflowState,
    pub effect: Effect,
}

/// The orchestrator's single mutable workflow value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowState {
    phase: Phase,
    image: Option<ImageReference>,
    asset: Option<UploadedAsset>,
    result: Option<AnalysisResult>,
    failure: Option<FailureReason>,
    in_flight: Option<SubmissionId>,
    next_submission: SubmissionId,
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn image(&self) -> Option<&ImageReference> {
        self.image.as_ref()
    }

    /// Uploaded asset for the current image, kept across failures for retry
    pub fn asset(&self) -> Option<&UploadedAsset> {
        self.asset.as_ref()
    }

    /// Present only in [`Phase::Success`]
    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    /// Present only in [`Phase::Failed`]
    pub fn failure(&self) -> Option<&FailureReason> {
        self.failure.as_ref()
    }

    /// Submission whose network call is outstanding, including one abandoned by a clear
    pub fn in_flight(&self) -> Option<SubmissionId> {
        self.in_flight
    }

    /// Selection controls should be disabled
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Apply an event, returning the next state and the effect to run
    pub fn apply(&self, event: Event) -> Transition {
        match event {
            Event::SelectImage(image) => self.select_image(image),
            Event::ClearImage => self.clear_image(),
            Event::StartAnalysis => self.start_analysis(),
            Event::UploadSucceeded { submission, asset } => {
                self.complete(submission, Phase::Uploading, |next| {
                    next.phase = Phase::Analyzing;
                    next.asset = Some(asset.clone());
                    Effect::Analyze { submission, asset }
                })
            }
            Event::UploadFailed {
                submission,
                message,
            } => self.complete(submission, Phase::Uploading, |next| {
                next.phase = Phase::Failed;
                next.failure = Some(FailureReason::Upload(message));
                next.in_flight = None;
                Effect::None
            }),
            Event::AnalysisSucceeded { submission, result } => {
                self.complete(submission, Phase::Analyzing, |next| {
                    next.phase = Phase::Success;
                    next.result = Some(result);
                    next.in_flight = None;
                    Effect::RefreshAnalytics
                })
            }
            Event::AnalysisFailed {
                submission,
                status,
                body,
            } => self.complete(submission, Phase::Analyzing, |next| {
                next.phase = Phase::Failed;
                next.failure = Some(FailureReason::Analysis { status, body });
                next.in_flight = None;
                Effect::None
            }),
        }
    }

    fn unchanged(&self, effect: Effect) -> Transition {
        Transition {
            state: self.clone(),
            effect,
        }
    }

    fn select_image(&self, image: ImageReference) -> Transition {
        if self.in_flight.is_some() {
            return self.unchanged(Effect::Rejected(Rejection::Busy));
        }

        Transition {
            state: WorkflowState {
                phase: Phase::Ready,
                image: Some(image),
                asset: None,
                result: None,
                failure: None,
                in_flight: None,
                next_submission: self.next_submission,
            },
            effect: Effect::None,
        }
    }

    fn clear_image(&self) -> Transition {
        // An outstanding submission keeps its id so the late completion can be absorbed
        Transition {
            state: WorkflowState {
                phase: Phase::Idle,
                image: None,
                asset: None,
                result: None,
                failure: None,
                in_flight: self.in_flight,
                next_submission: self.next_submission,
            },
            effect: Effect::None,
        }
    }

    fn start_analysis(&self) -> Transition {
        if self.in_flight.is_some() {
            return self.unchanged(Effect::Rejected(Rejection::InFlight));
        }
        let image = match (&self.image, self.phase) {
            (Some(image), Phase::Ready | Phase::Failed | Phase::Success) => image.clone(),
            _ => return self.unchanged(Effect::Rejected(Rejection::NoImage)),
        };

        let submission = self.next_submission;
        let mut next = self.clone();
        next.next_submission = submission + 1;
        next.in_flight = Some(submission);
        next.result = None;
        next.failure = None;

        let effect = match &self.asset {
            Some(asset) => {
                next.phase = Phase::Analyzing;
                Effect::Analyze {
                    submission,
                    asset: asset.clone(),
                }
            }
            None => {
                next.phase = Phase::Uploading;
                Effect::Upload { submission, image }
            }
        };

        Transition {
            state: next,
            effect,
        }
    }

    /// Shared bookkeeping for completion events
    fn complete(
        &self,
        submission: SubmissionId,
        expected: Phase,
        on_current: impl FnOnce(&mut WorkflowState) -> Effect,
    ) -> Transition {
        if self.in_flight != Some(submission) {
            return self.unchanged(Effect::Rejected(Rejection::Stale));
        }

        let mut next = self.clone();
        if self.phase != expected {
            // Image was cleared while this submission was in flight
            next.in_flight = None;
            return Transition {
                state: next,
                effect: Effect::Abandoned { submission },
            };
        }

        let effect = on_current(&mut next);
        Transition {
            state: next,
            effect,
        }
    }
}

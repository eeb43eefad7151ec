//! Photo analysis workflow
//!
//! [`state`] holds the pure transition function; [`orchestrator`] drives it
//! against the service clients.

pub mod orchestrator;
pub mod state;

pub use orchestrator::{Orchestrator, StartOutcome};
pub use state::{
    Effect, Event, FailureReason, Phase, Rejection, SubmissionId, Transition, WorkflowState,
};

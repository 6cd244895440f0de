//! Error taxonomy for the debate core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::SessionPhase;

/// Which kind of completion call was being made when a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStage {
    /// A persona's turn in the debate chain.
    AgentTurn,
    /// A recurrent summarization call.
    Summary,
    /// The final synthesis call.
    Synthesis,
}

impl std::fmt::Display for CallStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AgentTurn => write!(f, "agent_turn"),
            Self::Summary => write!(f, "summary"),
            Self::Synthesis => write!(f, "synthesis"),
        }
    }
}

/// Why a session ended in the `Failed` phase.
///
/// Summary failures never appear here — they are skipped, not fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// An agent turn's completion call failed; remaining turns were not run.
    AgentCall { persona: String, cause: String },
    /// The synthesis call failed; the transcript up to that point is intact.
    Synthesis { cause: String },
}

impl FailureReason {
    /// The call stage this failure occurred in.
    pub fn stage(&self) -> CallStage {
        match self {
            Self::AgentCall { .. } => CallStage::AgentTurn,
            Self::Synthesis { .. } => CallStage::Synthesis,
        }
    }

    /// The human-readable cause.
    pub fn cause(&self) -> &str {
        match self {
            Self::AgentCall { cause, .. } | Self::Synthesis { cause } => cause,
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AgentCall { persona, cause } => {
                write!(f, "agent call failed ({}): {}", persona, cause)
            }
            Self::Synthesis { cause } => write!(f, "synthesis failed: {}", cause),
        }
    }
}

/// Error for invalid session phase transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition {from} → {to}: {reason}")]
pub struct TransitionError {
    pub from: SessionPhase,
    pub to: SessionPhase,
    pub reason: String,
}

/// Errors surfaced by the debate core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DebateError {
    /// Missing query or empty persona selection; rejected before any call.
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// Too few chain entries for a summary or synthesis input.
    #[error("insufficient history: need {needed} entries, have {actual}")]
    InsufficientHistory { needed: usize, actual: usize },

    /// A completion service call failed.
    #[error("{stage} call failed: {cause}")]
    Completion { stage: CallStage, cause: String },

    /// A session phase transition was rejected.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// A session mutation would break an append-only invariant.
    #[error("session invariant violated: {0}")]
    Invariant(String),
}

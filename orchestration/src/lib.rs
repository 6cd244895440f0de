//! Deterministic core for multi-persona debate orchestration.
//!
//! This crate owns everything about a debate run that does not touch the
//! network: the session data model and phase machine, the summary
//! scheduler, the context windowing policy, efficiency metrics, and
//! transcript assembly. The completion service and the turn loop that
//! drives it live in the `debate-agents` crate.
//!
//! # Session flow
//!
//! ```text
//! Idle → Running(turn 0..N) → Synthesizing → Completed
//!   │        │                     │
//!   │        ├─ agent call fails → Failed
//!   │        │                     ├─ synthesis fails → Failed
//!   │        └─ N == 1 ──────────→ Completed (no synthesis)
//!   └─ cancel at any point → Cancelled
//! ```
//!
//! Summary calls are best-effort: a failed summary is logged and skipped,
//! never fatal to the debate.

pub mod context;
pub mod efficiency;
pub mod error;
pub mod scheduler;
pub mod session;
pub mod transcript;

pub use context::{Fragment, PromptPair, Role};
pub use efficiency::{
    EfficiencyEstimator, EfficiencyMetrics, EfficiencyTracker, FixedEstimator, SampledEstimator,
};
pub use error::{CallStage, DebateError, FailureReason, TransitionError};
pub use session::{
    DebateConfig, DebateEntry, DebateSession, Persona, SessionPhase, SummaryEntry, SummaryLength,
};
pub use transcript::{Transcript, TranscriptItem};

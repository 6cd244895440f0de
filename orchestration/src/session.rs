//! Debate session state — data model, phase machine, and invariant-checked mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::efficiency::EfficiencyMetrics;
use crate::error::{DebateError, FailureReason, TransitionError};

/// One debate participant: a named behavioral configuration.
///
/// Defined once at process start from the runner's registry; never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Unique, human-readable label.
    pub name: String,
    /// Instruction text defining behavior, including the mandatory rule
    /// to critique the prior agent's response.
    pub system_prompt: String,
    /// Whether this persona may use a search tool.
    #[serde(default)]
    pub search_enabled: bool,
}

/// One agent's completed turn. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateEntry {
    pub persona_name: String,
    pub response_text: String,
}

/// A condensation of the debate chain prefix, recorded between turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryEntry {
    /// Index of the last chain entry covered by this summary (inclusive).
    pub after_turn_index: usize,
    pub summary_text: String,
    pub created_at: DateTime<Utc>,
}

/// Target length for generated summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryLength {
    Short,
    Medium,
    Detailed,
}

impl SummaryLength {
    /// Word-count guidance appended to the summarizer prompt.
    pub fn word_guidance(self) -> &'static str {
        match self {
            Self::Short => "100-200 words",
            Self::Medium => "200-400 words",
            Self::Detailed => "400-600 words",
        }
    }
}

impl std::fmt::Display for SummaryLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Short => write!(f, "short"),
            Self::Medium => write!(f, "medium"),
            Self::Detailed => write!(f, "detailed"),
        }
    }
}

/// Per-session debate configuration. Fixed for the session's duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateConfig {
    /// Whether recurrent summarization runs between turns.
    pub summarization_enabled: bool,
    /// Completed turns between summaries. Always >= 1.
    pub summary_frequency: u32,
    /// Target length for generated summaries.
    pub summary_length: SummaryLength,
}

impl DebateConfig {
    /// Build a config, clamping `summary_frequency` to a minimum of 1.
    pub fn new(
        summarization_enabled: bool,
        summary_frequency: u32,
        summary_length: SummaryLength,
    ) -> Self {
        Self {
            summarization_enabled,
            summary_frequency: summary_frequency.max(1),
            summary_length,
        }
    }
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            summarization_enabled: true,
            summary_frequency: 3,
            summary_length: SummaryLength::Medium,
        }
    }
}

/// Phase of a debate session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Session created but not started.
    Idle,
    /// Turns executing in persona order.
    Running,
    /// Final synthesis call in flight.
    Synthesizing,
    /// All turns (and synthesis, when due) finished.
    Completed,
    /// An agent turn or the synthesis call failed.
    Failed,
    /// Cancelled by the caller before completion.
    Cancelled,
}

impl SessionPhase {
    /// Whether this is a terminal phase.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Valid transitions from this phase.
    pub fn valid_transitions(self) -> &'static [SessionPhase] {
        match self {
            Self::Idle => &[Self::Running, Self::Cancelled],
            Self::Running => &[
                Self::Synthesizing,
                Self::Completed,
                Self::Failed,
                Self::Cancelled,
            ],
            Self::Synthesizing => &[Self::Completed, Self::Failed, Self::Cancelled],
            Self::Completed | Self::Failed | Self::Cancelled => &[],
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Synthesizing => write!(f, "synthesizing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A phase transition record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: SessionPhase,
    pub to: SessionPhase,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
}

/// The top-level aggregate for one debate run.
///
/// Owned and mutated only by the orchestrator driving the run; each user
/// query gets a fresh, independent session with no shared state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateSession {
    /// Unique session identifier.
    pub id: String,
    /// The query that started the session. Set once.
    pub user_query: String,
    /// Ordered persona selection, fixed for the session's duration.
    pub personas: Vec<Persona>,
    /// Append-only sequence of completed turns.
    pub chain: Vec<DebateEntry>,
    /// Append-only sequence of recorded summaries.
    pub summaries: Vec<SummaryEntry>,
    /// Session configuration, read-only for all components.
    pub config: DebateConfig,
    /// The final integrative response, set at most once.
    pub final_synthesis: Option<String>,
    /// Running efficiency metrics, updated after each turn.
    pub metrics: EfficiencyMetrics,
    /// Current phase.
    pub phase: SessionPhase,
    /// Why the session failed, when `phase` is `Failed`.
    pub failure: Option<FailureReason>,
    /// Transition history.
    pub transitions: Vec<PhaseTransition>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

impl DebateSession {
    /// Create a new idle session.
    pub fn new(user_query: &str, personas: Vec<Persona>, config: DebateConfig) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_query: user_query.to_string(),
            personas,
            chain: Vec::new(),
            summaries: Vec::new(),
            config,
            final_synthesis: None,
            metrics: EfficiencyMetrics::default(),
            phase: SessionPhase::Idle,
            failure: None,
            transitions: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Transition to a new phase with a reason.
    pub fn transition(&mut self, to: SessionPhase, reason: &str) -> Result<(), TransitionError> {
        if !self.phase.valid_transitions().contains(&to) {
            return Err(TransitionError {
                from: self.phase,
                to,
                reason: format!(
                    "not a valid transition (allowed: {:?})",
                    self.phase.valid_transitions()
                ),
            });
        }

        self.transitions.push(PhaseTransition {
            from: self.phase,
            to,
            timestamp: Utc::now(),
            reason: reason.to_string(),
        });
        self.phase = to;
        Ok(())
    }

    /// Start the session (Idle → Running).
    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.transition(SessionPhase::Running, "debate started")
    }

    /// Append a completed turn to the chain.
    pub fn record_entry(&mut self, entry: DebateEntry) -> Result<(), DebateError> {
        if self.phase != SessionPhase::Running {
            return Err(DebateError::Invariant(format!(
                "cannot record entry in phase {}",
                self.phase
            )));
        }
        if self.chain.len() >= self.personas.len() {
            return Err(DebateError::Invariant(
                "chain length would exceed persona count".to_string(),
            ));
        }
        self.chain.push(entry);
        Ok(())
    }

    /// Record a summary covering the chain as it stands.
    ///
    /// The summary's `after_turn_index` is the index of the last entry in
    /// the chain; it must advance strictly past any prior summary.
    pub fn record_summary(&mut self, summary_text: String) -> Result<&SummaryEntry, DebateError> {
        if self.phase != SessionPhase::Running {
            return Err(DebateError::Invariant(format!(
                "cannot record summary in phase {}",
                self.phase
            )));
        }
        let Some(after_turn_index) = self.chain.len().checked_sub(1) else {
            return Err(DebateError::Invariant(
                "cannot summarize an empty chain".to_string(),
            ));
        };
        if let Some(last) = self.summaries.last() {
            if after_turn_index <= last.after_turn_index {
                return Err(DebateError::Invariant(format!(
                    "summary index {} does not advance past {}",
                    after_turn_index, last.after_turn_index
                )));
            }
        }
        self.summaries.push(SummaryEntry {
            after_turn_index,
            summary_text,
            created_at: Utc::now(),
        });
        Ok(self.summaries.last().expect("just pushed"))
    }

    /// Record the final synthesis. Requires at least 2 chain entries and
    /// the `Synthesizing` phase; succeeds at most once.
    pub fn record_synthesis(&mut self, text: String) -> Result<(), DebateError> {
        if self.phase != SessionPhase::Synthesizing {
            return Err(DebateError::Invariant(format!(
                "cannot record synthesis in phase {}",
                self.phase
            )));
        }
        if self.final_synthesis.is_some() {
            return Err(DebateError::Invariant(
                "synthesis already recorded".to_string(),
            ));
        }
        if self.chain.len() < 2 {
            return Err(DebateError::InsufficientHistory {
                needed: 2,
                actual: self.chain.len(),
            });
        }
        self.final_synthesis = Some(text);
        Ok(())
    }

    /// Record a fatal failure and transition to `Failed`.
    pub fn fail(&mut self, reason: FailureReason) -> Result<(), TransitionError> {
        let message = reason.to_string();
        self.failure = Some(reason);
        self.transition(SessionPhase::Failed, &message)
    }

    /// Cancel the session.
    pub fn cancel(&mut self, reason: &str) -> Result<(), TransitionError> {
        self.transition(SessionPhase::Cancelled, reason)
    }

    /// Whether the session has ended.
    pub fn is_complete(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Number of turns completed so far.
    pub fn turns_completed(&self) -> usize {
        self.chain.len()
    }

    /// Compact status line.
    pub fn status_line(&self) -> String {
        format!(
            "[{}] turn {}/{} | {} summaries | session={}",
            self.phase,
            self.chain.len(),
            self.personas.len(),
            self.summaries.len(),
            self.id
        )
    }
}

//! Transcript assembly and on-disk sinks.
//!
//! The transcript interleaves chain entries and summaries in chronological
//! order, appends the synthesis when present, and renders session failures
//! as a distinguishable system-level item — errors are never dropped.
//!
//! Two output sinks:
//! - `debate-session.json`: complete session snapshot, overwritten each run
//! - `debate-runs.jsonl`: append-only log of all sessions

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::session::{DebateSession, SessionPhase};

/// One rendered transcript item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranscriptItem {
    /// The user's original query.
    Query { text: String },
    /// One persona's completed turn.
    Agent { persona: String, text: String },
    /// A recurrent summary, shown after the turn it covers.
    Summary { after_turn: usize, text: String },
    /// The final synthesis report.
    Synthesis { text: String },
    /// A fatal failure, surfaced in-line rather than dropped.
    SystemError { stage: String, cause: String },
}

/// Chronologically ordered view over one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub session_id: String,
    pub items: Vec<TranscriptItem>,
}

impl Transcript {
    /// Assemble the transcript from a session in chronological order.
    pub fn from_session(session: &DebateSession) -> Self {
        let mut items = vec![TranscriptItem::Query {
            text: session.user_query.clone(),
        }];

        let mut summaries = session.summaries.iter().peekable();
        for (index, entry) in session.chain.iter().enumerate() {
            items.push(TranscriptItem::Agent {
                persona: entry.persona_name.clone(),
                text: entry.response_text.clone(),
            });
            while summaries
                .peek()
                .is_some_and(|s| s.after_turn_index == index)
            {
                let summary = summaries.next().expect("peeked");
                items.push(TranscriptItem::Summary {
                    after_turn: summary.after_turn_index,
                    text: summary.summary_text.clone(),
                });
            }
        }

        if let Some(text) = &session.final_synthesis {
            items.push(TranscriptItem::Synthesis { text: text.clone() });
        }

        if let Some(failure) = &session.failure {
            items.push(TranscriptItem::SystemError {
                stage: failure.stage().to_string(),
                cause: failure.cause().to_string(),
            });
        }
        if session.phase == SessionPhase::Cancelled {
            items.push(TranscriptItem::SystemError {
                stage: "session".to_string(),
                cause: "cancelled before completion".to_string(),
            });
        }

        Self {
            session_id: session.id.clone(),
            items,
        }
    }

    /// Plain-text rendering for terminal output.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for item in &self.items {
            let block = match item {
                TranscriptItem::Query { text } => format!("YOU:\n{}", text),
                TranscriptItem::Agent { persona, text } => format!("AGENT {}:\n{}", persona, text),
                TranscriptItem::Summary { after_turn, text } => {
                    format!("SUMMARY (after turn {}):\n{}", after_turn + 1, text)
                }
                TranscriptItem::Synthesis { text } => {
                    format!("SYNTHESIS ENGINE (Final Report):\n{}", text)
                }
                TranscriptItem::SystemError { stage, cause } => {
                    format!("SYSTEM ERROR [{}]: {}", stage, cause)
                }
            };
            out.push_str(&block);
            out.push_str("\n\n");
        }
        out.trim_end().to_string()
    }
}

/// Write the complete session snapshot to `debate-session.json` in `dir`.
pub fn write_session_snapshot(session: &DebateSession, dir: &Path) {
    let path = dir.join("debate-session.json");
    match serde_json::to_string_pretty(session) {
        Ok(json) => match std::fs::write(&path, json) {
            Ok(()) => info!(path = %path.display(), "Wrote session snapshot"),
            Err(e) => warn!("Failed to write session snapshot: {e}"),
        },
        Err(e) => warn!("Failed to serialize session snapshot: {e}"),
    }
}

/// Append the session to `debate-runs.jsonl` in `dir`.
///
/// Each line is a complete JSON object for easy streaming analysis.
pub fn append_run_log(session: &DebateSession, dir: &Path) {
    let path = dir.join("debate-runs.jsonl");
    match serde_json::to_string(session) {
        Ok(json) => {
            use std::io::Write;
            match std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
            {
                Ok(mut file) => {
                    if let Err(e) = writeln!(file, "{json}") {
                        warn!("Failed to append run log: {e}");
                    } else {
                        info!(path = %path.display(), "Appended session to run log");
                    }
                }
                Err(e) => warn!("Failed to open run log: {e}"),
            }
        }
        Err(e) => warn!("Failed to serialize session: {e}"),
    }
}

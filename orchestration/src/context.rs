//! Context building — what each completion call gets to see.
//!
//! Per-turn agent input is bounded by a fixed 2-entry window over the
//! debate chain; summaries are surfaced in the transcript but never
//! re-injected here. Synthesis, which runs once at the end, is the only
//! call allowed to see the full chain.

use serde::{Deserialize, Serialize};

use crate::error::DebateError;
use crate::session::{DebateConfig, DebateEntry, SummaryLength};

/// Prompt version. Bump on any preamble content change.
pub const PROMPT_VERSION: &str = "1.0.0";

/// How many prior responses an agent turn sees.
pub const AGENT_WINDOW: usize = 2;

/// Summarizer role preamble.
pub const SUMMARIZER_PREAMBLE: &str = "\
You are a Debate Summarization Engine. Your task is to create a concise, \
structured summary of the debate progression so far. Focus on:
- Key arguments and counterarguments
- Evolution of the discussion
- Major points of consensus and disagreement
- Critical insights from each perspective
Maintain objectivity and preserve the core reasoning from each agent.";

/// Synthesis role preamble.
pub const SYNTHESIS_PREAMBLE: &str = "\
You are the Final Synthesis Engine. Analyze the debate and deliver a \
comprehensive, structured synthesis report.

Key considerations:
- Identify the evolution of arguments
- Highlight points of consensus and disagreement
- Note any novel insights or paradigm shifts
- Provide balanced conclusions

Deliver a final integrated report.";

/// Role tag for a message fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The user asking the original question.
    Requester,
    /// Prior generated content (another agent's response).
    Assistant,
}

/// One role-tagged message fragment handed to the completion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub role: Role,
    pub text: String,
}

impl Fragment {
    pub fn requester(text: impl Into<String>) -> Self {
        Self {
            role: Role::Requester,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// A system prompt plus user prompt pair for summarizer/synthesis calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// Build the input fragments for one agent turn.
///
/// With summarization disabled, or for the first agent (no predecessor),
/// the input is exactly the raw user query. Otherwise the query is
/// followed by the last [`AGENT_WINDOW`] responses, each labelled with
/// the persona that produced it, most recent last.
///
/// The result is never empty and its first element is always the query.
pub fn agent_input(
    user_query: &str,
    chain: &[DebateEntry],
    agent_index: usize,
    config: &DebateConfig,
) -> Vec<Fragment> {
    let mut fragments = vec![Fragment::requester(user_query)];
    if !config.summarization_enabled || agent_index == 0 {
        return fragments;
    }

    let window_start = chain.len().saturating_sub(AGENT_WINDOW);
    for entry in &chain[window_start..] {
        fragments.push(Fragment::assistant(format!(
            "PREVIOUS AGENT ({}):\n{}",
            entry.persona_name, entry.response_text
        )));
    }
    fragments
}

/// Serialize the chain as numbered `AGENT {n} ({name})` blocks.
fn serialize_chain(chain: &[DebateEntry]) -> String {
    chain
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            format!(
                "\nAGENT {} ({}):\n{}\n",
                i + 1,
                entry.persona_name,
                entry.response_text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the summarizer prompt pair over the full chain so far.
///
/// Fails with `InsufficientHistory` when fewer than 2 turns exist —
/// there is no progression to summarize yet.
pub fn summary_input(
    chain: &[DebateEntry],
    length: SummaryLength,
) -> Result<PromptPair, DebateError> {
    if chain.len() < 2 {
        return Err(DebateError::InsufficientHistory {
            needed: 2,
            actual: chain.len(),
        });
    }

    let user = format!(
        "Please provide a comprehensive summary of the debate progression in {}.\n\n\
         DEBATE HISTORY:\n{}\n\n\
         Create a structured summary that captures:\n\
         1. The main question/topic\n\
         2. Key perspectives and their evolution\n\
         3. Major arguments and counterarguments\n\
         4. Points of agreement and ongoing disagreement\n\
         5. Critical insights and novel ideas\n\n\
         Focus on the progression of thought rather than reproducing every detail.",
        length.word_guidance(),
        serialize_chain(chain)
    );

    Ok(PromptPair {
        system: SUMMARIZER_PREAMBLE.to_string(),
        user,
    })
}

/// Build the synthesis prompt pair over the original query and full chain.
pub fn synthesis_input(user_query: &str, chain: &[DebateEntry]) -> Result<PromptPair, DebateError> {
    if chain.len() < 2 {
        return Err(DebateError::InsufficientHistory {
            needed: 2,
            actual: chain.len(),
        });
    }

    let user = format!(
        "ORIGINAL QUERY: {}\n\n\
         DEBATE HISTORY:\n{}\n\n\
         Key considerations:\n\
         - Identify the evolution of arguments\n\
         - Highlight points of consensus and disagreement\n\
         - Note any novel insights or paradigm shifts\n\
         - Provide balanced conclusions\n\n\
         Deliver a final integrated report.",
        user_query,
        serialize_chain(chain)
    );

    Ok(PromptPair {
        system: SYNTHESIS_PREAMBLE.to_string(),
        user,
    })
}

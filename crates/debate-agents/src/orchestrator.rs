//! The debate turn loop: one orchestrator drives one session to a terminal
//! phase, strictly sequentially — each turn's input depends on the previous
//! turn's text, so there is nothing to parallelize inside a session.
//!
//! Failure policy (fixed, no retries here):
//! - summary call fails → log, skip, keep debating
//! - agent call fails → session is `Failed`, remaining turns are not run
//! - synthesis call fails → session is `Failed`, transcript stays intact

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use orchestration::context;
use orchestration::efficiency::EfficiencyEstimator;
use orchestration::scheduler::should_summarize;
use orchestration::{
    CallStage, DebateConfig, DebateEntry, DebateError, DebateSession, EfficiencyTracker,
    FailureReason, Fragment, Persona, SessionPhase,
};

use crate::completion::{CompletionRequest, CompletionService};
use crate::config::{CallParams, RunnerConfig};

/// Drives exactly one debate session. Sessions share no mutable state, so
/// concurrent debates each get their own orchestrator.
pub struct DebateOrchestrator {
    service: Arc<dyn CompletionService>,
    runner: RunnerConfig,
    tracker: EfficiencyTracker,
    cancel: CancellationToken,
}

impl DebateOrchestrator {
    pub fn new(service: Arc<dyn CompletionService>, runner: RunnerConfig) -> Self {
        Self {
            service,
            runner,
            tracker: EfficiencyTracker::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the metric estimation strategy (deterministic tests, real
    /// token accounting).
    pub fn with_estimator(mut self, estimator: Box<dyn EfficiencyEstimator>) -> Self {
        self.tracker = EfficiencyTracker::with_estimator(estimator);
        self
    }

    /// Use the caller's cancellation token. Cancellation is checked before
    /// each service call; the in-flight call is allowed to resolve.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run the debate to a terminal phase.
    ///
    /// An empty query or persona selection is rejected up front with
    /// `InvalidRequest` and no service call is made. Every other outcome —
    /// completed, failed mid-run, cancelled — is returned as the session
    /// itself, with partial chain, summaries, and metrics intact.
    pub async fn run(
        mut self,
        query: &str,
        personas: Vec<Persona>,
        config: DebateConfig,
    ) -> Result<DebateSession, DebateError> {
        if query.trim().is_empty() {
            return Err(DebateError::InvalidRequest {
                reason: "query must be non-empty".into(),
            });
        }
        if personas.is_empty() {
            return Err(DebateError::InvalidRequest {
                reason: "at least one persona must be selected".into(),
            });
        }

        let mut session = DebateSession::new(query, personas, config);
        session.start()?;
        info!(
            session = %session.id,
            personas = session.personas.len(),
            frequency = session.config.summary_frequency,
            "Debate started"
        );

        for turn in 0..session.personas.len() {
            if self.cancel.is_cancelled() {
                session.cancel("cancelled before turn")?;
                info!(session = %session.id, turn, "Debate cancelled");
                return Ok(session);
            }

            let mut summary_recorded = false;
            if turn >= 1 && should_summarize(turn, session.chain.len(), &session.config) {
                summary_recorded = self.try_summarize(&mut session).await;
            }

            let persona = session.personas[turn].clone();
            let fragments =
                context::agent_input(&session.user_query, &session.chain, turn, &session.config);
            info!(
                session = %session.id,
                turn,
                persona = %persona.name,
                fragments = fragments.len(),
                "Agent turn"
            );

            match self
                .call(&persona.system_prompt, fragments, self.runner.agent_call)
                .await
            {
                Ok(text) => {
                    session.record_entry(DebateEntry {
                        persona_name: persona.name.clone(),
                        response_text: text,
                    })?;
                    session.metrics = self.tracker.record_turn(summary_recorded);
                }
                Err(cause) => {
                    warn!(session = %session.id, turn, persona = %persona.name, %cause, "Agent call failed — aborting debate");
                    session.fail(FailureReason::AgentCall {
                        persona: persona.name,
                        cause: cause.to_string(),
                    })?;
                    return Ok(session);
                }
            }
        }

        if session.chain.len() < 2 {
            session.transition(SessionPhase::Completed, "single turn, synthesis skipped")?;
            info!(session = %session.id, "Debate completed without synthesis");
            return Ok(session);
        }

        session.transition(SessionPhase::Synthesizing, "all turns completed")?;
        if self.cancel.is_cancelled() {
            session.cancel("cancelled before synthesis")?;
            return Ok(session);
        }

        let pair = context::synthesis_input(&session.user_query, &session.chain)?;
        match self
            .call(
                &pair.system,
                vec![Fragment::requester(pair.user)],
                self.runner.synthesis_call,
            )
            .await
        {
            Ok(text) => {
                session.record_synthesis(text)?;
                session.transition(SessionPhase::Completed, "synthesis recorded")?;
                info!(session = %session.id, "Debate completed");
            }
            Err(cause) => {
                warn!(session = %session.id, %cause, "Synthesis call failed");
                session.fail(FailureReason::Synthesis {
                    cause: cause.to_string(),
                })?;
            }
        }

        Ok(session)
    }

    /// Best-effort summary step. Returns whether a summary was recorded;
    /// any failure is logged and the debate continues.
    async fn try_summarize(&mut self, session: &mut DebateSession) -> bool {
        let pair = match context::summary_input(&session.chain, session.config.summary_length) {
            Ok(pair) => pair,
            Err(e) => {
                warn!(session = %session.id, error = %e, "Summary skipped");
                return false;
            }
        };

        match self
            .call(
                &pair.system,
                vec![Fragment::requester(pair.user)],
                self.runner.summary_call,
            )
            .await
        {
            Ok(text) => match session.record_summary(text) {
                Ok(summary) => {
                    let after_turn = summary.after_turn_index;
                    info!(
                        session = %session.id,
                        after_turn,
                        "Summary recorded"
                    );
                    true
                }
                Err(e) => {
                    warn!(session = %session.id, error = %e, "Summary discarded");
                    false
                }
            },
            Err(cause) => {
                let e = DebateError::Completion {
                    stage: CallStage::Summary,
                    cause: cause.to_string(),
                };
                warn!(session = %session.id, error = %e, "Summary call failed — continuing");
                false
            }
        }
    }

    async fn call(
        &self,
        system_prompt: &str,
        messages: Vec<Fragment>,
        params: CallParams,
    ) -> Result<String, crate::completion::CompletionError> {
        let request = CompletionRequest {
            system_prompt: system_prompt.to_string(),
            messages,
            max_output_tokens: params.max_output_tokens,
            temperature: params.temperature,
        };
        self.service.complete(&request).await.map(|c| c.text)
    }
}

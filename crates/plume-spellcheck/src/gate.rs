//! The spell-check gate and the per-message state machine.
//!
//! ```text
//!            ┌──────────┐  findings   ┌─────────┐
//! begin ───▶ │ Checking │ ──────────▶ │ Blocked │ ──cancel──▶ Cancelled
//!            └──────────┘             └─────────┘
//!                 │ none
//!                 ▼
//!            ┌─────────┐ confirm / auto-confirm
//!            │  Clear  │ ─────────────────────────▶ Confirmed
//!            └─────────┘ ──cancel──▶ Cancelled
//! ```
//!
//! `cancel` is available from every non-terminal state. A check cancelled
//! while the remote call is in flight drops that call and never records a
//! result.

use std::sync::Arc;
use std::time::Duration;

use plume_core::{CheckId, EvaluationResult, Finding, GateDecision};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::checker::Checker;
use crate::errors::CheckError;
use crate::remote::RemoteGrammarClient;
use crate::rules::RuleMatcher;

pub const DEFAULT_AUTO_CONFIRM_DELAY: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GateState {
    Checking,
    Blocked,
    Clear,
    Confirmed,
    Cancelled,
}

impl GateState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Blocked => "blocked",
            Self::Clear => "clear",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Cancelled)
    }
}

impl std::fmt::Display for GateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct GateOptions {
    /// Delay after which a clear check confirms itself. `None` leaves it
    /// waiting for an explicit `confirm`.
    pub auto_confirm_delay: Option<Duration>,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            auto_confirm_delay: Some(DEFAULT_AUTO_CONFIRM_DELAY),
        }
    }
}

/// Runs its checkers in order and hands out one [`GateCheck`] per message.
#[derive(Clone)]
pub struct SpellCheckGate {
    checkers: Vec<Arc<dyn Checker>>,
    options: GateOptions,
}

impl SpellCheckGate {
    pub fn new(checkers: Vec<Arc<dyn Checker>>, options: GateOptions) -> Self {
        Self { checkers, options }
    }

    /// Local rules only.
    pub fn local(options: GateOptions) -> Self {
        Self::new(vec![Arc::new(RuleMatcher::new())], options)
    }

    /// Local rules followed by the remote grammar service.
    pub fn with_remote(remote: RemoteGrammarClient, options: GateOptions) -> Self {
        Self::new(
            vec![Arc::new(RuleMatcher::new()), Arc::new(remote)],
            options,
        )
    }

    pub fn options(&self) -> &GateOptions {
        &self.options
    }

    pub fn checker_names(&self) -> Vec<&str> {
        self.checkers.iter().map(|c| c.name()).collect()
    }

    /// One-shot evaluation without a state machine.
    pub async fn evaluate(&self, text: &str) -> Result<EvaluationResult, CheckError> {
        validate(text)?;
        Ok(EvaluationResult::new(run_checkers(&self.checkers, text).await))
    }

    /// Open a check for `text` in the `Checking` state.
    pub fn begin(&self, text: impl Into<String>) -> Result<GateCheck, CheckError> {
        let text = text.into();
        validate(&text)?;
        let check = GateCheck {
            id: CheckId::new(),
            text,
            state: GateState::Checking,
            result: None,
            checkers: self.checkers.clone(),
            auto_confirm_delay: self.options.auto_confirm_delay,
            cancel: CancellationToken::new(),
        };
        debug!(check_id = %check.id, "gate check opened");
        Ok(check)
    }
}

impl std::fmt::Debug for SpellCheckGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpellCheckGate")
            .field("checkers", &self.checker_names())
            .field("options", &self.options)
            .finish()
    }
}

fn validate(text: &str) -> Result<(), CheckError> {
    if text.trim().is_empty() {
        return Err(CheckError::EmptyText);
    }
    Ok(())
}

async fn run_checkers(checkers: &[Arc<dyn Checker>], text: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    for checker in checkers {
        let found = checker.check(text).await;
        debug!(checker = checker.name(), count = found.len(), "checker done");
        findings.extend(found);
    }
    findings
}

/// A candidate message held by the gate until it is confirmed or cancelled.
pub struct GateCheck {
    id: CheckId,
    text: String,
    state: GateState,
    result: Option<EvaluationResult>,
    checkers: Vec<Arc<dyn Checker>>,
    auto_confirm_delay: Option<Duration>,
    cancel: CancellationToken,
}

impl GateCheck {
    pub fn id(&self) -> &CheckId {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn result(&self) -> Option<&EvaluationResult> {
        self.result.as_ref()
    }

    pub fn findings(&self) -> &[Finding] {
        self.result
            .as_ref()
            .map(|r| r.findings.as_slice())
            .unwrap_or_default()
    }

    pub fn decision(&self) -> Option<GateDecision> {
        self.result.as_ref().map(EvaluationResult::decision)
    }

    pub fn auto_confirm_delay(&self) -> Option<Duration> {
        self.auto_confirm_delay
    }

    /// Token that cancels this check from another task, e.g. while
    /// `evaluate` is awaiting the remote service.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the checkers and move to `Blocked` or `Clear`.
    ///
    /// Returns `Cancelled` if the token fires first; the in-flight checker
    /// future is dropped and no result is kept.
    pub async fn evaluate(&mut self) -> Result<GateState, CheckError> {
        if self.state != GateState::Checking {
            return Err(self.invalid("evaluate"));
        }

        let token = self.cancel.clone();
        let checkers = self.checkers.clone();
        let findings = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            findings = run_checkers(&checkers, &self.text) => Some(findings),
        };

        let Some(findings) = findings else {
            self.transition(GateState::Cancelled);
            return Ok(self.state);
        };

        let result = EvaluationResult::new(findings);
        let next = match result.decision() {
            GateDecision::Allow => GateState::Clear,
            GateDecision::Block => GateState::Blocked,
        };
        self.result = Some(result);
        self.transition(next);
        Ok(self.state)
    }

    /// Wait out the auto-confirm delay of a clear check.
    ///
    /// Returns `Confirmed` after the delay, `Cancelled` if the token fires
    /// first, or `Clear` unchanged when no delay is configured.
    pub async fn await_auto_confirm(&mut self) -> Result<GateState, CheckError> {
        self.sync_cancelled();
        if self.state != GateState::Clear {
            return Err(self.invalid("auto-confirm"));
        }
        let Some(delay) = self.auto_confirm_delay else {
            return Ok(self.state);
        };

        let token = self.cancel.clone();
        tokio::select! {
            biased;
            _ = token.cancelled() => self.discard(),
            _ = tokio::time::sleep(delay) => self.transition(GateState::Confirmed),
        }
        Ok(self.state)
    }

    /// Confirm a clear check and release its text. Unavailable while any
    /// finding is present.
    pub fn confirm(&mut self) -> Result<&str, CheckError> {
        self.sync_cancelled();
        if self.state != GateState::Clear {
            return Err(self.invalid("confirm"));
        }
        self.transition(GateState::Confirmed);
        Ok(&self.text)
    }

    /// Abandon the check and discard any result.
    pub fn cancel(&mut self) -> Result<(), CheckError> {
        if self.state.is_terminal() {
            return Err(self.invalid("cancel"));
        }
        self.cancel.cancel();
        self.discard();
        Ok(())
    }

    fn sync_cancelled(&mut self) {
        if self.cancel.is_cancelled() && !self.state.is_terminal() {
            self.discard();
        }
    }

    fn discard(&mut self) {
        self.result = None;
        self.transition(GateState::Cancelled);
    }

    fn transition(&mut self, next: GateState) {
        debug!(check_id = %self.id, from = %self.state, to = %next, "gate transition");
        self.state = next;
    }

    fn invalid(&self, action: &'static str) -> CheckError {
        CheckError::InvalidTransition {
            state: self.state,
            action,
        }
    }
}

impl std::fmt::Debug for GateCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateCheck")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("findings", &self.findings().len())
            .finish()
    }
}

use std::sync::Arc;

use plume_core::{ChatMessage, SessionId};
use plume_spellcheck::{GateCheck, GateState, SpellCheckGate};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::errors::SessionError;
use crate::panel::SettingsPanel;
use crate::relay::Relay;

/// A conversation: every message passes the gate before reaching the relay.
pub struct ChatSession {
    id: SessionId,
    transcript: Vec<ChatMessage>,
    panel: SettingsPanel,
    gate: SpellCheckGate,
    relay: Arc<dyn Relay>,
    pending: Option<GateCheck>,
}

impl ChatSession {
    pub fn new(gate: SpellCheckGate, relay: Arc<dyn Relay>) -> Self {
        Self {
            id: SessionId::new(),
            transcript: Vec::new(),
            panel: SettingsPanel::default(),
            gate,
            relay,
            pending: None,
        }
    }

    pub fn with_panel(mut self, panel: SettingsPanel) -> Self {
        self.panel = panel;
        self
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn panel(&self) -> &SettingsPanel {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut SettingsPanel {
        &mut self.panel
    }

    pub fn pending(&self) -> Option<&GateCheck> {
        self.pending.as_ref()
    }

    /// Token cancelling the pending check from another task.
    pub fn pending_cancellation_token(&self) -> Option<CancellationToken> {
        self.pending.as_ref().map(GateCheck::cancellation_token)
    }

    /// Open a gate check for the trimmed input. Nothing is sent yet.
    pub fn submit(&mut self, input: &str) -> Result<&GateCheck, SessionError> {
        let text = input.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyInput);
        }
        if self.pending.is_some() {
            return Err(SessionError::Busy);
        }
        let check = self.gate.begin(text)?;
        debug!(session_id = %self.id, check_id = %check.id(), "message submitted to gate");
        Ok(self.pending.insert(check))
    }

    /// Evaluate the pending check. A clear result with auto-confirm is
    /// sent after the delay; a blocked one stays pending until cancelled.
    pub async fn resolve_pending(&mut self) -> Result<GateState, SessionError> {
        let check = self.pending.as_mut().ok_or(SessionError::NothingPending)?;
        let mut state = check.evaluate().await?;

        if state == GateState::Clear && check.auto_confirm_delay().is_some() {
            state = check.await_auto_confirm().await?;
        }

        match state {
            GateState::Confirmed => {
                if let Some(check) = self.pending.take() {
                    self.dispatch(check.text().to_string()).await;
                }
            }
            GateState::Cancelled => self.pending = None,
            GateState::Checking | GateState::Blocked | GateState::Clear => {}
        }
        Ok(state)
    }

    /// Send a clear pending message now. Fails while it has findings.
    pub async fn confirm_pending(&mut self) -> Result<&ChatMessage, SessionError> {
        let check = self.pending.as_mut().ok_or(SessionError::NothingPending)?;
        let text = check.confirm()?.to_string();
        self.pending = None;
        Ok(self.dispatch(text).await)
    }

    /// Drop the pending message and its findings. The relay is not called.
    pub fn cancel_pending(&mut self) -> Result<(), SessionError> {
        let mut check = self.pending.take().ok_or(SessionError::NothingPending)?;
        if !check.state().is_terminal() {
            check.cancel()?;
        }
        debug!(session_id = %self.id, check_id = %check.id(), "pending message cancelled");
        Ok(())
    }

    /// Append the user message, call the relay, append the answer or the
    /// error. Relay failures never touch gate state.
    async fn dispatch(&mut self, text: String) -> &ChatMessage {
        let params = self.panel.params();
        self.transcript.push(ChatMessage::user(text.clone()));

        let entry = match self.relay.send(&text, params).await {
            Ok(reply) => {
                info!(
                    session_id = %self.id,
                    output_tokens = reply.usage.output_tokens,
                    adjusted = reply.meta.adjusted,
                    "reply received"
                );
                ChatMessage::assistant(reply.text)
            }
            Err(e) => {
                error!(session_id = %self.id, error = %e, status = ?e.status(), "relay failed");
                ChatMessage::error(&e.to_string())
            }
        };
        self.transcript.push(entry);
        &self.transcript[self.transcript.len() - 1]
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("id", &self.id)
            .field("messages", &self.transcript.len())
            .field("panel", &self.panel)
            .field("pending", &self.pending)
            .finish()
    }
}

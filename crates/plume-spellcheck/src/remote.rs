//! LanguageTool adapter.
//!
//! One POST per check, no retries. Every failure is logged and degrades to
//! an empty finding list so the gate falls back to local findings only.

use std::time::Duration;

use async_trait::async_trait;
use plume_core::{Finding, Severity};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::checker::Checker;

pub const DEFAULT_URL: &str = "https://api.languagetool.org/v2/check";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_MATCHES: usize = 10;

/// Why a remote check produced nothing. Never leaves this module's
/// fail-soft entry point.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("grammar service answered {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
}

#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub url: String,
    /// Two-letter language code, e.g. `fr`.
    pub language: String,
    pub timeout: Duration,
    pub max_matches: usize,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.into(),
            language: "fr".into(),
            timeout: DEFAULT_TIMEOUT,
            max_matches: DEFAULT_MAX_MATCHES,
        }
    }
}

// ── Wire format ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CheckResponse {
    matches: Vec<RemoteMatch>,
}

#[derive(Debug, Deserialize)]
struct RemoteMatch {
    message: String,
    context: MatchContext,
    #[serde(default)]
    rule: MatchRule,
}

#[derive(Debug, Deserialize)]
struct MatchContext {
    text: String,
    offset: usize,
    length: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchRule {
    #[serde(default)]
    issue_type: Option<String>,
}

impl RemoteMatch {
    fn into_finding(self) -> Finding {
        let severity = match self.rule.issue_type.as_deref() {
            Some("misspelling") => Severity::Error,
            _ => Severity::Warning,
        };
        let span = utf16_slice(&self.context.text, self.context.offset, self.context.length);
        Finding::new(span, self.message, severity)
    }
}

/// Substring by UTF-16 code unit offsets (as LanguageTool reports them),
/// clamped to the string.
fn utf16_slice(text: &str, offset: usize, length: usize) -> String {
    let units: Vec<u16> = text.encode_utf16().collect();
    let start = offset.min(units.len());
    let end = start.saturating_add(length).min(units.len());
    String::from_utf16_lossy(&units[start..end])
}

// ── Client ──────────────────────────────────────────────────────────────────

/// Optional third-party grammar checker.
#[derive(Clone, Debug)]
pub struct RemoteGrammarClient {
    client: Client,
    config: RemoteConfig,
}

impl RemoteGrammarClient {
    pub fn new(config: RemoteConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: RemoteConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Check `text`, mapping at most `max_matches` matches. Never fails.
    pub async fn check_remote(&self, text: &str, language: &str) -> Vec<Finding> {
        match self.try_check(text, language).await {
            Ok(findings) => findings,
            Err(e) => {
                warn!(error = %e, url = %self.config.url, "remote grammar check failed, using local findings only");
                Vec::new()
            }
        }
    }

    /// Single attempt against the service, surfacing the failure reason.
    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    pub async fn try_check(&self, text: &str, language: &str) -> Result<Vec<Finding>, RemoteError> {
        let resp = self
            .client
            .post(&self.config.url)
            .timeout(self.config.timeout)
            .form(&[
                ("text", text),
                ("language", language),
                ("enabledOnly", "false"),
            ])
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }

        let body = resp.text().await.map_err(|e| self.classify(e))?;
        let parsed: CheckResponse =
            serde_json::from_str(&body).map_err(|e| RemoteError::Malformed(e.to_string()))?;

        let total = parsed.matches.len();
        let findings: Vec<Finding> = parsed
            .matches
            .into_iter()
            .take(self.config.max_matches)
            .map(RemoteMatch::into_finding)
            .collect();
        debug!(total, kept = findings.len(), "remote grammar check done");
        Ok(findings)
    }

    fn classify(&self, e: reqwest::Error) -> RemoteError {
        if e.is_timeout() {
            RemoteError::Timeout(self.config.timeout)
        } else {
            RemoteError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl Checker for RemoteGrammarClient {
    fn name(&self) -> &str {
        "languagetool"
    }

    async fn check(&self, text: &str) -> Vec<Finding> {
        self.check_remote(text, &self.config.language).await
    }
}

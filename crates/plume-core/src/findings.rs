//! Spell-check findings and the gate decision derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How serious a finding is. Purely informational: any finding blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minor => "minor",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single issue detected in a candidate message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// The offending span, or a short label for whole-text rules.
    pub matched_text: String,
    /// Advisory text shown to the user.
    pub message: String,
    pub severity: Severity,
}

impl Finding {
    pub fn new(matched_text: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            matched_text: matched_text.into(),
            message: message.into(),
            severity,
        }
    }

    pub fn minor(matched_text: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(matched_text, message, Severity::Minor)
    }

    pub fn warning(matched_text: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(matched_text, message, Severity::Warning)
    }

    pub fn error(matched_text: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(matched_text, message, Severity::Error)
    }
}

/// Whether a message may proceed to the relay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateDecision {
    Allow,
    Block,
}

/// Outcome of one gate evaluation. Local findings precede remote ones.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub findings: Vec<Finding>,
    pub checked_at: DateTime<Utc>,
}

impl EvaluationResult {
    pub fn new(findings: Vec<Finding>) -> Self {
        Self {
            findings,
            checked_at: Utc::now(),
        }
    }

    /// `Allow` iff there are no findings, whatever their severity.
    pub fn decision(&self) -> GateDecision {
        if self.findings.is_empty() {
            GateDecision::Allow
        } else {
            GateDecision::Block
        }
    }

    pub fn is_clear(&self) -> bool {
        self.decision() == GateDecision::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_findings_allow() {
        let result = EvaluationResult::new(Vec::new());
        assert_eq!(result.decision(), GateDecision::Allow);
        assert!(result.is_clear());
    }

    #[test]
    fn single_minor_finding_blocks() {
        let result = EvaluationResult::new(vec![Finding::minor("Doubles espaces", "x")]);
        assert_eq!(result.decision(), GateDecision::Block);
    }

    #[test]
    fn every_severity_blocks_equally() {
        for severity in [Severity::Minor, Severity::Warning, Severity::Error] {
            let result = EvaluationResult::new(vec![Finding::new("t", "m", severity)]);
            assert_eq!(result.decision(), GateDecision::Block, "{severity} should block");
        }
    }

    #[test]
    fn finding_serializes_camel_case() {
        let finding = Finding::warning("a été", "Confusion a/à ?");
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["matchedText"], "a été");
        assert_eq!(json["severity"], "warning");
    }

    #[test]
    fn evaluation_result_has_checked_at() {
        let json = serde_json::to_value(EvaluationResult::new(Vec::new())).unwrap();
        assert!(json["checkedAt"].is_string());
        assert!(json["findings"].as_array().unwrap().is_empty());
    }
}

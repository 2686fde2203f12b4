//! Local rule matcher.
//!
//! ## Homophone rules (9)
//! - `homophone.a-a`: "a" / "à" before été, est, était
//! - `homophone.ou-ou`: "ou" / "où" before est, était, sont
//! - `homophone.ce-se`: "ce" before a verb ("c'était")
//! - `homophone.sa-ca`: "sa" / "ça"
//! - `homophone.son-sont`: "son" / "sont"
//! - `homophone.ses-ces`: "ses" / "ces" / "c'est" before a pronoun
//! - `homophone.peu-peut`: "peu être" / "peut-être"
//! - `agreement.fait`: participle agreement after "a"/"as"
//! - `spelling.tous-les-jours`: "tous les jours" / "tout les jours"
//!
//! ## Hygiene rules (3)
//! Double spaces, space before `,`/`;`, lowercase first letter. Each emits
//! at most one finding whatever the number of occurrences.

use std::sync::LazyLock;

use async_trait::async_trait;
use plume_core::Finding;
use regex::Regex;

use crate::checker::Checker;

/// A confusable-word pattern and the advice attached to each of its matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HomophoneRule {
    pub id: &'static str,
    /// Case-insensitive regex, matched left to right.
    pub pattern: &'static str,
    pub message: &'static str,
}

/// The homophone table, in evaluation order.
pub const HOMOPHONE_RULES: &[HomophoneRule] = &[
    HomophoneRule {
        id: "homophone.a-a",
        pattern: r"\ba\s+(?:été|est|était)\b",
        message: "Confusion a/à ? (a été → a été ✓ / à été ✗)",
    },
    HomophoneRule {
        id: "homophone.ou-ou",
        pattern: r"\bou\s+(?:est|était|sont)\b",
        message: "Confusion ou/où ? (ou est → ou est ✓ / où est ?)",
    },
    HomophoneRule {
        id: "homophone.ce-se",
        pattern: r"\bce\s+(?:était|est|sont)\b",
        message: "Confusion ce/se ? (ce était → c'était)",
    },
    HomophoneRule {
        id: "homophone.sa-ca",
        pattern: r"\bsa\s+(?:été|est)\b",
        message: "Confusion sa/ça ? (sa été → ça a été)",
    },
    HomophoneRule {
        id: "homophone.son-sont",
        pattern: r"\bson\s+(?:est|était)\b",
        message: "Confusion son/sont ? (son est → sont)",
    },
    HomophoneRule {
        id: "homophone.ses-ces",
        pattern: r"\b(?:ses|ces)\s+(?:moi|toi|lui)\b",
        message: "Confusion ses/ces/c'est ?",
    },
    HomophoneRule {
        id: "homophone.peu-peut",
        pattern: r"\bpeu\s+(?:être|etre)\b",
        message: "Confusion peu être/peut-être ?",
    },
    HomophoneRule {
        id: "agreement.fait",
        pattern: r"\b(?:a|as)\s+faite?\b",
        message: "Accord du participe passé ? (a fait/a faite)",
    },
    HomophoneRule {
        id: "spelling.tous-les-jours",
        pattern: r"\btous\s+les?\s+jours?\b",
        message: "Vérifier : tous les jours (correct) / tout les jours (incorrect)",
    },
];

pub(crate) const DOUBLE_SPACE_LABEL: &str = "Doubles espaces";
pub(crate) const DOUBLE_SPACE_MESSAGE: &str = "Espaces multiples détectés";
pub(crate) const SPACE_BEFORE_PUNCT_LABEL: &str = "Espaces avant ponctuation";
pub(crate) const SPACE_BEFORE_PUNCT_MESSAGE: &str = "Pas d'espace avant , et ;";
pub(crate) const CAPITALIZATION_LABEL: &str = "Pas de majuscule";
pub(crate) const CAPITALIZATION_MESSAGE: &str = "Le texte devrait commencer par une majuscule";

static COMPILED_RULES: LazyLock<Vec<(&'static HomophoneRule, Regex)>> = LazyLock::new(|| {
    HOMOPHONE_RULES
        .iter()
        .map(|rule| (rule, Regex::new(&format!("(?i){}", rule.pattern)).unwrap()))
        .collect()
});

static SPACE_BEFORE_PUNCT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s[,;]").unwrap());

/// Lowercase letters that trigger the capitalization rule.
fn is_french_lowercase(c: char) -> bool {
    c.is_ascii_lowercase() || "àâäéèêëïîôùûüÿæœç".contains(c)
}

/// Deterministic, side-effect-free matcher over the fixed rule table.
#[derive(Clone, Copy, Debug, Default)]
pub struct RuleMatcher;

impl RuleMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Collect every finding for `text`, in rule order then match order.
    pub fn evaluate(&self, text: &str) -> Vec<Finding> {
        let mut findings = Vec::new();

        for (rule, regex) in COMPILED_RULES.iter() {
            findings.extend(
                regex
                    .find_iter(text)
                    .map(|m| Finding::warning(m.as_str(), rule.message)),
            );
        }

        if text.contains("  ") {
            findings.push(Finding::minor(DOUBLE_SPACE_LABEL, DOUBLE_SPACE_MESSAGE));
        }

        if SPACE_BEFORE_PUNCT.is_match(text) {
            findings.push(Finding::minor(
                SPACE_BEFORE_PUNCT_LABEL,
                SPACE_BEFORE_PUNCT_MESSAGE,
            ));
        }

        if text.chars().next().is_some_and(is_french_lowercase) {
            findings.push(Finding::minor(CAPITALIZATION_LABEL, CAPITALIZATION_MESSAGE));
        }

        findings
    }
}

#[async_trait]
impl Checker for RuleMatcher {
    fn name(&self) -> &str {
        "rules"
    }

    async fn check(&self, text: &str) -> Vec<Finding> {
        self.evaluate(text)
    }
}

#[cfg(test)]
mod tests {
    use plume_core::Severity;

    use super::*;

    fn warnings(findings: &[Finding]) -> Vec<&Finding> {
        findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
            .collect()
    }

    fn minors(findings: &[Finding]) -> Vec<&Finding> {
        findings
            .iter()
            .filter(|f| f.severity == Severity::Minor)
            .collect()
    }

    #[test]
    fn all_patterns_compile() {
        assert_eq!(COMPILED_RULES.len(), HOMOPHONE_RULES.len());
    }

    #[test]
    fn rule_ids_are_unique() {
        let mut ids: Vec<_> = HOMOPHONE_RULES.iter().map(|r| r.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), HOMOPHONE_RULES.len());
    }

    #[test]
    fn each_homophone_rule_fires_on_its_sample() {
        // (sample, expected matched text, rule id)
        let cases = [
            ("Il a été là.", "a été", "homophone.a-a"),
            ("Dis-moi ou est la gare.", "ou est", "homophone.ou-ou"),
            ("Hier ce était bien.", "ce était", "homophone.ce-se"),
            ("Tu sais, sa été dur.", "sa été", "homophone.sa-ca"),
            ("Les amis son est partis.", "son est", "homophone.son-sont"),
            ("Regarde ces moi qui parle.", "ces moi", "homophone.ses-ces"),
            ("Il viendra peu être demain.", "peu être", "homophone.peu-peut"),
            ("Elle a faite une tarte.", "a faite", "agreement.fait"),
            ("Je cours tous les jours.", "tous les jours", "spelling.tous-les-jours"),
        ];

        for (sample, matched, id) in cases {
            let rule = HOMOPHONE_RULES.iter().find(|r| r.id == id).unwrap();
            let findings = RuleMatcher::new().evaluate(sample);
            let hit = findings
                .iter()
                .find(|f| f.message == rule.message)
                .unwrap_or_else(|| panic!("{id} did not fire on {sample:?}"));
            assert_eq!(hit.matched_text, matched, "{id}");
            assert_eq!(hit.severity, Severity::Warning, "{id}");
        }
    }

    #[test]
    fn clean_text_has_no_findings() {
        for text in [
            "Bonjour, comment vas-tu ?",
            "Le chat dort sur le canapé.",
            "Où est la bibliothèque ?",
            "Nous sommes partis hier soir.",
            "",
        ] {
            assert!(RuleMatcher::new().evaluate(text).is_empty(), "{text:?}");
        }
    }

    #[test]
    fn double_space_reported_once() {
        let findings = RuleMatcher::new().evaluate("Il  a été content.");
        let minor = minors(&findings);
        assert_eq!(minor.len(), 1);
        assert_eq!(minor[0].matched_text, DOUBLE_SPACE_LABEL);
        assert_eq!(minor[0].message, DOUBLE_SPACE_MESSAGE);

        let many = RuleMatcher::new().evaluate("Un  deux  trois    quatre.");
        assert_eq!(many.len(), 1);
    }

    #[test]
    fn a_ete_matches_homophone_rule() {
        let findings = RuleMatcher::new().evaluate("a été content");
        let warn = warnings(&findings);
        assert_eq!(warn.len(), 1);
        assert_eq!(warn[0].matched_text, "a été");
    }

    #[test]
    fn lowercase_start_reported_once() {
        let findings = RuleMatcher::new().evaluate("bonjour tout le monde");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Minor);
        assert_eq!(findings[0].matched_text, CAPITALIZATION_LABEL);
    }

    #[test]
    fn accented_lowercase_start_is_flagged() {
        let findings = RuleMatcher::new().evaluate("été comme hiver.");
        assert_eq!(minors(&findings).len(), 1);
    }

    #[test]
    fn non_letter_start_is_not_flagged() {
        assert!(RuleMatcher::new().evaluate("42 est la réponse.").is_empty());
        assert!(RuleMatcher::new().evaluate("« Bonjour »").is_empty());
    }

    #[test]
    fn space_before_comma_reported_once() {
        let findings = RuleMatcher::new().evaluate("Oui , non ; peut-être , enfin.");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].matched_text, SPACE_BEFORE_PUNCT_LABEL);
    }

    #[test]
    fn patterns_are_case_insensitive() {
        let findings = RuleMatcher::new().evaluate("Il A ÉTÉ surpris.");
        assert_eq!(warnings(&findings)[0].matched_text, "A ÉTÉ");
    }

    #[test]
    fn multiple_matches_collected_left_to_right() {
        let findings = RuleMatcher::new().evaluate("Il a été là et elle a été ici, sa été long.");
        let warn = warnings(&findings);
        assert_eq!(warn.len(), 3);
        assert_eq!(warn[0].matched_text, "a été");
        assert_eq!(warn[1].matched_text, "a été");
        assert_eq!(warn[2].matched_text, "sa été");
    }

    #[test]
    fn findings_follow_rule_order() {
        let findings = RuleMatcher::new().evaluate("il a été là  , voilà");
        let labels: Vec<_> = findings.iter().map(|f| f.matched_text.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "a été",
                DOUBLE_SPACE_LABEL,
                SPACE_BEFORE_PUNCT_LABEL,
                CAPITALIZATION_LABEL
            ]
        );
    }

    #[test]
    fn word_boundaries_respected() {
        // "la" + "est" should not trigger the a/à rule.
        assert!(warnings(&RuleMatcher::new().evaluate("Voila est tout.")).is_empty());
    }

    #[test]
    fn evaluate_is_deterministic() {
        let text = "il a été là  ,ou est-il";
        assert_eq!(
            RuleMatcher::new().evaluate(text),
            RuleMatcher::new().evaluate(text)
        );
    }

    #[tokio::test]
    async fn checker_delegates_to_evaluate() {
        let matcher = RuleMatcher::new();
        assert_eq!(matcher.name(), "rules");
        assert_eq!(matcher.check("bonjour").await, matcher.evaluate("bonjour"));
    }
}

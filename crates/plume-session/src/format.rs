use std::sync::LazyLock;

use regex::Regex;

static SPACE_BEFORE_HIGH_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([?!:;»])").unwrap());
static SPACE_AFTER_OPENING_GUILLEMET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(«)\s+").unwrap());

/// Replace whitespace before `? ! : ; »` and after `«` with a single
/// non-breaking space.
pub fn format_french_punctuation(text: &str) -> String {
    let text = SPACE_BEFORE_HIGH_PUNCT.replace_all(text, "\u{00A0}$1");
    SPACE_AFTER_OPENING_GUILLEMET
        .replace_all(&text, "$1\u{00A0}")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_punctuation_gets_nbsp() {
        assert_eq!(
            format_french_punctuation("Vraiment ? Oui ! Note : ceci ; cela"),
            "Vraiment\u{00A0}? Oui\u{00A0}! Note\u{00A0}: ceci\u{00A0}; cela"
        );
    }

    #[test]
    fn guillemets_get_nbsp_inside() {
        assert_eq!(
            format_french_punctuation("Il a dit « bonjour » hier"),
            "Il a dit «\u{00A0}bonjour\u{00A0}» hier"
        );
    }

    #[test]
    fn runs_of_whitespace_collapse() {
        assert_eq!(format_french_punctuation("Quoi   ?"), "Quoi\u{00A0}?");
    }

    #[test]
    fn already_formatted_text_is_stable() {
        let once = format_french_punctuation("Pourquoi ? « Parce que »");
        assert_eq!(format_french_punctuation(&once), once);
    }

    #[test]
    fn text_without_punctuation_untouched() {
        assert_eq!(format_french_punctuation("Rien à changer."), "Rien à changer.");
    }
}

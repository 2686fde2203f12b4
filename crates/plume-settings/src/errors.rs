//! Settings error types.

use std::path::PathBuf;

use thiserror::Error;

/// Why a settings file could not be turned into [`PlumeSettings`](crate::PlumeSettings).
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file is not JSON, or a field has the wrong type.
    #[error("failed to parse settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Well-typed but unusable, e.g. `maxRemoteMatches: 0`.
    #[error("invalid `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, SettingsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_error_names_the_file() {
        let err = SettingsError::Read {
            path: PathBuf::from("/etc/plume/settings.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "cannot read /etc/plume/settings.json: denied");
    }

    #[test]
    fn invalid_names_the_key() {
        let err = SettingsError::Invalid {
            key: "spellcheck.language",
            reason: "expected a two-letter code, got \"french\"".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid `spellcheck.language`: expected a two-letter code, got \"french\""
        );
    }
}

//! Languages offered by an exported package.

use serde::{Deserialize, Serialize};

/// A language entry written to `languages.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// Locale identifiers that resolve to this language.
    pub codes: Vec<String>,
    /// Whether this is the default language.
    pub default: bool,
    /// Display name.
    pub text: String,
}

impl Language {
    /// Create a language.
    #[must_use]
    pub fn new(codes: Vec<String>, text: impl Into<String>, default: bool) -> Self {
        Self {
            codes,
            default,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_serializes_in_interface_shape() {
        let lang = Language::new(vec!["en-US".into(), "en".into()], "English", true);
        let json = serde_json::to_string(&lang).unwrap_or_default();
        assert_eq!(
            json,
            r#"{"codes":["en-US","en"],"default":true,"text":"English"}"#
        );
    }
}

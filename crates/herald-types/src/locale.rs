//! Locale tags.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A normalised `language_REGION` locale tag (e.g. `en_US`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Locale(String);

impl Locale {
    /// Parse a tag, accepting `-` or `_` separators in any case.
    ///
    /// `"en-us"`, `"EN_us"` and `"en_US"` all normalise to `en_US`. An empty
    /// tag yields the default locale.
    pub fn parse(tag: &str) -> Self {
        let tag = tag.trim();
        if tag.is_empty() {
            return Self::default();
        }

        let mut parts = tag.split(['-', '_']);
        let language = parts.next().unwrap_or_default().to_ascii_lowercase();
        let rest: Vec<String> = parts
            .filter(|p| !p.is_empty())
            .map(|p| p.to_ascii_uppercase())
            .collect();

        if rest.is_empty() {
            Self(language)
        } else {
            Self(format!("{}_{}", language, rest.join("_")))
        }
    }

    /// The language subtag (e.g. `en`).
    pub fn language(&self) -> &str {
        self.0.split('_').next().unwrap_or(&self.0)
    }

    /// The region subtag, if any (e.g. `US`).
    pub fn region(&self) -> Option<&str> {
        self.0.split('_').nth(1)
    }

    /// The normalised tag.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self("en_US".to_string())
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Locale {
    fn from(tag: String) -> Self {
        Self::parse(&tag)
    }
}

impl From<&str> for Locale {
    fn from(tag: &str) -> Self {
        Self::parse(tag)
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalises_separator_and_case() {
        assert_eq!(Locale::parse("en-us").as_str(), "en_US");
        assert_eq!(Locale::parse("EN_us").as_str(), "en_US");
        assert_eq!(Locale::parse("de").as_str(), "de");
    }

    #[test]
    fn test_empty_tag_is_default() {
        assert_eq!(Locale::parse("  "), Locale::default());
        assert_eq!(Locale::default().as_str(), "en_US");
    }

    #[test]
    fn test_subtags() {
        let locale = Locale::parse("pt_br");
        assert_eq!(locale.language(), "pt");
        assert_eq!(locale.region(), Some("BR"));
        assert_eq!(Locale::parse("fr").region(), None);
    }
}

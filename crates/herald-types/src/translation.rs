//! Rendering components for a locale.
//!
//! A [`Translator`] is handed to every audience; it is called once per send
//! with the audience locale. [`TranslationCatalog`] resolves translatable
//! components from registered `{0}`-style patterns.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::component::Component;
use crate::error::TranslateError;
use crate::locale::Locale;

/// Renders components for a target locale.
pub trait Translator: Send + Sync {
    /// Render `component` for `locale`.
    fn render(&self, component: &Component, locale: &Locale) -> Result<Component, TranslateError>;
}

/// Translator that returns components unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Translator for Passthrough {
    fn render(&self, component: &Component, _locale: &Locale) -> Result<Component, TranslateError> {
        Ok(component.clone())
    }
}

/// A key × locale table of message patterns.
///
/// Lookup tries the exact locale, then any registered locale with the same
/// language, then the catalog default. Keys without a pattern stay
/// translatable (with rendered arguments) so the client can resolve them.
pub struct TranslationCatalog {
    default_locale: Locale,
    patterns: RwLock<HashMap<String, HashMap<Locale, String>>>,
}

impl TranslationCatalog {
    /// Create an empty catalog.
    pub fn new(default_locale: Locale) -> Self {
        Self {
            default_locale,
            patterns: RwLock::new(HashMap::new()),
        }
    }

    /// Register a pattern, replacing any previous one for the same key and locale.
    pub fn register(&self, key: impl Into<String>, locale: Locale, pattern: impl Into<String>) {
        self.patterns
            .write()
            .entry(key.into())
            .or_default()
            .insert(locale, pattern.into());
    }

    /// Remove every pattern registered for `key`.
    pub fn unregister(&self, key: &str) -> bool {
        self.patterns.write().remove(key).is_some()
    }

    /// Returns true if any pattern is registered for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.patterns.read().contains_key(key)
    }

    /// The catalog's fallback locale.
    pub fn default_locale(&self) -> &Locale {
        &self.default_locale
    }

    fn lookup(&self, key: &str, locale: &Locale) -> Option<String> {
        let patterns = self.patterns.read();
        let by_locale = patterns.get(key)?;

        if let Some(pattern) = by_locale.get(locale) {
            return Some(pattern.clone());
        }

        let language_match = by_locale
            .iter()
            .filter(|(candidate, _)| candidate.language() == locale.language())
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, pattern)| pattern.clone());
        if language_match.is_some() {
            return language_match;
        }

        by_locale.get(&self.default_locale).cloned()
    }
}

impl Default for TranslationCatalog {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}

impl Translator for TranslationCatalog {
    fn render(&self, component: &Component, locale: &Locale) -> Result<Component, TranslateError> {
        match component {
            Component::Text(_) => Ok(component.clone()),
            Component::Group(children) => Ok(Component::Group(
                children
                    .iter()
                    .map(|child| self.render(child, locale))
                    .collect::<Result<_, _>>()?,
            )),
            Component::Translatable { key, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.render(arg, locale))
                    .collect::<Result<Vec<_>, _>>()?;

                match self.lookup(key, locale) {
                    Some(pattern) => format_pattern(key, &pattern, args),
                    None => Ok(Component::Translatable {
                        key: key.clone(),
                        args,
                    }),
                }
            }
        }
    }
}

/// Expand `{N}` placeholders; `{{` emits a literal brace.
fn format_pattern(
    key: &str,
    pattern: &str,
    args: Vec<Component>,
) -> Result<Component, TranslateError> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '{' {
            literal.push(c);
            continue;
        }
        if chars.peek() == Some(&'{') {
            chars.next();
            literal.push('{');
            continue;
        }

        let mut digits = String::new();
        loop {
            match chars.next() {
                Some('}') => break,
                Some(d) if d.is_ascii_digit() => digits.push(d),
                Some(other) => {
                    return Err(TranslateError::MalformedPattern {
                        key: key.to_string(),
                        reason: format!("unexpected '{}' in placeholder", other),
                    })
                }
                None => {
                    return Err(TranslateError::MalformedPattern {
                        key: key.to_string(),
                        reason: "unclosed placeholder".to_string(),
                    })
                }
            }
        }

        if digits.is_empty() {
            return Err(TranslateError::MalformedPattern {
                key: key.to_string(),
                reason: "empty placeholder".to_string(),
            });
        }
        let index: usize = digits.parse().map_err(|_| TranslateError::MalformedPattern {
            key: key.to_string(),
            reason: format!("placeholder index {} out of range", digits),
        })?;
        let arg = args.get(index).ok_or_else(|| TranslateError::MissingArgument {
            key: key.to_string(),
            index,
        })?;

        if !literal.is_empty() {
            parts.push(Component::Text(std::mem::take(&mut literal)));
        }
        parts.push(arg.clone());
    }

    if !literal.is_empty() {
        parts.push(Component::Text(literal));
    }

    if parts.len() == 1 {
        Ok(parts.remove(0))
    } else {
        Ok(Component::Group(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> TranslationCatalog {
        let catalog = TranslationCatalog::new(Locale::parse("en_US"));
        catalog.register("greeting", Locale::parse("en_US"), "Hello, {0}!");
        catalog.register("greeting", Locale::parse("de_DE"), "Hallo, {0}!");
        catalog.register("bar.name", Locale::parse("en_US"), "Raid");
        catalog
    }

    #[test]
    fn test_render_exact_locale() {
        let component =
            Component::translatable_with("greeting", vec![Component::text("Alex")]);
        let rendered = catalog()
            .render(&component, &Locale::parse("de_DE"))
            .unwrap();
        assert_eq!(rendered.plain_text(), "Hallo, Alex!");
    }

    #[test]
    fn test_render_language_fallback() {
        let component =
            Component::translatable_with("greeting", vec![Component::text("Alex")]);
        let rendered = catalog()
            .render(&component, &Locale::parse("de_AT"))
            .unwrap();
        assert_eq!(rendered.plain_text(), "Hallo, Alex!");
    }

    #[test]
    fn test_render_default_locale_fallback() {
        let rendered = catalog()
            .render(&Component::translatable("bar.name"), &Locale::parse("fr_FR"))
            .unwrap();
        assert_eq!(rendered, Component::text("Raid"));
    }

    #[test]
    fn test_unknown_key_stays_translatable() {
        let component = Component::translatable("missing.key");
        let rendered = catalog().render(&component, &Locale::default()).unwrap();
        assert_eq!(rendered, component);
    }

    #[test]
    fn test_missing_argument_is_an_error() {
        let err = catalog()
            .render(&Component::translatable("greeting"), &Locale::default())
            .unwrap_err();
        assert_eq!(
            err,
            TranslateError::MissingArgument {
                key: "greeting".to_string(),
                index: 0
            }
        );
    }

    #[test]
    fn test_malformed_pattern() {
        let catalog = TranslationCatalog::default();
        catalog.register("broken", Locale::default(), "oops {0");
        let err = catalog
            .render(
                &Component::translatable_with("broken", vec![Component::text("x")]),
                &Locale::default(),
            )
            .unwrap_err();
        assert!(matches!(err, TranslateError::MalformedPattern { .. }));
    }

    #[test]
    fn test_placeholder_errors_name_the_cause() {
        let reason = |pattern: &str| match format_pattern("key", pattern, Vec::new()) {
            Err(TranslateError::MalformedPattern { reason, .. }) => reason,
            other => panic!("unexpected result: {:?}", other),
        };

        assert_eq!(reason("a {} b"), "empty placeholder");
        assert_eq!(
            reason("{99999999999999999999}"),
            "placeholder index 99999999999999999999 out of range"
        );
    }

    #[test]
    fn test_escaped_brace() {
        let catalog = TranslationCatalog::default();
        catalog.register("brace", Locale::default(), "{{literal}");
        let rendered = catalog
            .render(&Component::translatable("brace"), &Locale::default())
            .unwrap();
        assert_eq!(rendered.plain_text(), "{literal}");
    }

    #[test]
    fn test_passthrough_is_identity() {
        let component = Component::translatable("anything");
        assert_eq!(
            Passthrough.render(&component, &Locale::default()).unwrap(),
            component
        );
    }
}

//! Explicit audience composition.

use std::sync::Arc;

use tracing::debug;

use herald_facet::{Capabilities, Diagnostics, FacetCatalog, FacetSelector, Viewer};
use herald_types::{HeraldConfig, Locale, Passthrough, Translator};

use crate::Audience;

/// Builds an [`Audience`].
///
/// Capabilities are resolved in [`AudienceBuilder::build`] against the first
/// viewer given. Without a catalog or without viewers every feature is
/// disabled.
pub struct AudienceBuilder<V> {
    viewers: Vec<V>,
    locale: Option<Locale>,
    catalog: Option<Arc<FacetCatalog<V>>>,
    translator: Arc<dyn Translator>,
    config: HeraldConfig,
}

impl<V: Viewer> AudienceBuilder<V> {
    pub fn new() -> Self {
        Self {
            viewers: Vec::new(),
            locale: None,
            catalog: None,
            translator: Arc::new(Passthrough),
            config: HeraldConfig::default(),
        }
    }

    pub fn viewer(mut self, viewer: V) -> Self {
        if !self.viewers.contains(&viewer) {
            self.viewers.push(viewer);
        }
        self
    }

    pub fn viewers(mut self, viewers: impl IntoIterator<Item = V>) -> Self {
        for viewer in viewers {
            self = self.viewer(viewer);
        }
        self
    }

    /// Locale for rendering. Defaults to the configured default locale.
    pub fn locale(mut self, locale: Locale) -> Self {
        self.locale = Some(locale);
        self
    }

    pub fn catalog(mut self, catalog: Arc<FacetCatalog<V>>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn config(mut self, config: HeraldConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Audience<V> {
        let diagnostics = Diagnostics::from_config(&self.config);
        let selector = FacetSelector::new(diagnostics);
        let representative = self.viewers.first();

        let capabilities = match &self.catalog {
            Some(catalog) => catalog.resolve(representative, &selector),
            None => Capabilities::disabled(),
        };
        debug!(
            viewers = self.viewers.len(),
            ?representative,
            ?capabilities,
            "Resolved audience capabilities"
        );

        let locale = self.locale.unwrap_or(self.config.default_locale);
        Audience::new(self.viewers, locale, capabilities, self.translator, diagnostics)
    }
}

impl<V: Viewer> Default for AudienceBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

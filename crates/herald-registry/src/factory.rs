//! Host-supplied viewer classification and audience construction.

use std::sync::Arc;

use herald_audience::Audience;
use herald_facet::{FacetCatalog, Viewer};
use herald_types::{HeraldConfig, Locale, Passthrough, Translator};

use crate::PlayerId;

/// Answers questions about viewers on behalf of the host.
///
/// Only `player_id` and `is_console` are required. The others default to
/// "no", which makes the matching registry views empty.
pub trait ViewerClassifier<V>: Send + Sync {
    /// The player id, if the viewer is a player.
    fn player_id(&self, viewer: &V) -> Option<PlayerId>;

    fn is_console(&self, viewer: &V) -> bool;

    fn has_permission(&self, _viewer: &V, _node: &str) -> bool {
        false
    }

    fn is_in_world(&self, _viewer: &V, _world: &str) -> bool {
        false
    }

    fn is_on_server(&self, _viewer: &V, _server: &str) -> bool {
        false
    }

    /// Locale reported by the host, if any.
    fn locale(&self, _viewer: &V) -> Option<Locale> {
        None
    }
}

/// Creates the single-viewer audience for a newly registered viewer.
pub trait AudienceFactory<V>: Send + Sync {
    fn create_audience(&self, viewer: V, locale: Locale) -> Arc<Audience<V>>;
}

/// Builds audiences from one shared facet catalog.
pub struct CatalogFactory<V> {
    catalog: Arc<FacetCatalog<V>>,
    translator: Arc<dyn Translator>,
    config: HeraldConfig,
}

impl<V: Viewer> CatalogFactory<V> {
    pub fn new(catalog: Arc<FacetCatalog<V>>) -> Self {
        Self {
            catalog,
            translator: Arc::new(Passthrough),
            config: HeraldConfig::default(),
        }
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn with_config(mut self, config: HeraldConfig) -> Self {
        self.config = config;
        self
    }
}

impl<V: Viewer> AudienceFactory<V> for CatalogFactory<V> {
    fn create_audience(&self, viewer: V, locale: Locale) -> Arc<Audience<V>> {
        Arc::new(
            Audience::builder()
                .viewer(viewer)
                .locale(locale)
                .catalog(Arc::clone(&self.catalog))
                .translator(Arc::clone(&self.translator))
                .config(self.config.clone())
                .build(),
        )
    }
}

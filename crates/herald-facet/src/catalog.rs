//! Per-feature candidate lists and resolved capability sets.

use std::fmt;
use std::sync::Arc;

use herald_types::{ActionBar, Book, ChatLine, FeatureKind, SoundAction, TabList, TitleAction};

use crate::{BossBarFacet, Dispatch, Facet, FacetResult, FacetSelector, FacetSupplier, Viewer};

/// Ordered candidate facets for every feature, already filtered to the ones
/// supported in this environment. Earlier entries have priority.
pub struct FacetCatalog<V> {
    pub chat: Vec<Arc<dyn Dispatch<V, ChatLine>>>,
    pub action_bar: Vec<Arc<dyn Dispatch<V, ActionBar>>>,
    pub title: Vec<Arc<dyn Dispatch<V, TitleAction>>>,
    pub sound: Vec<Arc<dyn Dispatch<V, SoundAction>>>,
    pub book: Vec<Arc<dyn Dispatch<V, Book>>>,
    pub tab_list: Vec<Arc<dyn Dispatch<V, TabList>>>,
    pub boss_bar: Vec<Arc<dyn BossBarFacet<V>>>,
}

impl<V: Viewer> FacetCatalog<V> {
    /// A catalog with no candidates; every feature resolves to disabled.
    pub fn empty() -> Self {
        Self {
            chat: Vec::new(),
            action_bar: Vec::new(),
            title: Vec::new(),
            sound: Vec::new(),
            book: Vec::new(),
            tab_list: Vec::new(),
            boss_bar: Vec::new(),
        }
    }

    /// Start collecting candidate suppliers.
    pub fn builder() -> CatalogBuilder<V> {
        CatalogBuilder::new()
    }

    /// Number of candidates registered for `kind`.
    pub fn candidates(&self, kind: FeatureKind) -> usize {
        match kind {
            FeatureKind::Chat => self.chat.len(),
            FeatureKind::ActionBar => self.action_bar.len(),
            FeatureKind::Title => self.title.len(),
            FeatureKind::Sound => self.sound.len(),
            FeatureKind::Book => self.book.len(),
            FeatureKind::TabList => self.tab_list.len(),
            FeatureKind::BossBar => self.boss_bar.len(),
        }
    }

    /// Pick one facet per feature for `representative`.
    ///
    /// Without a representative every feature is disabled.
    pub fn resolve(&self, representative: Option<&V>, selector: &FacetSelector) -> Capabilities<V> {
        let Some(viewer) = representative else {
            return Capabilities::disabled();
        };

        let capabilities = Capabilities {
            chat: selector.select_one(&self.chat, viewer).cloned(),
            action_bar: selector.select_one(&self.action_bar, viewer).cloned(),
            title: selector.select_one(&self.title, viewer).cloned(),
            sound: selector.select_one(&self.sound, viewer).cloned(),
            book: selector.select_one(&self.book, viewer).cloned(),
            tab_list: selector.select_one(&self.tab_list, viewer).cloned(),
            boss_bar: selector.select_one(&self.boss_bar, viewer).cloned(),
        };

        let diagnostics = selector.diagnostics();
        for kind in FeatureKind::ALL {
            if !capabilities.is_enabled(kind) {
                diagnostics.unsupported(
                    kind,
                    format_args!("No applicable facet for {:?}", viewer),
                );
            }
        }

        capabilities
    }
}

impl<V: Viewer> Default for FacetCatalog<V> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<V> fmt::Debug for FacetCatalog<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacetCatalog")
            .field("chat", &self.chat.len())
            .field("action_bar", &self.action_bar.len())
            .field("title", &self.title.len())
            .field("sound", &self.sound.len())
            .field("book", &self.book.len())
            .field("tab_list", &self.tab_list.len())
            .field("boss_bar", &self.boss_bar.len())
            .finish()
    }
}

/// Collects candidate suppliers per feature, in priority order.
pub struct CatalogBuilder<V> {
    chat: Vec<FacetSupplier<Arc<dyn Dispatch<V, ChatLine>>>>,
    action_bar: Vec<FacetSupplier<Arc<dyn Dispatch<V, ActionBar>>>>,
    title: Vec<FacetSupplier<Arc<dyn Dispatch<V, TitleAction>>>>,
    sound: Vec<FacetSupplier<Arc<dyn Dispatch<V, SoundAction>>>>,
    book: Vec<FacetSupplier<Arc<dyn Dispatch<V, Book>>>>,
    tab_list: Vec<FacetSupplier<Arc<dyn Dispatch<V, TabList>>>>,
    boss_bar: Vec<FacetSupplier<Arc<dyn BossBarFacet<V>>>>,
}

macro_rules! candidate_method {
    ($(#[$doc:meta])* $method:ident, $field:ident, $content:ty) => {
        $(#[$doc])*
        pub fn $method<F, S>(mut self, supplier: S) -> Self
        where
            F: Dispatch<V, $content> + 'static,
            S: FnOnce() -> FacetResult<F> + Send + 'static,
        {
            self.$field.push(Box::new(move || {
                supplier().map(|facet| Arc::new(facet) as Arc<dyn Dispatch<V, $content>>)
            }));
            self
        }
    };
}

impl<V: Viewer> CatalogBuilder<V> {
    pub fn new() -> Self {
        Self {
            chat: Vec::new(),
            action_bar: Vec::new(),
            title: Vec::new(),
            sound: Vec::new(),
            book: Vec::new(),
            tab_list: Vec::new(),
            boss_bar: Vec::new(),
        }
    }

    candidate_method!(
        /// Add a chat candidate.
        chat, chat, ChatLine
    );
    candidate_method!(
        /// Add an action bar candidate.
        action_bar, action_bar, ActionBar
    );
    candidate_method!(
        /// Add a title candidate.
        title, title, TitleAction
    );
    candidate_method!(
        /// Add a sound candidate.
        sound, sound, SoundAction
    );
    candidate_method!(
        /// Add a book candidate.
        book, book, Book
    );
    candidate_method!(
        /// Add a player-list header/footer candidate.
        tab_list, tab_list, TabList
    );

    /// Add a boss bar candidate.
    pub fn boss_bar<F, S>(mut self, supplier: S) -> Self
    where
        F: BossBarFacet<V> + 'static,
        S: FnOnce() -> FacetResult<F> + Send + 'static,
    {
        self.boss_bar.push(Box::new(move || {
            supplier().map(|facet| Arc::new(facet) as Arc<dyn BossBarFacet<V>>)
        }));
        self
    }

    /// Construct every candidate and keep the supported ones.
    pub fn build(self, selector: &FacetSelector) -> FacetCatalog<V> {
        FacetCatalog {
            chat: selector.select_all::<V, _>(self.chat),
            action_bar: selector.select_all::<V, _>(self.action_bar),
            title: selector.select_all::<V, _>(self.title),
            sound: selector.select_all::<V, _>(self.sound),
            book: selector.select_all::<V, _>(self.book),
            tab_list: selector.select_all::<V, _>(self.tab_list),
            boss_bar: selector.select_all::<V, _>(self.boss_bar),
        }
    }
}

impl<V: Viewer> Default for CatalogBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// One resolved facet per feature; `None` means the feature is a no-op.
///
/// Fixed when the owning audience is created.
pub struct Capabilities<V> {
    chat: Option<Arc<dyn Dispatch<V, ChatLine>>>,
    action_bar: Option<Arc<dyn Dispatch<V, ActionBar>>>,
    title: Option<Arc<dyn Dispatch<V, TitleAction>>>,
    sound: Option<Arc<dyn Dispatch<V, SoundAction>>>,
    book: Option<Arc<dyn Dispatch<V, Book>>>,
    tab_list: Option<Arc<dyn Dispatch<V, TabList>>>,
    boss_bar: Option<Arc<dyn BossBarFacet<V>>>,
}

impl<V> Capabilities<V> {
    /// Every feature disabled.
    pub fn disabled() -> Self {
        Self {
            chat: None,
            action_bar: None,
            title: None,
            sound: None,
            book: None,
            tab_list: None,
            boss_bar: None,
        }
    }

    pub fn chat(&self) -> Option<&Arc<dyn Dispatch<V, ChatLine>>> {
        self.chat.as_ref()
    }

    pub fn action_bar(&self) -> Option<&Arc<dyn Dispatch<V, ActionBar>>> {
        self.action_bar.as_ref()
    }

    pub fn title(&self) -> Option<&Arc<dyn Dispatch<V, TitleAction>>> {
        self.title.as_ref()
    }

    pub fn sound(&self) -> Option<&Arc<dyn Dispatch<V, SoundAction>>> {
        self.sound.as_ref()
    }

    pub fn book(&self) -> Option<&Arc<dyn Dispatch<V, Book>>> {
        self.book.as_ref()
    }

    pub fn tab_list(&self) -> Option<&Arc<dyn Dispatch<V, TabList>>> {
        self.tab_list.as_ref()
    }

    pub fn boss_bar(&self) -> Option<&Arc<dyn BossBarFacet<V>>> {
        self.boss_bar.as_ref()
    }

    pub fn is_enabled(&self, kind: FeatureKind) -> bool {
        match kind {
            FeatureKind::Chat => self.chat.is_some(),
            FeatureKind::ActionBar => self.action_bar.is_some(),
            FeatureKind::Title => self.title.is_some(),
            FeatureKind::Sound => self.sound.is_some(),
            FeatureKind::Book => self.book.is_some(),
            FeatureKind::TabList => self.tab_list.is_some(),
            FeatureKind::BossBar => self.boss_bar.is_some(),
        }
    }

    /// Name of the facet resolved for `kind`, if any.
    pub fn facet_name(&self, kind: FeatureKind) -> Option<&'static str> {
        match kind {
            FeatureKind::Chat => self.chat.as_ref().map(|f| Facet::<V>::name(&**f)),
            FeatureKind::ActionBar => self.action_bar.as_ref().map(|f| Facet::<V>::name(&**f)),
            FeatureKind::Title => self.title.as_ref().map(|f| Facet::<V>::name(&**f)),
            FeatureKind::Sound => self.sound.as_ref().map(|f| Facet::<V>::name(&**f)),
            FeatureKind::Book => self.book.as_ref().map(|f| Facet::<V>::name(&**f)),
            FeatureKind::TabList => self.tab_list.as_ref().map(|f| Facet::<V>::name(&**f)),
            FeatureKind::BossBar => self.boss_bar.as_ref().map(|f| Facet::<V>::name(&**f)),
        }
    }
}

impl<V> fmt::Debug for Capabilities<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for kind in FeatureKind::ALL {
            map.entry(&kind.name(), &self.facet_name(kind));
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BossBarHandle, Capability, Facet, FacetError};
    use herald_types::{BossBarColor, BossBarFlags, BossBarOverlay, Component};

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    enum TestViewer {
        Modern(u32),
        Legacy(u32),
    }

    struct ModernChat;

    impl Facet<TestViewer> for ModernChat {
        fn name(&self) -> &'static str {
            "modern-chat"
        }

        fn applicable(&self, viewer: &TestViewer) -> FacetResult<bool> {
            Ok(matches!(viewer, TestViewer::Modern(_)))
        }
    }

    impl Capability<TestViewer, ChatLine> for ModernChat {
        type Message = String;

        fn create_message(&self, _viewer: &TestViewer, content: &ChatLine) -> Option<String> {
            Some(content.message.plain_text())
        }

        fn send(&self, _viewer: &TestViewer, _message: &String) -> FacetResult<()> {
            Ok(())
        }
    }

    struct LegacyChat;

    impl Facet<TestViewer> for LegacyChat {
        fn name(&self) -> &'static str {
            "legacy-chat"
        }
    }

    impl Capability<TestViewer, ChatLine> for LegacyChat {
        type Message = String;

        fn create_message(&self, _viewer: &TestViewer, content: &ChatLine) -> Option<String> {
            Some(content.message.plain_text())
        }

        fn send(&self, _viewer: &TestViewer, _message: &String) -> FacetResult<()> {
            Ok(())
        }
    }

    struct NoopBar;

    impl BossBarHandle<TestViewer> for NoopBar {
        fn name_changed(&mut self, _name: &Component) -> FacetResult<()> {
            Ok(())
        }
        fn percent_changed(&mut self, _percent: f32) -> FacetResult<()> {
            Ok(())
        }
        fn color_changed(&mut self, _color: BossBarColor) -> FacetResult<()> {
            Ok(())
        }
        fn overlay_changed(&mut self, _overlay: BossBarOverlay) -> FacetResult<()> {
            Ok(())
        }
        fn flags_changed(&mut self, _added: BossBarFlags, _removed: BossBarFlags) -> FacetResult<()> {
            Ok(())
        }
        fn add_viewer(&mut self, _viewer: &TestViewer) -> FacetResult<()> {
            Ok(())
        }
        fn remove_viewer(&mut self, _viewer: &TestViewer) -> FacetResult<()> {
            Ok(())
        }
        fn is_empty(&self) -> bool {
            true
        }
        fn close(&mut self) {}
    }

    struct UnsupportedBars;

    impl Facet<TestViewer> for UnsupportedBars {
        fn name(&self) -> &'static str {
            "unsupported-bars"
        }

        fn supported(&self) -> bool {
            false
        }
    }

    impl BossBarFacet<TestViewer> for UnsupportedBars {
        fn create_bossbar(&self, _viewers: &[TestViewer]) -> Box<dyn BossBarHandle<TestViewer>> {
            Box::new(NoopBar)
        }
    }

    fn catalog() -> FacetCatalog<TestViewer> {
        FacetCatalog::builder()
            .chat(|| Err::<ModernChat, _>(FacetError::Unavailable("no signed chat".into())))
            .chat(|| Ok(ModernChat))
            .chat(|| Ok(LegacyChat))
            .boss_bar(|| Ok(UnsupportedBars))
            .build(&FacetSelector::default())
    }

    #[test]
    fn test_builder_filters_candidates() {
        let catalog = catalog();
        assert_eq!(catalog.candidates(FeatureKind::Chat), 2);
        assert_eq!(catalog.candidates(FeatureKind::BossBar), 0);
        assert_eq!(catalog.candidates(FeatureKind::Title), 0);
    }

    #[test]
    fn test_resolve_picks_per_representative() {
        let catalog = catalog();
        let selector = FacetSelector::default();

        let modern = catalog.resolve(Some(&TestViewer::Modern(1)), &selector);
        assert_eq!(modern.facet_name(FeatureKind::Chat), Some("modern-chat"));

        let legacy = catalog.resolve(Some(&TestViewer::Legacy(2)), &selector);
        assert_eq!(legacy.facet_name(FeatureKind::Chat), Some("legacy-chat"));
        assert!(!legacy.is_enabled(FeatureKind::BossBar));
    }

    #[test]
    fn test_resolve_without_representative_is_disabled() {
        let capabilities = catalog().resolve(None, &FacetSelector::default());
        for kind in FeatureKind::ALL {
            assert!(!capabilities.is_enabled(kind));
        }
    }
}

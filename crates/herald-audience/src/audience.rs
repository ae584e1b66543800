//! The audience: viewers, resolved capabilities, and tracked boss bars.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, instrument, trace, warn};

use herald_facet::{Capabilities, Diagnostics, Dispatch, Facet, Viewer};
use herald_types::{
    ActionBar, Book, BossBar, BossBarId, BossBarListener, ChatLine, Component, Feature,
    FeatureKind, Locale, Sound, SoundAction, SoundStop, TabList, Title, TitleAction, Translator,
};

use crate::{AudienceBuilder, BossBarBridge};

/// A boss bar shown to this audience, with the bridge listening to it.
struct TrackedBar<V> {
    bar: Arc<BossBar>,
    bridge: Arc<BossBarBridge<V>>,
    listener: Arc<dyn BossBarListener>,
}

impl<V: Viewer> TrackedBar<V> {
    /// Unregister from the bar and close the handle.
    fn detach(self) {
        self.bar.remove_listener(&self.listener);
        self.bridge.close();
        trace!(bar = %self.bar.id(), "Boss bar bridge discarded");
    }
}

/// A group of viewers sharing one set of resolved capabilities.
///
/// Capabilities are resolved once, against the first viewer, and never
/// change afterwards. Sends are no-ops for disabled features and after
/// [`Audience::close`].
pub struct Audience<V> {
    viewers: RwLock<Vec<V>>,
    representative: RwLock<Option<V>>,
    locale: Arc<RwLock<Locale>>,
    capabilities: Capabilities<V>,
    bridges: Mutex<HashMap<BossBarId, TrackedBar<V>>>,
    translator: Arc<dyn Translator>,
    diagnostics: Diagnostics,
    closed: AtomicBool,
}

impl<V: Viewer> Audience<V> {
    pub fn builder() -> AudienceBuilder<V> {
        AudienceBuilder::new()
    }

    pub(crate) fn new(
        viewers: Vec<V>,
        locale: Locale,
        capabilities: Capabilities<V>,
        translator: Arc<dyn Translator>,
        diagnostics: Diagnostics,
    ) -> Self {
        let representative = viewers.first().cloned();
        Self {
            viewers: RwLock::new(viewers),
            representative: RwLock::new(representative),
            locale: Arc::new(RwLock::new(locale)),
            capabilities,
            bridges: Mutex::new(HashMap::new()),
            translator,
            diagnostics,
            closed: AtomicBool::new(false),
        }
    }

    /// Snapshot of the current viewers.
    pub fn viewers(&self) -> Vec<V> {
        self.viewers.read().clone()
    }

    pub fn contains(&self, viewer: &V) -> bool {
        self.viewers.read().contains(viewer)
    }

    pub fn len(&self) -> usize {
        self.viewers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.viewers.read().is_empty()
    }

    /// The viewer new capability sets would be resolved against.
    pub fn representative(&self) -> Option<V> {
        self.representative.read().clone()
    }

    pub fn locale(&self) -> Locale {
        self.locale.read().clone()
    }

    /// Change the rendering locale. Capabilities are not re-resolved.
    pub fn change_locale(&self, locale: Locale) {
        let previous = std::mem::replace(&mut *self.locale.write(), locale.clone());
        if previous != locale {
            debug!(from = %previous, to = %locale, "Audience locale changed");
        }
    }

    pub fn capabilities(&self) -> &Capabilities<V> {
        &self.capabilities
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Ids of the boss bars currently shown through this audience.
    pub fn tracked_boss_bars(&self) -> Vec<BossBarId> {
        self.bridges.lock().keys().copied().collect()
    }

    /// Add a viewer. Returns false if it was already present or the audience
    /// is closed.
    ///
    /// The viewer joins every boss bar already shown to this audience.
    pub fn add_viewer(&self, viewer: V) -> bool {
        if self.is_closed() {
            return false;
        }

        {
            let mut viewers = self.viewers.write();
            // Re-checked under the lock close() drains.
            if self.is_closed() || viewers.contains(&viewer) {
                return false;
            }
            viewers.push(viewer.clone());

            let mut representative = self.representative.write();
            if representative.is_none() {
                *representative = Some(viewer.clone());
            }
        }

        for tracked in self.bridges.lock().values() {
            tracked.bridge.add_viewer(&viewer);
        }

        trace!(?viewer, "Viewer added to audience");
        true
    }

    /// Remove a viewer and unsubscribe it from every tracked boss bar.
    /// Returns false if it was not present.
    pub fn remove_viewer(&self, viewer: &V) -> bool {
        {
            let mut viewers = self.viewers.write();
            let Some(index) = viewers.iter().position(|v| v == viewer) else {
                return false;
            };
            viewers.remove(index);

            let mut representative = self.representative.write();
            if representative.as_ref() == Some(viewer) {
                *representative = viewers.first().cloned();
            }
        }

        for tracked in self.bridges.lock().values() {
            tracked.bridge.remove_viewer(viewer);
        }

        trace!(?viewer, "Viewer removed from audience");
        true
    }

    /// Send a chat line.
    pub fn send_message(&self, line: &ChatLine) -> usize {
        self.dispatch(self.capabilities.chat(), line)
    }

    pub fn send_action_bar(&self, message: impl Into<Component>) -> usize {
        self.dispatch(self.capabilities.action_bar(), &ActionBar(message.into()))
    }

    pub fn show_title(&self, title: &Title) -> usize {
        self.dispatch(self.capabilities.title(), &TitleAction::Show(title.clone()))
    }

    pub fn clear_title(&self) -> usize {
        self.dispatch(self.capabilities.title(), &TitleAction::Clear)
    }

    pub fn reset_title(&self) -> usize {
        self.dispatch(self.capabilities.title(), &TitleAction::Reset)
    }

    pub fn play_sound(&self, sound: &Sound) -> usize {
        self.dispatch(self.capabilities.sound(), &SoundAction::Play(sound.clone()))
    }

    pub fn stop_sound(&self, stop: &SoundStop) -> usize {
        self.dispatch(self.capabilities.sound(), &SoundAction::Stop(stop.clone()))
    }

    pub fn open_book(&self, book: &Book) -> usize {
        self.dispatch(self.capabilities.book(), book)
    }

    pub fn send_player_list_header_and_footer(
        &self,
        header: impl Into<Component>,
        footer: impl Into<Component>,
    ) -> usize {
        let content = TabList {
            header: header.into(),
            footer: footer.into(),
        };
        self.dispatch(self.capabilities.tab_list(), &content)
    }

    /// Render `content` once and hand it to `facet` for every viewer.
    fn dispatch<C: Feature>(&self, facet: Option<&Arc<dyn Dispatch<V, C>>>, content: &C) -> usize {
        if self.is_closed() {
            return 0;
        }
        let Some(facet) = facet else {
            self.diagnostics
                .unsupported(C::KIND, format_args!("Send skipped, no facet resolved"));
            return 0;
        };
        let Some(representative) = self.representative() else {
            return 0;
        };

        let locale = self.locale();
        let rendered = match content.render(self.translator.as_ref(), &locale) {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!(feature = C::KIND.name(), %locale, "Failed to render content: {}", e);
                return 0;
            }
        };

        let viewers = self.viewers();
        facet.dispatch(&representative, &viewers, &rendered)
    }

    /// Show `bar` to every viewer of this audience.
    ///
    /// The first call for a bar creates its bridge, replays the bar's state
    /// into it, and registers it as a listener. Later calls reuse it.
    pub fn show_boss_bar(&self, bar: &Arc<BossBar>) {
        if self.is_closed() {
            return;
        }
        let Some(facet) = self.capabilities.boss_bar() else {
            self.diagnostics.unsupported(
                FeatureKind::BossBar,
                format_args!("Boss bar {} not shown, no facet resolved", bar.id()),
            );
            return;
        };

        let mut bridges = self.bridges.lock();
        if self.is_closed() {
            return;
        }
        let bridge = match bridges.entry(bar.id()) {
            Entry::Occupied(entry) => Arc::clone(&entry.get().bridge),
            Entry::Vacant(entry) => {
                let handle = match catch_unwind(AssertUnwindSafe(|| facet.create_bossbar(&[]))) {
                    Ok(handle) => handle,
                    Err(panic) => {
                        warn!(
                            bar = %bar.id(),
                            facet = Facet::<V>::name(&**facet),
                            "Boss bar creation panicked: {:?}",
                            panic
                        );
                        return;
                    }
                };
                let bridge = Arc::new(BossBarBridge::new(
                    bar.id(),
                    handle,
                    Arc::clone(&self.translator),
                    Arc::clone(&self.locale),
                ));
                let listener: Arc<dyn BossBarListener> = bridge.clone();

                {
                    let _mutation = bar.mutation_guard();
                    bridge.initialize(&bar.state());
                    bar.add_listener(Arc::clone(&listener));
                }

                debug!(bar = %bar.id(), facet = Facet::<V>::name(&**facet), "Boss bar bridge created");
                entry.insert(TrackedBar {
                    bar: Arc::clone(bar),
                    bridge: Arc::clone(&bridge),
                    listener,
                });
                bridge
            }
        };

        for viewer in self.viewers.read().iter() {
            bridge.add_viewer(viewer);
        }
    }

    /// Hide `bar` from every viewer of this audience.
    ///
    /// Once the bridge has no subscribers left it is unregistered and
    /// discarded, so a later show starts from a fresh replay.
    pub fn hide_boss_bar(&self, bar: &BossBar) {
        let mut bridges = self.bridges.lock();
        let Some(tracked) = bridges.get(&bar.id()) else {
            return;
        };

        for viewer in self.viewers.read().iter() {
            tracked.bridge.remove_viewer(viewer);
        }

        if tracked.bridge.is_empty() {
            if let Some(tracked) = bridges.remove(&bar.id()) {
                tracked.detach();
            }
        }
    }

    /// Hide every boss bar, drop every viewer, and disable all sends.
    ///
    /// Calling this again has no further effect.
    #[instrument(name = "audience_close", skip(self))]
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("Audience already closed");
            return;
        }

        let viewers = {
            let mut viewers = self.viewers.write();
            *self.representative.write() = None;
            std::mem::take(&mut *viewers)
        };

        let tracked: Vec<TrackedBar<V>> = self.bridges.lock().drain().map(|(_, t)| t).collect();
        let bars = tracked.len();
        for tracked in tracked {
            for viewer in &viewers {
                tracked.bridge.remove_viewer(viewer);
            }
            tracked.detach();
        }

        debug!(viewers = viewers.len(), bars, "Audience closed");
    }
}

impl<V: Viewer> fmt::Debug for Audience<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Audience")
            .field("viewers", &*self.viewers.read())
            .field("locale", &*self.locale.read())
            .field("capabilities", &self.capabilities)
            .field("boss_bars", &self.bridges.lock().len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{entries, Fixture, FAILING, PANICKING};
    use herald_facet::FacetCatalog;
    use herald_types::{HeraldConfig, TranslationCatalog};
    use std::thread;

    fn audience(fixture: &Fixture, viewers: &[u32]) -> Audience<u32> {
        Audience::builder()
            .viewers(viewers.iter().copied())
            .catalog(fixture.catalog.clone())
            .build()
    }

    #[test]
    fn test_send_reaches_every_viewer() {
        let fixture = Fixture::new();
        let audience = audience(&fixture, &[1, 2, 3]);

        assert_eq!(audience.send_message(&ChatLine::new("hello")), 3);
        assert_eq!(
            entries(&fixture.log, "chat"),
            vec!["chat 1 hello", "chat 2 hello", "chat 3 hello"]
        );
    }

    #[test]
    fn test_disabled_feature_is_noop() {
        let fixture = Fixture::new();
        let audience = audience(&fixture, &[1]);

        assert!(!audience.capabilities().is_enabled(FeatureKind::Sound));
        assert_eq!(audience.play_sound(&Sound::new("entity.player.levelup", Default::default())), 0);
        assert_eq!(audience.send_action_bar("hp"), 0);
        assert!(fixture.log.lock().is_empty());
    }

    #[test]
    fn test_no_chat_candidates_never_invokes_facets() {
        let audience: Audience<u32> = Audience::builder()
            .viewers([1, 2])
            .catalog(Arc::new(FacetCatalog::empty()))
            .build();

        assert_eq!(audience.send_message(&ChatLine::new("ignored")), 0);
        for kind in FeatureKind::ALL {
            assert!(!audience.capabilities().is_enabled(kind));
        }
    }

    #[test]
    fn test_zero_viewers_stays_disabled() {
        let fixture = Fixture::new();
        let audience = audience(&fixture, &[]);
        audience.add_viewer(4);

        assert_eq!(audience.representative(), Some(4));
        assert_eq!(audience.send_message(&ChatLine::new("late")), 0);
        assert!(entries(&fixture.log, "chat").is_empty());
    }

    #[test]
    fn test_delivery_failure_skips_only_that_viewer() {
        let fixture = Fixture::new();
        let audience = audience(&fixture, &[1, FAILING, PANICKING, 2]);

        assert_eq!(audience.send_message(&ChatLine::new("hi")), 2);
        assert_eq!(entries(&fixture.log, "chat"), vec!["chat 1 hi", "chat 2 hi"]);
    }

    #[test]
    fn test_render_failure_does_not_block_other_features() {
        let fixture = Fixture::new();
        let catalog = TranslationCatalog::default();
        catalog.register("broken", Locale::default(), "needs {0}");
        let audience = Audience::builder()
            .viewer(1)
            .catalog(fixture.catalog.clone())
            .translator(Arc::new(catalog))
            .build();

        assert_eq!(audience.send_message(&ChatLine::new(Component::translatable("broken"))), 0);
        assert_eq!(audience.show_title(&Title::new("fine", "")), 1);
        assert_eq!(entries(&fixture.log, "title"), vec!["title 1 show fine"]);
    }

    #[test]
    fn test_sends_use_audience_locale() {
        let fixture = Fixture::new();
        let catalog = TranslationCatalog::default();
        catalog.register("greeting", Locale::parse("en_US"), "Hello");
        catalog.register("greeting", Locale::parse("fr_FR"), "Bonjour");
        let audience = Audience::builder()
            .viewer(1)
            .catalog(fixture.catalog.clone())
            .translator(Arc::new(catalog))
            .build();

        audience.send_message(&ChatLine::new(Component::translatable("greeting")));
        audience.change_locale(Locale::parse("fr-fr"));
        audience.send_message(&ChatLine::new(Component::translatable("greeting")));

        assert_eq!(entries(&fixture.log, "chat"), vec!["chat 1 Hello", "chat 1 Bonjour"]);
    }

    #[test]
    fn test_remove_representative_keeps_capabilities() {
        let fixture = Fixture::new();
        let audience = audience(&fixture, &[1, 2]);

        assert!(audience.remove_viewer(&1));
        assert!(!audience.remove_viewer(&1));
        assert_eq!(audience.representative(), Some(2));
        assert!(audience.capabilities().is_enabled(FeatureKind::Chat));
        assert_eq!(audience.send_message(&ChatLine::new("still here")), 1);
    }

    #[test]
    fn test_title_actions() {
        let fixture = Fixture::new();
        let audience = audience(&fixture, &[1]);

        audience.show_title(&Title::new("Welcome", "to the server"));
        audience.clear_title();
        audience.reset_title();

        assert_eq!(
            entries(&fixture.log, "title"),
            vec!["title 1 show Welcome", "title 1 clear", "title 1 reset"]
        );
    }

    #[test]
    fn test_show_boss_bar_replays_state() {
        let fixture = Fixture::new();
        let audience = audience(&fixture, &[1, 2]);
        let bar = Arc::new(BossBar::simple("Raid"));
        bar.set_percent(0.5).unwrap();

        audience.show_boss_bar(&bar);

        assert_eq!(fixture.bars_created(), 1);
        assert_eq!(bar.listener_count(), 1);
        assert_eq!(
            entries(&fixture.log, "bar show"),
            vec!["bar show 1 Raid 0.5", "bar show 2 Raid 0.5"]
        );
        assert_eq!(audience.tracked_boss_bars(), vec![bar.id()]);
    }

    #[test]
    fn test_show_hide_show_creates_fresh_bridge() {
        let fixture = Fixture::new();
        let audience = audience(&fixture, &[1, 2]);
        let bar = Arc::new(BossBar::simple("Raid"));

        audience.show_boss_bar(&bar);
        audience.hide_boss_bar(&bar);
        assert_eq!(bar.listener_count(), 0);
        assert!(audience.tracked_boss_bars().is_empty());
        assert_eq!(entries(&fixture.log, "bar hide"), vec!["bar hide 1", "bar hide 2"]);

        bar.set_name("Raid II");
        audience.show_boss_bar(&bar);

        assert_eq!(fixture.bars_created(), 2);
        assert_eq!(bar.listener_count(), 1);
        let shows = entries(&fixture.log, "bar show");
        assert_eq!(&shows[2..], ["bar show 1 Raid II 1", "bar show 2 Raid II 1"]);
    }

    #[test]
    fn test_bar_changes_reach_subscribers() {
        let fixture = Fixture::new();
        let audience = audience(&fixture, &[1]);
        let bar = Arc::new(BossBar::simple("Raid"));
        audience.show_boss_bar(&bar);

        bar.set_percent(0.75).unwrap();
        audience.add_viewer(2);
        bar.set_percent(0.25).unwrap();

        assert_eq!(
            entries(&fixture.log, "bar update"),
            vec![
                "bar update 1 Percent(0.75)",
                "bar update 1 Percent(0.25)",
                "bar update 2 Percent(0.25)",
            ]
        );
        assert!(entries(&fixture.log, "bar show").contains(&"bar show 2 Raid 0.75".to_string()));
    }

    #[test]
    fn test_remove_viewer_cascades_to_every_bar() {
        let fixture = Fixture::new();
        let audience = audience(&fixture, &[1, 2]);
        let raid = Arc::new(BossBar::simple("Raid"));
        let storm = Arc::new(BossBar::simple("Storm"));
        audience.show_boss_bar(&raid);
        audience.show_boss_bar(&storm);

        audience.remove_viewer(&2);
        raid.set_percent(0.5).unwrap();
        storm.set_percent(0.5).unwrap();

        assert_eq!(entries(&fixture.log, "bar hide"), vec!["bar hide 2", "bar hide 2"]);
        let updates = entries(&fixture.log, "bar update");
        assert_eq!(updates.len(), 2);
        assert!(updates.iter().all(|line| line.starts_with("bar update 1 ")));
    }

    #[test]
    fn test_close_is_idempotent() {
        let fixture = Fixture::new();
        let audience = audience(&fixture, &[1, 2]);
        let bar = Arc::new(BossBar::simple("Raid"));
        audience.show_boss_bar(&bar);

        audience.close();
        let after_first = fixture.log.lock().clone();
        audience.close();

        assert!(audience.is_closed());
        assert!(audience.is_empty());
        assert_eq!(audience.representative(), None);
        assert_eq!(bar.listener_count(), 0);
        assert_eq!(*fixture.log.lock(), after_first);
        assert_eq!(audience.send_message(&ChatLine::new("gone")), 0);
        assert!(!audience.add_viewer(3));
        audience.show_boss_bar(&bar);
        assert_eq!(bar.listener_count(), 0);
    }

    #[test]
    fn test_close_racing_show_and_add_leaves_nothing_attached() {
        for _ in 0..200 {
            let fixture = Fixture::new();
            let audience = Arc::new(audience(&fixture, &[1]));
            let bars: Vec<_> = (0..4)
                .map(|i| Arc::new(BossBar::simple(format!("Bar {i}"))))
                .collect();
            let barrier = Arc::new(std::sync::Barrier::new(3));

            let shower = {
                let audience = Arc::clone(&audience);
                let bars = bars.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for bar in &bars {
                        audience.show_boss_bar(bar);
                    }
                })
            };
            let adder = {
                let audience = Arc::clone(&audience);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for viewer in 2..6 {
                        audience.add_viewer(viewer);
                    }
                })
            };
            barrier.wait();
            audience.close();
            shower.join().unwrap();
            adder.join().unwrap();

            assert!(audience.is_empty());
            assert_eq!(audience.representative(), None);
            assert!(audience.tracked_boss_bars().is_empty());
            for bar in &bars {
                assert_eq!(bar.listener_count(), 0);
            }
        }
    }

    #[test]
    fn test_concurrent_show_creates_one_bridge() {
        let fixture = Fixture::new();
        let audience = Arc::new(audience(&fixture, &[1, 2, 3]));
        let bar = Arc::new(BossBar::simple("Raid"));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let audience = Arc::clone(&audience);
                let bar = Arc::clone(&bar);
                thread::spawn(move || audience.show_boss_bar(&bar))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(fixture.bars_created(), 1);
        assert_eq!(bar.listener_count(), 1);
        assert_eq!(entries(&fixture.log, "bar show").len(), 3);
    }

    #[test]
    fn test_concurrent_mutation_during_show_is_not_lost() {
        let fixture = Fixture::new();
        let audience = Arc::new(audience(&fixture, &[1]));
        let bar = Arc::new(BossBar::simple("Raid"));

        let mutator = {
            let bar = Arc::clone(&bar);
            thread::spawn(move || {
                for step in 1..=20 {
                    bar.set_percent(step as f32 / 20.0).unwrap();
                }
            })
        };
        audience.show_boss_bar(&bar);
        mutator.join().unwrap();

        // Whatever was replayed, the final update must leave the viewer at 1.0.
        let last = entries(&fixture.log, "bar")
            .into_iter()
            .filter(|line| line.starts_with("bar show") || line.starts_with("bar update"))
            .last()
            .unwrap();
        assert!(last == "bar show 1 Raid 1" || last == "bar update 1 Percent(1.0)");
    }

    #[test]
    fn test_debug_config_is_accepted() {
        let fixture = Fixture::new();
        let config = HeraldConfig {
            debug: true,
            ..Default::default()
        };
        let audience = Audience::builder()
            .viewer(1)
            .catalog(fixture.catalog.clone())
            .config(config)
            .build();

        assert_eq!(audience.locale(), Locale::default());
        assert_eq!(audience.send_message(&ChatLine::system("debug")), 1);
    }
}

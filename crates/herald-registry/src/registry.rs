//! The audience registry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use herald_audience::Audience;
use herald_facet::Viewer;
use herald_types::{HeraldConfig, Locale};

use crate::{AudienceFactory, LiveView, PlayerId, RegistryEvent, ViewerClassifier};

/// A registered viewer.
pub(crate) struct Tracked<V> {
    pub(crate) audience: Arc<Audience<V>>,
    pub(crate) player: Option<PlayerId>,
    pub(crate) console: bool,
}

/// The registry's viewer map, shared with its live views.
pub(crate) type Backing<V> = Arc<RwLock<HashMap<V, Tracked<V>>>>;

/// Keyed view caches. Entries are never evicted.
struct ViewCaches<V> {
    permission: HashMap<String, LiveView<V>>,
    world: HashMap<String, LiveView<V>>,
    server: HashMap<String, LiveView<V>>,
}

/// Tracks every viewer the host reports, each with its own audience.
///
/// A viewer maps to at most one audience. Unregistering a viewer closes its
/// audience.
pub struct AudienceRegistry<V> {
    classifier: Arc<dyn ViewerClassifier<V>>,
    factory: Arc<dyn AudienceFactory<V>>,
    config: HeraldConfig,
    viewers: Backing<V>,
    players: RwLock<HashMap<PlayerId, Arc<Audience<V>>>>,
    caches: Mutex<ViewCaches<V>>,
    events: Option<Sender<RegistryEvent<V>>>,
    closed: AtomicBool,
}

impl<V: Viewer> AudienceRegistry<V> {
    pub fn new(
        classifier: Arc<dyn ViewerClassifier<V>>,
        factory: Arc<dyn AudienceFactory<V>>,
        config: HeraldConfig,
    ) -> Self {
        Self {
            classifier,
            factory,
            config,
            viewers: Arc::new(RwLock::new(HashMap::new())),
            players: RwLock::new(HashMap::new()),
            caches: Mutex::new(ViewCaches {
                permission: HashMap::new(),
                world: HashMap::new(),
                server: HashMap::new(),
            }),
            events: None,
            closed: AtomicBool::new(false),
        }
    }

    /// Emit [`RegistryEvent`]s on `events`.
    pub fn with_events(mut self, events: Sender<RegistryEvent<V>>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn config(&self) -> &HeraldConfig {
        &self.config
    }

    /// Register a viewer. Returns false if the registry is closed or the
    /// viewer is already tracked.
    #[instrument(name = "registry_add_viewer", skip(self))]
    pub fn add_viewer(&self, viewer: V) -> bool {
        if self.is_closed() {
            debug!("Registry closed, ignoring viewer");
            return false;
        }
        if self.viewers.read().contains_key(&viewer) {
            return false;
        }

        let player = self.classifier.player_id(&viewer);
        let console = self.classifier.is_console(&viewer);
        let locale = self
            .classifier
            .locale(&viewer)
            .unwrap_or_else(|| self.config.default_locale.clone());
        let audience = self.factory.create_audience(viewer.clone(), locale);

        let inserted = {
            let mut viewers = self.viewers.write();
            if self.is_closed() || viewers.contains_key(&viewer) {
                false
            } else {
                viewers.insert(
                    viewer.clone(),
                    Tracked {
                        audience: Arc::clone(&audience),
                        player,
                        console,
                    },
                );
                if let Some(id) = player {
                    self.players.write().insert(id, Arc::clone(&audience));
                }
                true
            }
        };

        if !inserted {
            // Lost a race with another registration or with close.
            audience.close();
            return false;
        }

        info!(?player, console, "Viewer registered");
        self.send_event(RegistryEvent::ViewerAdded {
            viewer,
            player,
            console,
        });
        true
    }

    /// Unregister a viewer and close its audience. Returns false if the
    /// viewer was not tracked.
    #[instrument(name = "registry_remove_viewer", skip(self))]
    pub fn remove_viewer(&self, viewer: &V) -> bool {
        let Some(tracked) = self.viewers.write().remove(viewer) else {
            return false;
        };

        if let Some(id) = tracked.player {
            let mut players = self.players.write();
            if players
                .get(&id)
                .is_some_and(|audience| Arc::ptr_eq(audience, &tracked.audience))
            {
                players.remove(&id);
            }
        }

        tracked.audience.close();
        info!(player = ?tracked.player, "Viewer unregistered");
        self.send_event(RegistryEvent::ViewerRemoved {
            viewer: viewer.clone(),
        });
        true
    }

    /// Update a tracked viewer's locale. Capabilities are not re-resolved.
    pub fn change_viewer(&self, viewer: &V, locale: Locale) -> bool {
        let Some(audience) = self.audience(viewer) else {
            return false;
        };

        audience.change_locale(locale.clone());
        self.send_event(RegistryEvent::LocaleChanged {
            viewer: viewer.clone(),
            locale,
        });
        true
    }

    /// A live view of the viewers matching `predicate`.
    pub fn filter(&self, predicate: impl Fn(&V) -> bool + Send + Sync + 'static) -> LiveView<V> {
        LiveView::new(Arc::clone(&self.viewers), Arc::new(predicate))
    }

    /// Every tracked viewer.
    pub fn all(&self) -> LiveView<V> {
        self.filter(|_| true)
    }

    /// Console viewers, as classified at registration.
    pub fn console(&self) -> LiveView<V> {
        self.indexed(|tracked| tracked.console)
    }

    /// Viewers with a player id, as classified at registration.
    pub fn players(&self) -> LiveView<V> {
        self.indexed(|tracked| tracked.player.is_some())
    }

    fn indexed(&self, test: fn(&Tracked<V>) -> bool) -> LiveView<V> {
        let backing = Arc::clone(&self.viewers);
        self.filter(move |viewer| backing.read().get(viewer).is_some_and(test))
    }

    /// Viewers holding permission `node`. Cached per node.
    pub fn permission(&self, node: &str) -> LiveView<V> {
        let mut caches = self.caches.lock();
        self.cached(&mut caches.permission, node, |classifier, viewer, node| {
            classifier.has_permission(viewer, node)
        })
    }

    /// Viewers in world `world`. Cached per world.
    pub fn world(&self, world: &str) -> LiveView<V> {
        let mut caches = self.caches.lock();
        self.cached(&mut caches.world, world, |classifier, viewer, world| {
            classifier.is_in_world(viewer, world)
        })
    }

    /// Viewers on server `server`. Cached per server.
    pub fn server(&self, server: &str) -> LiveView<V> {
        let mut caches = self.caches.lock();
        self.cached(&mut caches.server, server, |classifier, viewer, server| {
            classifier.is_on_server(viewer, server)
        })
    }

    fn cached(
        &self,
        cache: &mut HashMap<String, LiveView<V>>,
        key: &str,
        test: fn(&dyn ViewerClassifier<V>, &V, &str) -> bool,
    ) -> LiveView<V> {
        if let Some(view) = cache.get(key) {
            return view.clone();
        }

        let classifier = Arc::clone(&self.classifier);
        let owned = key.to_string();
        let view = self.filter(move |viewer| test(&*classifier, viewer, &owned));
        cache.insert(key.to_string(), view.clone());
        view
    }

    /// Number of cached permission, world, and server views.
    pub fn cached_views(&self) -> usize {
        let caches = self.caches.lock();
        caches.permission.len() + caches.world.len() + caches.server.len()
    }

    /// The audience of the player with `id`.
    pub fn player(&self, id: PlayerId) -> Option<Arc<Audience<V>>> {
        self.players.read().get(&id).cloned()
    }

    /// The audience of a tracked viewer.
    pub fn audience(&self, viewer: &V) -> Option<Arc<Audience<V>>> {
        self.viewers
            .read()
            .get(viewer)
            .map(|tracked| Arc::clone(&tracked.audience))
    }

    pub fn contains(&self, viewer: &V) -> bool {
        self.viewers.read().contains_key(viewer)
    }

    pub fn len(&self) -> usize {
        self.viewers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.viewers.read().is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Unregister every viewer and refuse new ones.
    ///
    /// Idempotent.
    #[instrument(name = "registry_close", skip(self))]
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("Registry already closed");
            return;
        }

        let drained: Vec<(V, Tracked<V>)> = self.viewers.write().drain().collect();
        self.players.write().clear();

        let count = drained.len();
        for (viewer, tracked) in drained {
            tracked.audience.close();
            self.send_event(RegistryEvent::ViewerRemoved { viewer });
        }

        self.send_event(RegistryEvent::Closed);
        info!(viewers = count, "Audience registry closed");
    }

    fn send_event(&self, event: RegistryEvent<V>) {
        if let Some(events) = &self.events {
            if let Err(e) = events.try_send(event) {
                warn!("Failed to send registry event: {}", e);
            }
        }
    }
}

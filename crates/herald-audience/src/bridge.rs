//! Listener that forwards boss bar changes into a facet handle.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{trace, warn};

use herald_facet::{BossBarHandle, FacetResult, Viewer};
use herald_types::{
    BossBar, BossBarColor, BossBarFlags, BossBarId, BossBarListener, BossBarOverlay, BossBarState,
    Component, Locale, Translator,
};

/// Connects one boss bar to one audience.
///
/// The wrapped handle owns the native broadcast; the bridge translates the
/// bar name for the audience locale and contains every handle failure.
pub struct BossBarBridge<V> {
    bar: BossBarId,
    handle: Mutex<Box<dyn BossBarHandle<V>>>,
    translator: Arc<dyn Translator>,
    locale: Arc<RwLock<Locale>>,
}

impl<V: Viewer> BossBarBridge<V> {
    pub(crate) fn new(
        bar: BossBarId,
        handle: Box<dyn BossBarHandle<V>>,
        translator: Arc<dyn Translator>,
        locale: Arc<RwLock<Locale>>,
    ) -> Self {
        Self {
            bar,
            handle: Mutex::new(handle),
            translator,
            locale,
        }
    }

    /// Id of the bar this bridge listens to.
    pub fn bar(&self) -> BossBarId {
        self.bar
    }

    /// Push the full state as individual changes.
    ///
    /// Order is name, percent, color, overlay, flags. Flags arrive as
    /// `added = current`, `removed = empty`.
    pub fn initialize(&self, state: &BossBarState) {
        trace!(bar = %self.bar, "Replaying boss bar state");
        if let Some(name) = self.translate(&state.name) {
            self.forward("name", |handle| handle.name_changed(&name));
        }
        self.forward("percent", |handle| handle.percent_changed(state.percent));
        self.forward("color", |handle| handle.color_changed(state.color));
        self.forward("overlay", |handle| handle.overlay_changed(state.overlay));
        self.forward("flags", |handle| {
            handle.flags_changed(state.flags, BossBarFlags::empty())
        });
    }

    pub fn add_viewer(&self, viewer: &V) {
        self.forward("add viewer", |handle| handle.add_viewer(viewer));
    }

    pub fn remove_viewer(&self, viewer: &V) {
        self.forward("remove viewer", |handle| handle.remove_viewer(viewer));
    }

    pub fn is_empty(&self) -> bool {
        let handle = self.handle.lock();
        // A handle that cannot answer is treated as empty so it gets torn down.
        catch_unwind(AssertUnwindSafe(|| handle.is_empty())).unwrap_or(true)
    }

    pub fn close(&self) {
        self.forward("close", |handle| {
            handle.close();
            Ok(())
        });
    }

    fn translate(&self, name: &Component) -> Option<Component> {
        let locale = self.locale.read().clone();
        match self.translator.render(name, &locale) {
            Ok(rendered) => Some(rendered),
            Err(e) => {
                warn!(bar = %self.bar, %locale, "Failed to render boss bar name: {}", e);
                None
            }
        }
    }

    fn forward(
        &self,
        change: &'static str,
        f: impl FnOnce(&mut dyn BossBarHandle<V>) -> FacetResult<()>,
    ) {
        let mut handle = self.handle.lock();
        match catch_unwind(AssertUnwindSafe(|| f(handle.as_mut()))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(bar = %self.bar, change, "Boss bar handle failed: {}", e),
            Err(panic) => warn!(bar = %self.bar, change, "Boss bar handle panicked: {:?}", panic),
        }
    }
}

impl<V: Viewer> BossBarListener for BossBarBridge<V> {
    fn name_changed(&self, _bar: &BossBar, _old: &Component, new: &Component) {
        if let Some(name) = self.translate(new) {
            self.forward("name", |handle| handle.name_changed(&name));
        }
    }

    fn percent_changed(&self, _bar: &BossBar, _old: f32, new: f32) {
        self.forward("percent", |handle| handle.percent_changed(new));
    }

    fn color_changed(&self, _bar: &BossBar, _old: BossBarColor, new: BossBarColor) {
        self.forward("color", |handle| handle.color_changed(new));
    }

    fn overlay_changed(&self, _bar: &BossBar, _old: BossBarOverlay, new: BossBarOverlay) {
        self.forward("overlay", |handle| handle.overlay_changed(new));
    }

    fn flags_changed(&self, _bar: &BossBar, added: BossBarFlags, removed: BossBarFlags) {
        self.forward("flags", |handle| handle.flags_changed(added, removed));
    }
}

impl<V> fmt::Debug for BossBarBridge<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BossBarBridge").field("bar", &self.bar).finish()
    }
}

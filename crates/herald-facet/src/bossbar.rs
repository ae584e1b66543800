//! Boss bar facets.
//!
//! A [`BossBarFacet`] creates one [`BossBarHandle`] per (audience, bar) pair.
//! The handle owns the broadcast state for its subscribed viewers and turns
//! attribute changes into native updates.
//!
//! Hosts that update viewers one at a time can implement [`BossBarSink`]
//! and wrap it in [`PerViewerBossBar`], which tracks subscribers and
//! isolates per-viewer failures.

use std::collections::HashSet;

use tracing::{debug, warn};

use herald_types::{BossBarColor, BossBarFlags, BossBarOverlay, Component};

use crate::{Facet, FacetResult, Viewer};

/// Facet that creates boss bar broadcasts.
pub trait BossBarFacet<V>: Facet<V> {
    /// Create a broadcast initially shown to `viewers`.
    fn create_bossbar(&self, viewers: &[V]) -> Box<dyn BossBarHandle<V>>;
}

/// One boss bar broadcast for a set of viewers.
///
/// Change methods receive the bar's state one attribute at a time, in the
/// order the bar raised them. Errors are logged by the caller.
pub trait BossBarHandle<V>: Send {
    fn name_changed(&mut self, name: &Component) -> FacetResult<()>;

    fn percent_changed(&mut self, percent: f32) -> FacetResult<()>;

    fn color_changed(&mut self, color: BossBarColor) -> FacetResult<()>;

    fn overlay_changed(&mut self, overlay: BossBarOverlay) -> FacetResult<()>;

    fn flags_changed(&mut self, added: BossBarFlags, removed: BossBarFlags) -> FacetResult<()>;

    fn add_viewer(&mut self, viewer: &V) -> FacetResult<()>;

    fn remove_viewer(&mut self, viewer: &V) -> FacetResult<()>;

    /// True when no viewer is subscribed.
    fn is_empty(&self) -> bool;

    /// Hide the bar from every remaining viewer and release native resources.
    fn close(&mut self);
}

/// The attributes a viewer is currently shown.
#[derive(Debug, Clone, PartialEq)]
pub struct BarView {
    pub name: Component,
    pub percent: f32,
    pub color: BossBarColor,
    pub overlay: BossBarOverlay,
    pub flags: BossBarFlags,
}

impl Default for BarView {
    fn default() -> Self {
        Self {
            name: Component::empty(),
            percent: 1.0,
            color: BossBarColor::default(),
            overlay: BossBarOverlay::default(),
            flags: BossBarFlags::empty(),
        }
    }
}

/// A single attribute update.
#[derive(Debug, Clone, PartialEq)]
pub enum BossBarUpdate {
    Name(Component),
    Percent(f32),
    Color(BossBarColor),
    Overlay(BossBarOverlay),
    Flags(BossBarFlags),
}

/// Per-viewer native operations.
pub trait BossBarSink<V>: Send {
    /// Show the bar to a viewer that was not showing it.
    fn show(&mut self, viewer: &V, view: &BarView) -> FacetResult<()>;

    /// Push one attribute change to a viewer already showing the bar.
    fn update(&mut self, viewer: &V, update: &BossBarUpdate) -> FacetResult<()>;

    /// Remove the bar from a viewer.
    fn hide(&mut self, viewer: &V) -> FacetResult<()>;
}

/// A [`BossBarHandle`] that fans each change out to its viewers one by one.
pub struct PerViewerBossBar<V, S> {
    sink: S,
    view: BarView,
    viewers: HashSet<V>,
}

impl<V: Viewer, S: BossBarSink<V>> PerViewerBossBar<V, S> {
    pub fn new(sink: S, viewers: &[V]) -> Self {
        let mut bar = Self {
            sink,
            view: BarView::default(),
            viewers: HashSet::new(),
        };
        for viewer in viewers {
            // Failures are already logged; the viewer simply isn't subscribed.
            let _ = bar.add_viewer(viewer);
        }
        bar
    }

    pub fn view(&self) -> &BarView {
        &self.view
    }

    pub fn viewers(&self) -> impl Iterator<Item = &V> {
        self.viewers.iter()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn broadcast(&mut self, update: BossBarUpdate) -> FacetResult<()> {
        let mut first_error = None;
        for viewer in &self.viewers {
            if let Err(e) = self.sink.update(viewer, &update) {
                debug!(?viewer, ?update, "Boss bar update failed: {}", e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl<V: Viewer, S: BossBarSink<V>> BossBarHandle<V> for PerViewerBossBar<V, S> {
    fn name_changed(&mut self, name: &Component) -> FacetResult<()> {
        self.view.name = name.clone();
        self.broadcast(BossBarUpdate::Name(name.clone()))
    }

    fn percent_changed(&mut self, percent: f32) -> FacetResult<()> {
        self.view.percent = percent;
        self.broadcast(BossBarUpdate::Percent(percent))
    }

    fn color_changed(&mut self, color: BossBarColor) -> FacetResult<()> {
        self.view.color = color;
        self.broadcast(BossBarUpdate::Color(color))
    }

    fn overlay_changed(&mut self, overlay: BossBarOverlay) -> FacetResult<()> {
        self.view.overlay = overlay;
        self.broadcast(BossBarUpdate::Overlay(overlay))
    }

    fn flags_changed(&mut self, added: BossBarFlags, removed: BossBarFlags) -> FacetResult<()> {
        let bits = BossBarFlags::apply_bits(self.view.flags.bits(), added, removed);
        self.view.flags = BossBarFlags::from_bits_truncate(bits);
        self.broadcast(BossBarUpdate::Flags(self.view.flags))
    }

    fn add_viewer(&mut self, viewer: &V) -> FacetResult<()> {
        if self.viewers.contains(viewer) {
            return Ok(());
        }
        if let Err(e) = self.sink.show(viewer, &self.view) {
            debug!(?viewer, "Failed to show boss bar: {}", e);
            return Err(e);
        }
        self.viewers.insert(viewer.clone());
        Ok(())
    }

    fn remove_viewer(&mut self, viewer: &V) -> FacetResult<()> {
        if !self.viewers.remove(viewer) {
            return Ok(());
        }
        self.sink.hide(viewer)
    }

    fn is_empty(&self) -> bool {
        self.viewers.is_empty()
    }

    fn close(&mut self) {
        for viewer in self.viewers.drain() {
            if let Err(e) = self.sink.hide(&viewer) {
                warn!(?viewer, "Failed to hide boss bar on close: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FacetError;
    use herald_types::BossBarFlag;

    #[derive(Default)]
    struct RecordingSink {
        log: Vec<String>,
        broken: Option<u32>,
    }

    impl BossBarSink<u32> for RecordingSink {
        fn show(&mut self, viewer: &u32, view: &BarView) -> FacetResult<()> {
            self.log.push(format!("show {} {}", viewer, view.name.plain_text()));
            Ok(())
        }

        fn update(&mut self, viewer: &u32, update: &BossBarUpdate) -> FacetResult<()> {
            if Some(*viewer) == self.broken {
                return Err(FacetError::Disconnected);
            }
            self.log.push(format!("update {} {:?}", viewer, update));
            Ok(())
        }

        fn hide(&mut self, viewer: &u32) -> FacetResult<()> {
            self.log.push(format!("hide {}", viewer));
            Ok(())
        }
    }

    #[test]
    fn test_viewers_join_with_current_view() {
        let mut bar = PerViewerBossBar::<u32, _>::new(RecordingSink::default(), &[]);
        bar.name_changed(&Component::text("Raid")).unwrap();
        bar.add_viewer(&1).unwrap();
        bar.add_viewer(&1).unwrap();

        assert_eq!(bar.sink().log, vec!["show 1 Raid".to_string()]);
        assert!(!bar.is_empty());
    }

    #[test]
    fn test_flags_are_applied_as_delta() {
        let mut bar = PerViewerBossBar::new(RecordingSink::default(), &[1]);
        bar.flags_changed(BossBarFlags::all(), BossBarFlags::empty()).unwrap();
        bar.flags_changed(BossBarFlags::empty(), BossBarFlag::PlayBossMusic.into())
            .unwrap();

        assert_eq!(bar.view().flags.bits(), 0x5);
    }

    #[test]
    fn test_failing_viewer_does_not_block_others() {
        let sink = RecordingSink {
            broken: Some(2),
            ..Default::default()
        };
        let mut bar = PerViewerBossBar::new(sink, &[1, 2, 3]);

        assert!(bar.percent_changed(0.5).is_err());
        let updates = bar
            .sink()
            .log
            .iter()
            .filter(|line| line.starts_with("update"))
            .count();
        assert_eq!(updates, 2);
    }

    #[test]
    fn test_close_hides_everyone() {
        let mut bar = PerViewerBossBar::new(RecordingSink::default(), &[1, 2]);
        bar.close();

        assert!(bar.is_empty());
        let hides = bar
            .sink()
            .log
            .iter()
            .filter(|line| line.starts_with("hide"))
            .count();
        assert_eq!(hides, 2);
    }

    #[test]
    fn test_remove_unknown_viewer_is_noop() {
        let mut bar = PerViewerBossBar::new(RecordingSink::default(), &[1]);
        bar.remove_viewer(&7).unwrap();
        bar.remove_viewer(&1).unwrap();

        assert!(bar.is_empty());
        assert_eq!(bar.sink().log.last().map(String::as_str), Some("hide 1"));
    }
}

//! Live filtered views over the registry.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::warn;

use herald_audience::Audience;
use herald_facet::Viewer;
use herald_types::{Book, BossBar, ChatLine, Component, Sound, SoundStop, Title};

use crate::registry::Backing;

type Predicate<V> = Arc<dyn Fn(&V) -> bool + Send + Sync>;

/// The audiences whose viewer matches a predicate.
///
/// Nothing is captured when the view is created: every traversal re-reads
/// the registry and re-evaluates the predicate, so a view obtained once
/// keeps reflecting later registrations and removals. Each traversal works
/// on a snapshot taken at its start.
pub struct LiveView<V> {
    backing: Backing<V>,
    predicate: Predicate<V>,
}

impl<V: Viewer> LiveView<V> {
    pub(crate) fn new(backing: Backing<V>, predicate: Predicate<V>) -> Self {
        Self { backing, predicate }
    }

    fn matches(&self, viewer: &V) -> bool {
        match catch_unwind(AssertUnwindSafe(|| (self.predicate)(viewer))) {
            Ok(matches) => matches,
            Err(panic) => {
                warn!(?viewer, "View predicate panicked: {:?}", panic);
                false
            }
        }
    }

    fn matching(&self) -> Vec<(V, Arc<Audience<V>>)> {
        let snapshot: Vec<(V, Arc<Audience<V>>)> = self
            .backing
            .read()
            .iter()
            .map(|(viewer, tracked)| (viewer.clone(), Arc::clone(&tracked.audience)))
            .collect();

        snapshot
            .into_iter()
            .filter(|(viewer, _)| self.matches(viewer))
            .collect()
    }

    /// Audiences matching right now.
    pub fn audiences(&self) -> Vec<Arc<Audience<V>>> {
        self.matching().into_iter().map(|(_, audience)| audience).collect()
    }

    /// Viewers matching right now.
    pub fn viewers(&self) -> Vec<V> {
        self.matching().into_iter().map(|(viewer, _)| viewer).collect()
    }

    pub fn len(&self) -> usize {
        self.matching().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if `viewer` is registered and matches.
    pub fn contains(&self, viewer: &V) -> bool {
        let tracked = self.backing.read().contains_key(viewer);
        tracked && self.matches(viewer)
    }

    fn sum(&self, f: impl Fn(&Audience<V>) -> usize) -> usize {
        self.audiences().iter().map(|audience| f(audience)).sum()
    }

    pub fn send_message(&self, line: &ChatLine) -> usize {
        self.sum(|audience| audience.send_message(line))
    }

    pub fn send_action_bar(&self, message: impl Into<Component>) -> usize {
        let message = message.into();
        self.sum(|audience| audience.send_action_bar(message.clone()))
    }

    pub fn show_title(&self, title: &Title) -> usize {
        self.sum(|audience| audience.show_title(title))
    }

    pub fn clear_title(&self) -> usize {
        self.sum(|audience| audience.clear_title())
    }

    pub fn reset_title(&self) -> usize {
        self.sum(|audience| audience.reset_title())
    }

    pub fn play_sound(&self, sound: &Sound) -> usize {
        self.sum(|audience| audience.play_sound(sound))
    }

    pub fn stop_sound(&self, stop: &SoundStop) -> usize {
        self.sum(|audience| audience.stop_sound(stop))
    }

    pub fn open_book(&self, book: &Book) -> usize {
        self.sum(|audience| audience.open_book(book))
    }

    pub fn send_player_list_header_and_footer(
        &self,
        header: impl Into<Component>,
        footer: impl Into<Component>,
    ) -> usize {
        let (header, footer) = (header.into(), footer.into());
        self.sum(|audience| {
            audience.send_player_list_header_and_footer(header.clone(), footer.clone())
        })
    }

    pub fn show_boss_bar(&self, bar: &Arc<BossBar>) {
        for audience in self.audiences() {
            audience.show_boss_bar(bar);
        }
    }

    pub fn hide_boss_bar(&self, bar: &BossBar) {
        for audience in self.audiences() {
            audience.hide_boss_bar(bar);
        }
    }
}

impl<V> Clone for LiveView<V> {
    fn clone(&self) -> Self {
        Self {
            backing: Arc::clone(&self.backing),
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<V: Viewer> IntoIterator for &LiveView<V> {
    type Item = Arc<Audience<V>>;
    type IntoIter = std::vec::IntoIter<Arc<Audience<V>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.audiences().into_iter()
    }
}

impl<V> fmt::Debug for LiveView<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveView")
            .field("tracked", &self.backing.read().len())
            .finish_non_exhaustive()
    }
}

//! Registry change notifications.

use crossbeam_channel::{Receiver, Sender};

use herald_types::{Locale, DEFAULT_EVENT_CHANNEL_CAPACITY};

use crate::PlayerId;

/// Changes to the set of tracked viewers.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryEvent<V> {
    /// A viewer was registered and given an audience.
    ViewerAdded {
        viewer: V,
        player: Option<PlayerId>,
        console: bool,
    },

    /// A viewer was unregistered and its audience closed.
    ViewerRemoved { viewer: V },

    /// A viewer's locale changed.
    LocaleChanged { viewer: V, locale: Locale },

    /// The registry was closed.
    Closed,
}

/// Creates a bounded event channel.
///
/// A zero capacity falls back to the default.
pub fn event_channel<V>(capacity: usize) -> (Sender<RegistryEvent<V>>, Receiver<RegistryEvent<V>>) {
    let capacity = if capacity == 0 {
        DEFAULT_EVENT_CHANNEL_CAPACITY
    } else {
        capacity
    };
    crossbeam_channel::bounded(capacity)
}

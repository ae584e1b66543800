//! Runtime configuration.

use serde::{Deserialize, Serialize};

use crate::locale::Locale;
use crate::DEFAULT_EVENT_CHANNEL_CAPACITY;

/// Configuration shared by selectors, audiences, and registries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeraldConfig {
    /// Log unsupported features and dropped facets at debug level instead of trace.
    pub debug: bool,

    /// Locale for viewers whose host reports none.
    pub default_locale: Locale,

    /// Capacity of the registry event channel.
    pub event_channel_capacity: usize,
}

impl Default for HeraldConfig {
    fn default() -> Self {
        Self {
            debug: false,
            default_locale: Locale::default(),
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

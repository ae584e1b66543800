//! Injected logging policy.

use std::fmt;

use tracing::{debug, trace};

use herald_types::{FeatureKind, HeraldConfig};

/// Controls how loudly expected capability gaps are reported.
///
/// A feature missing on a host is routine, so those messages go to `trace`
/// unless debug is on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    debug: bool,
}

impl Diagnostics {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    pub fn from_config(config: &HeraldConfig) -> Self {
        Self::new(config.debug)
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Report that a feature or facet is unavailable.
    pub fn unsupported(&self, feature: FeatureKind, detail: fmt::Arguments<'_>) {
        if self.debug {
            debug!(feature = feature.name(), "{}", detail);
        } else {
            trace!(feature = feature.name(), "{}", detail);
        }
    }

    /// Report a dropped or skipped candidate facet.
    pub fn candidate(&self, facet: &str, detail: fmt::Arguments<'_>) {
        if self.debug {
            debug!(facet, "{}", detail);
        } else {
            trace!(facet, "{}", detail);
        }
    }
}

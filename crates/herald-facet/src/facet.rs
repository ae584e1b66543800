//! The facet contracts.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{trace, warn};

use herald_types::Feature;

use crate::{FacetResult, Viewer};

/// Base contract shared by every facet.
pub trait Facet<V>: Send + Sync {
    /// Facet name for diagnostics.
    fn name(&self) -> &'static str;

    /// Whether this facet can work in the current environment at all.
    ///
    /// Must not depend on any viewer. Called once per selection pass.
    fn supported(&self) -> bool {
        true
    }

    /// Whether this facet can deliver to `viewer`.
    ///
    /// Only consulted when [`Facet::supported`] is true. An `Err` means the
    /// viewer is of an unexpected type; selection skips this candidate.
    fn applicable(&self, _viewer: &V) -> FacetResult<bool> {
        Ok(true)
    }
}

impl<V, F> Facet<V> for Arc<F>
where
    F: Facet<V> + ?Sized,
{
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn supported(&self) -> bool {
        (**self).supported()
    }

    fn applicable(&self, viewer: &V) -> FacetResult<bool> {
        (**self).applicable(viewer)
    }
}

/// A facet that delivers content of type `C`.
///
/// `create_message` converts the content into the host's native message once;
/// `send` delivers that message to a single viewer.
pub trait Capability<V, C: Feature>: Facet<V> {
    /// The host's native message type.
    type Message: Send + Sync;

    /// Build the native message. `None` means this content cannot be
    /// expressed for the viewer and nothing is sent.
    fn create_message(&self, viewer: &V, content: &C) -> Option<Self::Message>;

    /// Deliver a message to one viewer.
    fn send(&self, viewer: &V, message: &Self::Message) -> FacetResult<()>;
}

/// Object-safe form of [`Capability`], used by audiences.
pub trait Dispatch<V, C: Feature>: Facet<V> {
    /// Build the message once against `representative` and deliver it to
    /// every viewer in `viewers`. Returns the number of successful deliveries.
    fn dispatch(&self, representative: &V, viewers: &[V], content: &C) -> usize;
}

impl<V, C, T> Dispatch<V, C> for T
where
    V: Viewer,
    C: Feature,
    T: Capability<V, C>,
{
    fn dispatch(&self, representative: &V, viewers: &[V], content: &C) -> usize {
        let Some(message) = self.create_message(representative, content) else {
            trace!(
                facet = self.name(),
                feature = C::KIND.name(),
                "Facet produced no message"
            );
            return 0;
        };

        let mut delivered = 0;
        for viewer in viewers {
            match catch_unwind(AssertUnwindSafe(|| self.send(viewer, &message))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    warn!(
                        facet = self.name(),
                        feature = C::KIND.name(),
                        ?viewer,
                        "Delivery failed: {}",
                        e
                    );
                }
                Err(panic) => {
                    warn!(
                        facet = self.name(),
                        feature = C::KIND.name(),
                        ?viewer,
                        "Delivery panicked: {:?}",
                        panic
                    );
                }
            }
        }

        delivered
    }
}

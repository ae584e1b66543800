//! Capability facets and runtime facet selection.
//!
//! A facet is one strategy for delivering one feature to one kind of viewer.
//! Hosts register an ordered list of candidate facets per feature; the
//! [`FacetSelector`] drops candidates that cannot work in this environment
//! and later picks the first one applicable to a given viewer.

mod bossbar;
mod catalog;
mod diagnostics;
mod error;
mod facet;
mod probe;
mod selector;

pub use bossbar::{BarView, BossBarFacet, BossBarHandle, BossBarSink, BossBarUpdate, PerViewerBossBar};
pub use catalog::{Capabilities, CatalogBuilder, FacetCatalog};
pub use diagnostics::Diagnostics;
pub use error::FacetError;
pub use facet::{Capability, Dispatch, Facet};
pub use probe::{Detection, Probe};
pub use selector::{FacetSelector, FacetSupplier};

use std::fmt::Debug;
use std::hash::Hash;

/// Result type for facet operations.
pub type FacetResult<T> = Result<T, FacetError>;

/// A host handle to a message recipient.
///
/// Blanket-implemented for every identity-comparable, shareable type.
pub trait Viewer: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> Viewer for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

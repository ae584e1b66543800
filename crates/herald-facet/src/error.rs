//! Error types for the facet module.

use thiserror::Error;

/// Errors that facets report.
///
/// None of these escape an audience: construction failures drop the
/// candidate, mismatches skip it, and delivery failures are logged per viewer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FacetError {
    /// The facet could not be constructed in this environment.
    #[error("Facet construction failed: {0}")]
    Construction(String),

    /// A native API the facet needs is missing.
    #[error("Native API unavailable: {0}")]
    Unavailable(String),

    /// The viewer is not of the type this facet handles.
    #[error("Viewer type mismatch: {0}")]
    ViewerMismatch(String),

    /// Sending to a viewer failed.
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// The viewer is no longer connected.
    #[error("Viewer disconnected")]
    Disconnected,
}

//! Explicit runtime feature detection.
//!
//! Hosts detect native APIs by returning a [`Probe`] instead of relying on
//! failures as control flow. A [`Detection`] runs its probe once and keeps
//! the answer for the life of the process.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::OnceLock;

use tracing::debug;

/// Outcome of detecting a native handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    /// The handle exists.
    Available(T),

    /// The handle is missing, with a human-readable reason.
    Unavailable(String),
}

impl<T> Probe<T> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }

    /// Probe from an `Option`, using `reason` when absent.
    pub fn from_option(value: Option<T>, reason: impl Into<String>) -> Self {
        match value {
            Some(value) => Self::Available(value),
            None => Self::Unavailable(reason.into()),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Available(value) => Some(value),
            Self::Unavailable(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Available(_) => None,
            Self::Unavailable(reason) => Some(reason),
        }
    }
}

/// A memoised probe.
pub struct Detection<T> {
    label: &'static str,
    detect: fn() -> Probe<T>,
    result: OnceLock<Probe<T>>,
}

impl<T> Detection<T> {
    /// Create a detection. Nothing runs until first use.
    pub const fn new(label: &'static str, detect: fn() -> Probe<T>) -> Self {
        Self {
            label,
            detect,
            result: OnceLock::new(),
        }
    }

    /// Run the probe on first call; later calls return the cached outcome.
    ///
    /// A panicking probe counts as unavailable.
    pub fn probe(&self) -> &Probe<T> {
        self.result.get_or_init(|| {
            let outcome = catch_unwind(AssertUnwindSafe(self.detect))
                .unwrap_or_else(|_| Probe::unavailable("probe panicked"));
            match &outcome {
                Probe::Available(_) => debug!(probe = self.label, "Native API available"),
                Probe::Unavailable(reason) => {
                    debug!(probe = self.label, reason = %reason, "Native API unavailable")
                }
            }
            outcome
        })
    }

    pub fn is_available(&self) -> bool {
        self.probe().is_available()
    }

    pub fn get(&self) -> Option<&T> {
        self.probe().get()
    }
}

impl<T> fmt::Debug for Detection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Detection")
            .field("label", &self.label)
            .field("probed", &self.result.get().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static CALLS: AtomicUsize = AtomicUsize::new(0);

    fn counted() -> Probe<&'static str> {
        CALLS.fetch_add(1, Ordering::SeqCst);
        Probe::Available("handle")
    }

    fn missing() -> Probe<u8> {
        Probe::unavailable("class not found")
    }

    fn exploding() -> Probe<u8> {
        panic!("linkage error");
    }

    #[test]
    fn test_detection_runs_once() {
        static DETECTION: Detection<&'static str> = Detection::new("counted", counted);

        assert!(DETECTION.is_available());
        assert_eq!(DETECTION.get(), Some(&"handle"));
        assert!(DETECTION.is_available());
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unavailable_reason() {
        let detection = Detection::new("missing", missing);
        assert!(!detection.is_available());
        assert_eq!(detection.probe().reason(), Some("class not found"));
    }

    #[test]
    fn test_panicking_probe_is_unavailable() {
        let detection = Detection::new("exploding", exploding);
        assert!(!detection.is_available());
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Probe::from_option(Some(3), "none"), Probe::Available(3));
        assert!(!Probe::<u8>::from_option(None, "none").is_available());
    }
}

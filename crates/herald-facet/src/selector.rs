//! Candidate filtering and per-viewer selection.
//!
//! ```text
//! suppliers ──► select_all ──► [supported candidates, priority order]
//!                                        │
//!                              viewer ──►┴─► select_one ──► first applicable
//! ```

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::{Diagnostics, Facet, FacetResult};

/// Deferred facet constructor.
///
/// Returning `Err` (or panicking) marks the candidate as unavailable.
pub type FacetSupplier<F> = Box<dyn FnOnce() -> FacetResult<F> + Send>;

/// Picks facets for audiences.
#[derive(Debug, Clone, Copy, Default)]
pub struct FacetSelector {
    diagnostics: Diagnostics,
}

impl FacetSelector {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self { diagnostics }
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    /// Construct every candidate and keep the supported ones, in order.
    ///
    /// A candidate whose construction fails or panics, or whose `supported()`
    /// is false or panics, is dropped without affecting the others.
    pub fn select_all<V, F>(&self, suppliers: impl IntoIterator<Item = FacetSupplier<F>>) -> Vec<F>
    where
        F: Facet<V>,
    {
        let mut selected = Vec::new();

        for (index, supplier) in suppliers.into_iter().enumerate() {
            let facet = match catch_unwind(AssertUnwindSafe(supplier)) {
                Ok(Ok(facet)) => facet,
                Ok(Err(e)) => {
                    self.diagnostics
                        .candidate("<unconstructed>", format_args!("Candidate #{} dropped: {}", index, e));
                    continue;
                }
                Err(_) => {
                    self.diagnostics.candidate(
                        "<unconstructed>",
                        format_args!("Candidate #{} dropped: constructor panicked", index),
                    );
                    continue;
                }
            };

            let supported = catch_unwind(AssertUnwindSafe(|| facet.supported())).unwrap_or(false);
            if supported {
                selected.push(facet);
            } else {
                self.diagnostics
                    .candidate(facet.name(), format_args!("Candidate #{} not supported", index));
            }
        }

        selected
    }

    /// Return the first candidate applicable to `viewer`.
    ///
    /// A candidate that reports a mismatch (or panics) is skipped and the
    /// scan continues. Deterministic for a fixed list and viewer.
    pub fn select_one<'a, V, F>(&self, candidates: &'a [F], viewer: &V) -> Option<&'a F>
    where
        F: Facet<V>,
    {
        candidates.iter().find(|candidate| {
            match catch_unwind(AssertUnwindSafe(|| candidate.applicable(viewer))) {
                Ok(Ok(applicable)) => applicable,
                Ok(Err(e)) => {
                    self.diagnostics
                        .candidate(candidate.name(), format_args!("Skipped: {}", e));
                    false
                }
                Err(_) => {
                    self.diagnostics
                        .candidate(candidate.name(), format_args!("Skipped: applicability check panicked"));
                    false
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FacetError;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    enum TestViewer {
        Player(u32),
        Console,
    }

    struct Candidate {
        name: &'static str,
        supported: bool,
        players_only: bool,
        strict: bool,
    }

    impl Facet<TestViewer> for Candidate {
        fn name(&self) -> &'static str {
            self.name
        }

        fn supported(&self) -> bool {
            self.supported
        }

        fn applicable(&self, viewer: &TestViewer) -> FacetResult<bool> {
            match viewer {
                TestViewer::Player(_) => Ok(true),
                TestViewer::Console if self.strict => {
                    Err(FacetError::ViewerMismatch("expected a player".into()))
                }
                TestViewer::Console => Ok(!self.players_only),
            }
        }
    }

    fn candidate(name: &'static str, supported: bool) -> Candidate {
        Candidate {
            name,
            supported,
            players_only: false,
            strict: false,
        }
    }

    fn supplier(c: Candidate) -> FacetSupplier<Arc<Candidate>> {
        Box::new(move || Ok(Arc::new(c)))
    }

    #[test]
    fn test_select_all_drops_failures_and_unsupported() {
        let selector = FacetSelector::default();
        let suppliers: Vec<FacetSupplier<Arc<Candidate>>> = vec![
            Box::new(|| Err(FacetError::Construction("missing host class".into()))),
            supplier(candidate("a", true)),
            supplier(candidate("b", false)),
        ];

        let selected = selector.select_all::<TestViewer, _>(suppliers);
        let names: Vec<&str> = selected.iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["a"]);
    }

    #[test]
    fn test_select_all_preserves_order() {
        let selector = FacetSelector::default();
        let suppliers = vec![
            supplier(candidate("first", true)),
            supplier(candidate("skipped", false)),
            supplier(candidate("second", true)),
            supplier(candidate("third", true)),
        ];

        let selected = selector.select_all::<TestViewer, _>(suppliers);
        let names: Vec<&str> = selected.iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_select_all_survives_panicking_constructor() {
        let selector = FacetSelector::default();
        let suppliers: Vec<FacetSupplier<Arc<Candidate>>> = vec![
            Box::new(|| panic!("linkage error")),
            supplier(candidate("fallback", true)),
        ];

        let selected = selector.select_all::<TestViewer, _>(suppliers);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "fallback");
    }

    #[test]
    fn test_select_one_skips_mismatch() {
        let selector = FacetSelector::default();
        let candidates = vec![
            Arc::new(Candidate {
                name: "strict",
                supported: true,
                players_only: true,
                strict: true,
            }),
            Arc::new(Candidate {
                name: "players",
                supported: true,
                players_only: true,
                strict: false,
            }),
            Arc::new(candidate("anyone", true)),
        ];

        let chosen = selector.select_one(&candidates, &TestViewer::Console).unwrap();
        assert_eq!(chosen.name, "anyone");

        let chosen = selector.select_one(&candidates, &TestViewer::Player(1)).unwrap();
        assert_eq!(chosen.name, "strict");
    }

    #[test]
    fn test_select_one_none_when_nothing_applies() {
        let selector = FacetSelector::default();
        let candidates = vec![Arc::new(Candidate {
            name: "players",
            supported: true,
            players_only: true,
            strict: false,
        })];

        assert!(selector.select_one(&candidates, &TestViewer::Console).is_none());
        assert!(selector
            .select_one::<TestViewer, Arc<Candidate>>(&[], &TestViewer::Player(1))
            .is_none());
    }

    #[test]
    fn test_select_one_is_deterministic() {
        let selector = FacetSelector::new(Diagnostics::new(true));
        let candidates = vec![
            Arc::new(candidate("a", true)),
            Arc::new(candidate("b", true)),
        ];

        let viewer = TestViewer::Player(9);
        let first = selector.select_one(&candidates, &viewer).map(|f| f.name);
        for _ in 0..16 {
            assert_eq!(selector.select_one(&candidates, &viewer).map(|f| f.name), first);
        }
    }
}

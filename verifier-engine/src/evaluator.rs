//! The approval algorithm.
//!
//! A minor version is an insertion into a doubly-linked lineage ordered by
//! pairwise compatibility: it must be a compatible successor of `prev` and a
//! compatible predecessor of `next`, for whichever of the two resolved.
//! A patch must be functionally identical to the minor it patches.

use std::sync::Arc;
use verifier_model::{NodeId, SchemaComparator, SchemaDocument, VerificationOutcome};

/// Lineage position with neighbor schemas already fetched. A `None` schema
/// means the neighbor does not exist or could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedLineage {
    Minor {
        prev_node_id: Option<NodeId>,
        prev_schema: Option<SchemaDocument>,
        next_node_id: Option<NodeId>,
        next_schema: Option<SchemaDocument>,
    },
    Patch {
        minor_schema: Option<SchemaDocument>,
    },
}

#[derive(Clone)]
pub struct CompatibilityEvaluator {
    comparator: Arc<dyn SchemaComparator>,
}

impl CompatibilityEvaluator {
    pub fn new(comparator: Arc<dyn SchemaComparator>) -> Self {
        Self { comparator }
    }

    pub fn evaluate(&self, proposed: &SchemaDocument, lineage: &ResolvedLineage) -> VerificationOutcome {
        match lineage {
            ResolvedLineage::Patch { minor_schema } => {
                let approved = minor_schema
                    .as_ref()
                    .is_some_and(|minor| self.comparator.is_functionally_identical(proposed, minor));
                VerificationOutcome::patch(approved)
            }
            ResolvedLineage::Minor { prev_node_id, prev_schema, next_node_id, next_schema } => {
                let after_prev = prev_schema
                    .as_ref()
                    .map_or(true, |prev| self.comparator.is_backward_compatible(prev, proposed));
                // Skip the second check once the first has already failed
                let before_next = after_prev
                    && next_schema
                        .as_ref()
                        .map_or(true, |next| self.comparator.is_backward_compatible(proposed, next));
                VerificationOutcome {
                    approved: after_prev && before_next,
                    prev_minor_node_id: *prev_node_id,
                    next_minor_node_id: *next_node_id,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use verifier_model::PackageLocation;

    /// Comparator answering from a fixed table, recording every question.
    struct Scripted {
        compatible: Vec<(&'static str, &'static str)>,
        identical: Vec<(&'static str, &'static str)>,
        asked: Mutex<Vec<(String, String)>>,
    }

    impl Scripted {
        fn new(compatible: Vec<(&'static str, &'static str)>) -> Self {
            Self { compatible, identical: Vec::new(), asked: Mutex::new(Vec::new()) }
        }
    }

    impl SchemaComparator for Scripted {
        fn is_backward_compatible(&self, old: &SchemaDocument, new: &SchemaDocument) -> bool {
            self.asked.lock().unwrap().push((old.text.clone(), new.text.clone()));
            self.compatible.contains(&(old.text.as_str(), new.text.as_str()))
        }

        fn is_functionally_identical(&self, a: &SchemaDocument, b: &SchemaDocument) -> bool {
            self.identical.contains(&(a.text.as_str(), b.text.as_str()))
        }
    }

    fn doc(text: &str) -> SchemaDocument {
        SchemaDocument::new(PackageLocation::new(format!("Qm{}", text)).unwrap(), text)
    }

    fn minor(prev: Option<&str>, next: Option<&str>) -> ResolvedLineage {
        ResolvedLineage::Minor {
            prev_node_id: prev.map(|_| NodeId([1; 32])),
            prev_schema: prev.map(doc),
            next_node_id: next.map(|_| NodeId([3; 32])),
            next_schema: next.map(doc),
        }
    }

    #[test]
    fn test_isolated_minor_is_approved() {
        let scripted = Arc::new(Scripted::new(vec![]));
        let evaluator = CompatibilityEvaluator::new(scripted.clone());
        let outcome = evaluator.evaluate(&doc("p"), &minor(None, None));
        assert!(outcome.approved);
        assert!(scripted.asked.lock().unwrap().is_empty());
    }

    #[test]
    fn test_each_resolvable_direction_must_hold() {
        // Every combination of neighbor presence and predicate result
        for prev_ok in [true, false] {
            for next_ok in [true, false] {
                let mut table = Vec::new();
                if prev_ok {
                    table.push(("prev", "p"));
                }
                if next_ok {
                    table.push(("p", "next"));
                }
                let evaluator = CompatibilityEvaluator::new(Arc::new(Scripted::new(table)));
                let p = doc("p");

                assert_eq!(evaluator.evaluate(&p, &minor(Some("prev"), None)).approved, prev_ok);
                assert_eq!(evaluator.evaluate(&p, &minor(None, Some("next"))).approved, next_ok);
                assert_eq!(
                    evaluator.evaluate(&p, &minor(Some("prev"), Some("next"))).approved,
                    prev_ok && next_ok
                );
            }
        }
    }

    #[test]
    fn test_direction_of_checks() {
        let scripted = Arc::new(Scripted::new(vec![("prev", "p"), ("p", "next")]));
        let evaluator = CompatibilityEvaluator::new(scripted.clone());
        evaluator.evaluate(&doc("p"), &minor(Some("prev"), Some("next")));
        let asked = scripted.asked.lock().unwrap();
        assert_eq!(
            *asked,
            vec![("prev".to_string(), "p".to_string()), ("p".to_string(), "next".to_string())]
        );
    }

    #[test]
    fn test_outcome_carries_neighbor_ids_even_when_rejected() {
        let evaluator = CompatibilityEvaluator::new(Arc::new(Scripted::new(vec![])));
        let outcome = evaluator.evaluate(&doc("p"), &minor(Some("prev"), Some("next")));
        assert!(!outcome.approved);
        assert_eq!(outcome.prev_minor_node_id, Some(NodeId([1; 32])));
        assert_eq!(outcome.next_minor_node_id, Some(NodeId([3; 32])));
    }

    #[test]
    fn test_neighbor_known_by_id_only_is_not_checked() {
        let evaluator = CompatibilityEvaluator::new(Arc::new(Scripted::new(vec![])));
        let lineage = ResolvedLineage::Minor {
            prev_node_id: Some(NodeId([1; 32])),
            prev_schema: None,
            next_node_id: None,
            next_schema: None,
        };
        let outcome = evaluator.evaluate(&doc("p"), &lineage);
        assert!(outcome.approved);
        assert_eq!(outcome.prev_minor_node_id, Some(NodeId([1; 32])));
    }

    #[test]
    fn test_patch_requires_identical_minor() {
        let mut scripted = Scripted::new(vec![]);
        scripted.identical.push(("p", "minor"));
        let evaluator = CompatibilityEvaluator::new(Arc::new(scripted));

        let same = ResolvedLineage::Patch { minor_schema: Some(doc("minor")) };
        assert_eq!(evaluator.evaluate(&doc("p"), &same), VerificationOutcome::patch(true));

        let different = ResolvedLineage::Patch { minor_schema: Some(doc("other")) };
        assert!(!evaluator.evaluate(&doc("p"), &different).approved);

        let unresolved = ResolvedLineage::Patch { minor_schema: None };
        assert_eq!(evaluator.evaluate(&doc("p"), &unresolved), VerificationOutcome::patch(false));
    }
}

//! The recursive comparator.
//!
//! [`Comparator`] walks two documents in lock-step. Objects are compared
//! member by member, primitives by value, and arrays are first reconciled
//! (which old element corresponds to which new element) before each matched
//! pair is compared in turn.

use serde_json::{Map, Value};
use tracing::debug;

use arbor_match::{
    assignment_match, match_elements, ElementScorer, MatchReport, PairCost, ScoreMode,
};
use arbor_types::{leaf_count, ElementKind, Pointer, TrackedElement};

use crate::cache::{CacheStats, CachedArray, MatchCache};
use crate::change::{
    ArrayChange, ArrayItem, ArraySubElement, Change, DocumentComparison, MatchMethod,
};
use crate::config::{DiffConfig, MatchStrategy, Rules};
use crate::error::{DiffError, DiffResult};

/// Compare two documents with the default configuration.
pub fn compare(
    old: &Value,
    old_label: impl Into<String>,
    new: &Value,
    new_label: impl Into<String>,
) -> DiffResult<DocumentComparison> {
    Comparator::default().compare(old, old_label, new, new_label)
}

/// A configured document comparator.
///
/// The comparator owns a [`MatchCache`] that lives for one
/// [`compare`](Self::compare) call; it is cleared when the next call starts.
#[derive(Debug, Default)]
pub struct Comparator {
    config: DiffConfig,
    cache: MatchCache,
}

impl Comparator {
    pub fn new(config: DiffConfig) -> Self {
        Self {
            config,
            cache: MatchCache::new(),
        }
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Cache counters for the most recent comparison.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Compare `old` against `new`.
    ///
    /// Fails without a partial result if the documents have incompatible
    /// shapes at some position, a selection path does not resolve, or the
    /// assignment solver fails.
    pub fn compare(
        &mut self,
        old: &Value,
        old_label: impl Into<String>,
        new: &Value,
        new_label: impl Into<String>,
    ) -> DiffResult<DocumentComparison> {
        self.cache.clear();
        let mut walker = Walker {
            config: &self.config,
            cache: &mut self.cache,
        };
        let outcome =
            walker.compare_elements(&TrackedElement::root(old), &TrackedElement::root(new))?;

        let comparison = DocumentComparison {
            old_label: old_label.into(),
            new_label: new_label.into(),
            changes: outcome.changes,
            score: outcome.score,
        };
        debug!(
            changes = comparison.len(),
            score = comparison.score,
            cache_hits = self.cache.stats().hits,
            "comparison complete"
        );
        Ok(comparison)
    }
}

/// Changes found under one node pair and their total magnitude.
#[derive(Debug, Default)]
struct Outcome {
    changes: Vec<Change>,
    score: usize,
}

impl Outcome {
    fn absorb(&mut self, other: Outcome) {
        self.changes.extend(other.changes);
        self.score += other.score;
    }

    fn from_array(change: ArrayChange, score: usize) -> Self {
        if change.is_empty() {
            return Self::default();
        }
        Self {
            changes: vec![Change::ArrayChanged(change)],
            score,
        }
    }
}

/// Two arrays under comparison with their items.
struct ArrayPair<'d> {
    old: TrackedElement<'d>,
    new: TrackedElement<'d>,
    old_items: Vec<TrackedElement<'d>>,
    new_items: Vec<TrackedElement<'d>>,
}

/// A correspondence and how it was found.
struct Pairing {
    report: MatchReport,
    method: MatchMethod,
    property: Option<String>,
}

impl Pairing {
    fn unmatched(pair: &ArrayPair<'_>) -> Self {
        Self {
            report: MatchReport::unmatched(pair.old_items.len(), pair.new_items.len()),
            method: MatchMethod::Unmatched,
            property: None,
        }
    }
}

struct Walker<'c> {
    config: &'c DiffConfig,
    cache: &'c mut MatchCache,
}

impl<'c> Walker<'c> {
    fn compare_elements<'d>(
        &mut self,
        old: &TrackedElement<'d>,
        new: &TrackedElement<'d>,
    ) -> DiffResult<Outcome> {
        if old.kind() != new.kind() {
            return Err(DiffError::TypeMismatch {
                old_pointer: old.pointer().clone(),
                new_pointer: new.pointer().clone(),
                old_kind: old.kind(),
                new_kind: new.kind(),
            });
        }
        if old.raw() == new.raw() {
            return Ok(Outcome::default());
        }

        match (old.raw(), new.raw()) {
            (Value::Object(old_map), Value::Object(new_map)) => {
                self.compare_objects(old, old_map, new, new_map)
            }
            (Value::Array(_), Value::Array(_)) => self.compare_arrays(old, new),
            _ => Ok(Outcome {
                changes: vec![Change::PropertyChanged {
                    old_pointer: old.pointer().clone(),
                    new_pointer: new.pointer().clone(),
                    old_value: old.raw().clone(),
                    new_value: new.raw().clone(),
                }],
                score: 1,
            }),
        }
    }

    fn compare_objects<'d>(
        &mut self,
        old: &TrackedElement<'d>,
        old_map: &'d Map<String, Value>,
        new: &TrackedElement<'d>,
        new_map: &'d Map<String, Value>,
    ) -> DiffResult<Outcome> {
        let config = self.config;
        let rules = config.rules_for(new.pointer());
        let mut outcome = Outcome::default();

        for (name, old_value) in old_map {
            let old_pointer = old.pointer().child(name.as_str());
            let new_pointer = new.pointer().child(name.as_str());
            if rules.is_ignored(&old_pointer) || rules.is_ignored(&new_pointer) {
                continue;
            }
            match new_map.get(name) {
                Some(new_value) => {
                    let nested = self.compare_elements(
                        &TrackedElement::new(old_pointer, old_value),
                        &TrackedElement::new(new_pointer, new_value),
                    )?;
                    outcome.absorb(nested);
                }
                None => {
                    outcome.score += leaf_count(old_value);
                    outcome.changes.push(Change::PropertyDeleted {
                        pointer: old_pointer,
                        parent: old.pointer().clone(),
                        value: old_value.clone(),
                    });
                }
            }
        }

        for (name, new_value) in new_map {
            if old_map.contains_key(name) {
                continue;
            }
            let new_pointer = new.pointer().child(name.as_str());
            if rules.is_ignored(&old.pointer().child(name.as_str())) || rules.is_ignored(&new_pointer)
            {
                continue;
            }
            outcome.score += leaf_count(new_value);
            outcome.changes.push(Change::PropertyAdded {
                pointer: new_pointer,
                parent: new.pointer().clone(),
                value: new_value.clone(),
            });
        }

        Ok(outcome)
    }

    fn compare_arrays<'d>(
        &mut self,
        old: &TrackedElement<'d>,
        new: &TrackedElement<'d>,
    ) -> DiffResult<Outcome> {
        if self.config.cache {
            if let Some(hit) = self.cache.get(old.pointer(), new.pointer()) {
                debug!(old = %old.pointer(), new = %new.pointer(), "array cache hit");
                return Ok(Outcome::from_array(hit.change.clone(), hit.score));
            }
        }

        let pair = ArrayPair {
            old: old.clone(),
            new: new.clone(),
            old_items: old.children(),
            new_items: new.children(),
        };
        let (change, score) = self.reconcile(&pair)?;

        if self.config.cache {
            self.cache.insert(
                old.pointer().clone(),
                new.pointer().clone(),
                CachedArray {
                    change: change.clone(),
                    score,
                },
            );
        }
        Ok(Outcome::from_array(change, score))
    }

    fn reconcile(&mut self, pair: &ArrayPair<'_>) -> DiffResult<(ArrayChange, usize)> {
        let config = self.config;
        let rules = config.rules_for(pair.new.pointer());

        let (Some(old_first), Some(new_first)) = (pair.old_items.first(), pair.new_items.first())
        else {
            return self.assemble(pair, Pairing::unmatched(pair), None);
        };

        if let Some(strategy) = rules.strategy {
            debug!(pointer = %pair.new.pointer(), ?strategy, "using configured strategy");
            let pairing = self.apply_strategy(pair, strategy, &rules)?;
            return self.assemble(pair, pairing, rules.select);
        }

        match (old_first.kind(), new_first.kind()) {
            (ElementKind::Primitive, ElementKind::Primitive) => {
                let scorer = ElementScorer::new(ScoreMode::Literal, None)
                    .with_case_sensitive(rules.case_sensitive);
                let pairing = Pairing {
                    report: match_elements(
                        &pair.old_items,
                        &pair.new_items,
                        &scorer,
                        rules.min_confidence,
                    ),
                    method: MatchMethod::Literal,
                    property: None,
                };
                self.assemble(pair, pairing, rules.select)
            }
            (ElementKind::Object, ElementKind::Object) => {
                match self.best_candidate(pair, old_first, new_first, &rules)? {
                    Some(best) => Ok(best),
                    None => self.assemble(pair, Pairing::unmatched(pair), rules.select),
                }
            }
            _ => {
                debug!(pointer = %pair.new.pointer(), "no strategy for element kinds, leaving unmatched");
                self.assemble(pair, Pairing::unmatched(pair), rules.select)
            }
        }
    }

    fn apply_strategy(
        &mut self,
        pair: &ArrayPair<'_>,
        strategy: &MatchStrategy,
        rules: &Rules<'_>,
    ) -> DiffResult<Pairing> {
        let greedy = |mode: ScoreMode, property: &Option<Pointer>| {
            let scorer = ElementScorer::new(mode, property.clone())
                .with_case_sensitive(rules.case_sensitive);
            match_elements(&pair.old_items, &pair.new_items, &scorer, rules.min_confidence)
        };

        let pairing = match strategy {
            MatchStrategy::Literal { property } => Pairing {
                report: greedy(ScoreMode::Literal, property),
                method: MatchMethod::Literal,
                property: property.as_ref().map(Pointer::to_relative_string),
            },
            MatchStrategy::Similarity { property } => Pairing {
                report: greedy(ScoreMode::Similarity, property),
                method: MatchMethod::Similarity,
                property: property.as_ref().map(Pointer::to_relative_string),
            },
            MatchStrategy::Assignment { reject_ratio } => {
                let ratio = reject_ratio.unwrap_or(self.config.reject_ratio);
                let report = assignment_match::<DiffError, _>(
                    pair.old_items.len(),
                    pair.new_items.len(),
                    ratio,
                    |l, r| {
                        let (old, new) = (&pair.old_items[l], &pair.new_items[r]);
                        let outcome = match self.compare_elements(old, new) {
                            Ok(outcome) => outcome,
                            Err(DiffError::TypeMismatch { .. }) => return Ok(None),
                            Err(err) => return Err(err),
                        };
                        Ok(Some(PairCost {
                            cost: outcome.score as f64,
                            potential: old.leaf_count().max(new.leaf_count()) as f64,
                        }))
                    },
                )?;
                Pairing {
                    report,
                    method: MatchMethod::Assignment,
                    property: None,
                }
            }
            MatchStrategy::Positional => Pairing {
                report: MatchReport::positional(pair.old_items.len(), pair.new_items.len()),
                method: MatchMethod::Positional,
                property: None,
            },
        };
        Ok(pairing)
    }

    /// Try every shared member of the first elements under every heuristic
    /// mode and keep the pairing with the smallest change magnitude.
    fn best_candidate(
        &mut self,
        pair: &ArrayPair<'_>,
        old_first: &TrackedElement<'_>,
        new_first: &TrackedElement<'_>,
        rules: &Rules<'_>,
    ) -> DiffResult<Option<(ArrayChange, usize)>> {
        let (Some(old_members), Some(new_members)) = (old_first.as_object(), new_first.as_object())
        else {
            return Ok(None);
        };
        let config = self.config;
        let member_rules = config.rules_for(new_first.pointer());
        let names: Vec<&String> = old_members
            .keys()
            .filter(|name| new_members.contains_key(name.as_str()))
            .filter(|name| {
                !member_rules.is_ignored(&old_first.pointer().child(name.as_str()))
                    && !member_rules.is_ignored(&new_first.pointer().child(name.as_str()))
            })
            .collect();

        let mut best: Option<(ArrayChange, usize)> = None;
        for name in names {
            let property = Pointer::from_segments([name.as_str()]);
            for &mode in &config.heuristic_modes {
                let scorer = ElementScorer::new(mode, Some(property.clone()))
                    .with_case_sensitive(rules.case_sensitive);
                let report = match_elements(
                    &pair.old_items,
                    &pair.new_items,
                    &scorer,
                    rules.min_confidence,
                );
                if report.is_empty() {
                    continue;
                }

                let method = match mode {
                    ScoreMode::Literal => MatchMethod::Literal,
                    ScoreMode::Similarity => MatchMethod::Similarity,
                };
                let pairing = Pairing {
                    report,
                    method,
                    property: Some(name.clone()),
                };
                let (change, score) = match self.assemble(pair, pairing, rules.select) {
                    Ok(assembled) => assembled,
                    Err(DiffError::TypeMismatch {
                        old_pointer,
                        new_pointer,
                        ..
                    }) => {
                        debug!(
                            pointer = %pair.new.pointer(),
                            property = %name,
                            mode = ?mode,
                            old = %old_pointer,
                            new = %new_pointer,
                            "skipping candidate with mismatched shapes"
                        );
                        continue;
                    }
                    Err(err) => return Err(err),
                };
                debug!(
                    pointer = %pair.new.pointer(),
                    property = %name,
                    mode = ?mode,
                    score,
                    "evaluated match candidate"
                );
                if best.as_ref().map_or(true, |(_, best_score)| score < *best_score) {
                    best = Some((change, score));
                }
            }
        }
        Ok(best)
    }

    /// Recurse into matched pairs and collect the array-level change.
    fn assemble(
        &mut self,
        pair: &ArrayPair<'_>,
        pairing: Pairing,
        select: Option<&Pointer>,
    ) -> DiffResult<(ArrayChange, usize)> {
        let mut change = ArrayChange::new(
            pair.old.pointer().clone(),
            pair.new.pointer().clone(),
            pairing.method,
            pairing.property,
        );
        let mut score = 0;

        for &(l, r) in &pairing.report.matched {
            change.matched_indices.push((l, r));
            let (old_item, new_item) = (&pair.old_items[l], &pair.new_items[r]);
            let (old_node, new_node) = match select {
                Some(path) => (old_item.resolve(path)?, new_item.resolve(path)?),
                None => (old_item.clone(), new_item.clone()),
            };

            let nested = self.compare_elements(&old_node, &new_node)?;
            score += nested.score;
            if nested.changes.is_empty() {
                continue;
            }
            let sub = ArraySubElement {
                old_index: l,
                new_index: r,
                old_pointer: old_node.pointer().clone(),
                new_pointer: new_node.pointer().clone(),
                changes: nested.changes,
            };
            if select.is_some() {
                change.out_of_tree.push(sub);
            } else {
                change.sub_changes.push(sub);
            }
        }

        for &l in &pairing.report.unmatched_left {
            let item = &pair.old_items[l];
            score += item.leaf_count();
            change.removed_items.push(ArrayItem {
                index: l,
                pointer: item.pointer().clone(),
                element: item.raw().clone(),
            });
        }
        for &r in &pairing.report.unmatched_right {
            let item = &pair.new_items[r];
            score += item.leaf_count();
            change.added_items.push(ArrayItem {
                index: r,
                pointer: item.pointer().clone(),
                element: item.raw().clone(),
            });
        }

        Ok((change, score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Constraint;
    use arbor_types::PointerPattern;
    use proptest::prelude::*;
    use serde_json::json;

    fn run(old: &Value, new: &Value) -> DocumentComparison {
        compare(old, "old", new, "new").unwrap()
    }

    fn run_with(config: DiffConfig, old: &Value, new: &Value) -> DocumentComparison {
        Comparator::new(config).compare(old, "old", new, "new").unwrap()
    }

    fn only_array(comparison: &DocumentComparison) -> &ArrayChange {
        assert_eq!(comparison.len(), 1, "{:#?}", comparison.changes);
        match &comparison.changes[0] {
            Change::ArrayChanged(array) => array,
            other => panic!("expected array change, got {other:?}"),
        }
    }

    fn constrained(pattern: &str, strategy: MatchStrategy) -> DiffConfig {
        DiffConfig::default()
            .with_constraint(Constraint::parse(pattern).unwrap().with_strategy(strategy))
    }

    #[test]
    fn changed_name_is_a_single_property_change() {
        let comparison = run(
            &json!({"id": 1, "name": "John"}),
            &json!({"id": 1, "name": "Jake"}),
        );
        assert_eq!(comparison.changes.len(), 1);
        assert_eq!(
            comparison.changes[0],
            Change::PropertyChanged {
                old_pointer: Pointer::parse("/name"),
                new_pointer: Pointer::parse("/name"),
                old_value: json!("John"),
                new_value: json!("Jake"),
            }
        );
        assert_eq!(comparison.score, 1);
        assert_eq!(comparison.old_label, "old");
    }

    #[test]
    fn appended_primitive() {
        let comparison = run(&json!({"items": [1, 2, 3]}), &json!({"items": [1, 2, 3, 4]}));
        let array = only_array(&comparison);
        assert_eq!(array.added_items.len(), 1);
        assert_eq!(array.added_items[0].element, json!(4));
        assert_eq!(array.added_items[0].index, 3);
        assert!(array.removed_items.is_empty());
        assert!(array.sub_changes.is_empty());
        assert_eq!(array.match_method, MatchMethod::Literal);
        assert_eq!(comparison.score, 1);
    }

    #[test]
    fn appended_object_uses_key_heuristic() {
        let comparison = run(
            &json!({"items": [{"id": 1}, {"id": 2}, {"id": 3}]}),
            &json!({"items": [{"id": 1}, {"id": 2}, {"id": 3}, {"id": 4}]}),
        );
        let array = only_array(&comparison);
        assert_eq!(array.added_items.len(), 1);
        assert_eq!(array.added_items[0].element["id"], 4);
        assert!(array.removed_items.is_empty());
        assert!(array.sub_changes.is_empty());
        assert_eq!(array.matched_indices, vec![(0, 0), (1, 1), (2, 2)]);
        assert_eq!(array.match_property.as_deref(), Some("id"));
        assert_eq!(array.match_method, MatchMethod::Literal);
    }

    #[test]
    fn reordered_objects_are_matched_by_best_key() {
        let comparison = run(
            &json!({"items": [{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]}),
            &json!({"items": [{"id": 2, "name": "b"}, {"id": 1, "name": "A"}]}),
        );
        let array = only_array(&comparison);
        assert_eq!(array.match_property.as_deref(), Some("id"));
        assert_eq!(array.matched_indices, vec![(0, 1), (1, 0)]);
        assert!(array.added_items.is_empty() && array.removed_items.is_empty());
        assert_eq!(array.sub_changes.len(), 1);

        let sub = &array.sub_changes[0];
        assert_eq!((sub.old_index, sub.new_index), (0, 1));
        assert_eq!(
            sub.changes,
            vec![Change::PropertyChanged {
                old_pointer: Pointer::parse("/items/0/name"),
                new_pointer: Pointer::parse("/items/1/name"),
                old_value: json!("a"),
                new_value: json!("A"),
            }]
        );
        assert_eq!(comparison.score, 1);
    }

    #[test]
    fn renamed_objects_fall_back_to_similarity() {
        let comparison = run(
            &json!([{"name": "Alexander", "age": 30}, {"name": "Beatrice", "age": 41}]),
            &json!([{"name": "Beatrice", "age": 42}, {"name": "Alexandra", "age": 30}]),
        );
        let array = only_array(&comparison);
        assert_eq!(array.match_method, MatchMethod::Similarity);
        assert_eq!(array.match_property.as_deref(), Some("name"));
        assert_eq!(array.matched_indices, vec![(0, 1), (1, 0)]);
        assert_eq!(comparison.score, 2);
    }

    #[test]
    fn added_and_deleted_members() {
        let comparison = run(
            &json!({"keep": 1, "gone": {"a": 1, "b": [2, 3]}}),
            &json!({"keep": 1, "fresh": true}),
        );
        assert_eq!(comparison.deletions(), 1);
        assert_eq!(comparison.additions(), 1);
        assert_eq!(comparison.score, 4);
        match &comparison.changes[0] {
            Change::PropertyDeleted { pointer, parent, .. } => {
                assert_eq!(pointer.to_string(), "/gone");
                assert!(parent.is_root());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(comparison.changes[1].pointer().to_string(), "/fresh");
    }

    #[test]
    fn primitive_roots() {
        let comparison = run(&json!(1), &json!(2));
        assert_eq!(comparison.modifications(), 1);
        assert!(comparison.changes[0].pointer().is_root());
    }

    #[test]
    fn array_roots() {
        let comparison = run(&json!([1]), &json!([]));
        let array = only_array(&comparison);
        assert!(array.new_pointer.is_root());
        assert_eq!(array.removed_items.len(), 1);
        assert_eq!(array.match_method, MatchMethod::Unmatched);
    }

    #[test]
    fn type_mismatch_aborts() {
        let err = compare(&json!({"a": [1]}), "old", &json!({"a": {"b": 1}}), "new").unwrap_err();
        match err {
            DiffError::TypeMismatch {
                old_pointer,
                old_kind,
                new_kind,
                ..
            } => {
                assert_eq!(old_pointer.to_string(), "/a");
                assert_eq!(old_kind, ElementKind::Array);
                assert_eq!(new_kind, ElementKind::Object);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn heuristic_skips_candidates_with_shape_clash() {
        let comparison = run(
            &json!([{"k": 1, "t": "a", "v": [1]}, {"k": 2, "t": "a", "v": {}}]),
            &json!([{"k": 2, "t": "a", "v": {}}, {"k": 1, "t": "a", "v": [1]}]),
        );
        assert!(comparison.is_empty());
    }

    #[test]
    fn heuristic_with_every_candidate_clashing_is_unmatched() {
        let comparison = run(&json!([{"t": "a", "v": [1]}]), &json!([{"t": "a", "v": {}}]));
        let array = only_array(&comparison);
        assert_eq!(array.match_method, MatchMethod::Unmatched);
        assert_eq!(array.removed_items.len(), 1);
        assert_eq!(array.added_items.len(), 1);
    }

    #[test]
    fn arrays_of_arrays_are_unmatched() {
        let comparison = run(&json!([[1, 2]]), &json!([[1, 3]]));
        let array = only_array(&comparison);
        assert_eq!(array.match_method, MatchMethod::Unmatched);
        assert_eq!(array.removed_items.len(), 1);
        assert_eq!(array.added_items.len(), 1);
        assert_eq!(comparison.score, 4);
    }

    #[test]
    fn objects_without_shared_members_are_unmatched() {
        let comparison = run(&json!([{"a": 1}]), &json!([{"b": 1}]));
        let array = only_array(&comparison);
        assert_eq!(array.match_method, MatchMethod::Unmatched);
        assert!(array.matched_indices.is_empty());
    }

    #[test]
    fn nested_arrays_inside_matched_elements() {
        let comparison = run(
            &json!({"groups": [{"id": "g1", "tags": ["x", "y"]}]}),
            &json!({"groups": [{"id": "g1", "tags": ["y", "x", "z"]}]}),
        );
        let array = only_array(&comparison);
        assert_eq!(array.sub_changes.len(), 1);
        match &array.sub_changes[0].changes[..] {
            [Change::ArrayChanged(tags)] => {
                assert_eq!(tags.old_pointer.to_string(), "/groups/0/tags");
                assert_eq!(tags.matched_indices, vec![(0, 1), (1, 0)]);
                assert_eq!(tags.added_items[0].element, json!("z"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(comparison.score, 1);
    }

    #[test]
    fn global_ignore_skips_members() {
        let mut config = DiffConfig::default();
        config.ignore.push(PointerPattern::parse("updated_at").unwrap());
        let comparison = run_with(
            config,
            &json!({"a": 1, "updated_at": "monday"}),
            &json!({"a": 1, "updated_at": "tuesday"}),
        );
        assert!(comparison.is_empty());
    }

    #[test]
    fn ignored_members_do_not_drive_matching() {
        let config = DiffConfig::default().with_constraint(
            Constraint::parse("/items/#")
                .unwrap()
                .with_ignore(PointerPattern::parse("seq").unwrap()),
        );
        let comparison = run_with(
            config,
            &json!({"items": [{"seq": 1, "id": "a"}, {"seq": 2, "id": "b", "n": 1}]}),
            &json!({"items": [{"seq": 1, "id": "b", "n": 2}, {"seq": 2, "id": "a"}]}),
        );
        let array = only_array(&comparison);
        assert_eq!(array.match_property.as_deref(), Some("id"));
        assert_eq!(array.matched_indices, vec![(0, 1), (1, 0)]);
        assert_eq!(array.sub_changes.len(), 1);
        assert_eq!(array.sub_changes[0].changes[0].pointer().to_string(), "/items/0/n");
        assert_eq!(comparison.score, 1);
    }

    #[test]
    fn pure_reorder_is_not_a_change() {
        let comparison = run(
            &json!({"items": [{"id": 1}, {"id": 2}], "tags": ["a", "b"]}),
            &json!({"items": [{"id": 2}, {"id": 1}], "tags": ["b", "a"]}),
        );
        assert!(comparison.is_empty());
    }

    #[test]
    fn positional_strategy() {
        let comparison = run_with(
            constrained("/rows", MatchStrategy::Positional),
            &json!({"rows": [1, 2, 3]}),
            &json!({"rows": [3, 2]}),
        );
        let array = only_array(&comparison);
        assert_eq!(array.match_method, MatchMethod::Positional);
        assert_eq!(array.matched_indices, vec![(0, 0), (1, 1)]);
        assert_eq!(array.sub_changes.len(), 1);
        assert_eq!(array.removed_items[0].index, 2);
        assert_eq!(comparison.score, 2);
    }

    #[test]
    fn literal_strategy_with_nested_property() {
        let comparison = run_with(
            constrained(
                "rows",
                MatchStrategy::Literal {
                    property: Some(Pointer::parse("meta/key")),
                },
            ),
            &json!({"rows": [{"meta": {"key": "k1"}, "v": 1}, {"meta": {"key": "k2"}, "v": 2}]}),
            &json!({"rows": [{"meta": {"key": "k2"}, "v": 2}, {"meta": {"key": "k1"}, "v": 9}]}),
        );
        let array = only_array(&comparison);
        assert_eq!(array.match_property.as_deref(), Some("meta/key"));
        assert_eq!(array.matched_indices, vec![(0, 1), (1, 0)]);
        assert_eq!(array.sub_changes.len(), 1);
        assert_eq!(comparison.score, 1);
    }

    #[test]
    fn assignment_strategy_finds_cheapest_pairing() {
        let comparison = run_with(
            constrained("/people", MatchStrategy::Assignment { reject_ratio: None }),
            &json!({"people": [{"name": "alpha", "v": 1}, {"name": "beta", "v": 2}]}),
            &json!({"people": [{"name": "beta", "v": 2}, {"name": "alpha", "v": 5}]}),
        );
        let array = only_array(&comparison);
        assert_eq!(array.match_method, MatchMethod::Assignment);
        assert_eq!(array.matched_indices, vec![(0, 1), (1, 0)]);
        assert_eq!(array.sub_changes.len(), 1);
        assert_eq!(comparison.score, 1);
    }

    #[test]
    fn assignment_treats_nested_shape_clash_as_incompatible() {
        let comparison = run_with(
            constrained("/p", MatchStrategy::Assignment { reject_ratio: None }),
            &json!({"p": [{"v": [1]}, {"v": {"x": 1}}]}),
            &json!({"p": [{"v": {"x": 1}}, {"v": [1]}]}),
        );
        assert!(comparison.is_empty());
    }

    #[test]
    fn positional_pairing_with_shape_clash_is_fatal() {
        let err = Comparator::new(constrained("/p", MatchStrategy::Positional))
            .compare(
                &json!({"p": [{"v": [1]}]}),
                "old",
                &json!({"p": [{"v": {"x": 1}}]}),
                "new",
            )
            .unwrap_err();
        assert!(matches!(err, DiffError::TypeMismatch { .. }));
    }

    #[test]
    fn assignment_rejects_unrelated_pairs() {
        let comparison = run_with(
            constrained("/people", MatchStrategy::Assignment { reject_ratio: None }),
            &json!({"people": [{"a": 1}]}),
            &json!({"people": [{"b": 2}]}),
        );
        let array = only_array(&comparison);
        assert!(array.matched_indices.is_empty());
        assert_eq!(array.removed_items.len(), 1);
        assert_eq!(array.added_items.len(), 1);
    }

    #[test]
    fn selection_path_records_out_of_tree_changes() {
        let config = DiffConfig::default().with_constraint(
            Constraint::parse("/rows")
                .unwrap()
                .with_strategy(MatchStrategy::Literal {
                    property: Some(Pointer::parse("id")),
                })
                .with_select(Pointer::parse("payload")),
        );
        let comparison = run_with(
            config,
            &json!({"rows": [{"id": 1, "payload": {"v": 1}, "noise": 1}]}),
            &json!({"rows": [{"id": 1, "payload": {"v": 2}, "noise": 2}]}),
        );
        let array = only_array(&comparison);
        assert!(array.sub_changes.is_empty());
        assert_eq!(array.out_of_tree.len(), 1);
        let sub = &array.out_of_tree[0];
        assert_eq!(sub.old_pointer.to_string(), "/rows/0/payload");
        assert_eq!(sub.changes.len(), 1);
        assert_eq!(sub.changes[0].pointer().to_string(), "/rows/0/payload/v");
        assert_eq!(comparison.score, 1);
    }

    #[test]
    fn missing_selection_path_is_fatal() {
        let config = DiffConfig::default().with_constraint(
            Constraint::parse("/rows")
                .unwrap()
                .with_strategy(MatchStrategy::Positional)
                .with_select(Pointer::parse("payload")),
        );
        let err = Comparator::new(config)
            .compare(&json!({"rows": [{"id": 1}]}), "old", &json!({"rows": [{"id": 2}]}), "new")
            .unwrap_err();
        assert!(matches!(err, DiffError::Path(_)));
    }

    #[test]
    fn case_insensitive_matching_still_reports_value_change() {
        let config = DiffConfig::default()
            .with_constraint(Constraint::parse("/tags").unwrap().with_case_sensitive(false));
        let comparison = run_with(config, &json!({"tags": ["Red"]}), &json!({"tags": ["red"]}));
        let array = only_array(&comparison);
        assert_eq!(array.matched_indices, vec![(0, 0)]);
        assert_eq!(array.sub_changes.len(), 1);
        assert!(array.added_items.is_empty());
    }

    #[test]
    fn cache_serves_repeated_pairs() {
        let old = json!({"items": [{"id": 1, "name": "x", "tags": [1]}]});
        let new = json!({"items": [{"id": 1, "name": "x", "tags": [1, 2]}]});

        let mut comparator = Comparator::default();
        let cached = comparator.compare(&old, "old", &new, "new").unwrap();
        assert!(comparator.cache_stats().hits > 0);

        let mut uncached = Comparator::new(DiffConfig {
            cache: false,
            ..DiffConfig::default()
        });
        let plain = uncached.compare(&old, "old", &new, "new").unwrap();
        assert_eq!(uncached.cache_stats().hits, 0);
        assert_eq!(cached.changes, plain.changes);
        assert_eq!(cached.score, plain.score);
    }

    fn sample_documents() -> Vec<Value> {
        vec![
            json!({"id": 1, "name": "John", "tags": ["a", "b"]}),
            json!({"id": 1, "name": "Jake", "tags": ["b", "c", "d"], "age": 40}),
            json!({"id": 2, "tags": [], "meta": {"k": [1, 2, 3]}}),
            json!({
                "catalog": {"groups": [
                    {"id": "g1", "items": [{"sku": "a", "qty": 1}, {"sku": "b", "qty": 2}]},
                    {"id": "g2", "items": []}
                ]}
            }),
            json!({
                "catalog": {"groups": [
                    {"id": "g2", "items": [{"sku": "z", "qty": 9}]},
                    {"id": "g1", "items": [{"sku": "b", "qty": 3}]},
                    {"id": "g3", "items": []}
                ]}
            }),
        ]
    }

    // Holds for these documents, whose array keys are unique. Greedy matching
    // is order dependent, so it does not hold for arbitrary documents.
    #[test]
    fn leaf_totals_are_symmetric_for_keyed_documents() {
        let docs = sample_documents();
        for a in &docs {
            for b in &docs {
                let forward = compare(a, "a", b, "b").unwrap();
                let backward = compare(b, "b", a, "a").unwrap();
                assert_eq!(forward.added_leaves(), backward.removed_leaves(), "{a} -> {b}");
                assert_eq!(forward.removed_leaves(), backward.added_leaves(), "{a} -> {b}");
            }
        }
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            (-50i64..50).prop_map(Value::from),
            "[a-c]{0,3}".prop_map(Value::from),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                proptest::collection::btree_map("[a-d]", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn self_comparison_is_empty(doc in arb_json()) {
            let comparison = compare(&doc, "a", &doc.clone(), "b").unwrap();
            prop_assert!(comparison.is_empty());
            prop_assert_eq!(comparison.score, 0);
        }

        #[test]
        fn primitive_arrays_partition_both_sides(
            old in proptest::collection::vec(0i64..6, 0..6),
            new in proptest::collection::vec(0i64..6, 0..6),
        ) {
            let comparison = compare(&json!(old), "a", &json!(new), "b").unwrap();
            match comparison.changes.first() {
                Some(Change::ArrayChanged(array)) => {
                    prop_assert_eq!(array.matched_indices.len() + array.removed_items.len(), old.len());
                    prop_assert_eq!(array.matched_indices.len() + array.added_items.len(), new.len());
                    prop_assert!(array.sub_changes.is_empty());
                }
                Some(other) => prop_assert!(false, "unexpected {:?}", other),
                None => {
                    let (mut a, mut b) = (old.clone(), new.clone());
                    a.sort_unstable();
                    b.sort_unstable();
                    prop_assert_eq!(a, b);
                }
            }
        }
    }
}

//! Item evaluation: schema pre-pass, dependency ordering, dispatch.
//!
//! The engine applies a fixed policy to every item:
//! 1. Schema items are expanded first (synthetic points are evaluated there)
//! 2. Human-authored sub-questions run in topological order of `dep`,
//!    ties broken by list position
//! 3. A sub-question whose dependency did not pass is recorded as
//!    `dependency failed` and its predicate is never called
//! 4. Sub-questions that cannot be ordered are recorded as `dependency cycle`
//!
//! Nothing here returns an error to the caller: a malformed item fails its
//! own sub-questions and the batch continues.

use std::collections::{BTreeSet, HashMap, HashSet};

use thiserror::Error;

use crate::rule::Dispatcher;
use crate::schema;
use crate::types::{Item, Verdict};

/// Explanation for a sub-question whose dependency did not pass.
pub const DEPENDENCY_FAILED: &str = "dependency failed";

/// Explanation for a sub-question that cannot be ordered.
pub const DEPENDENCY_CYCLE: &str = "dependency cycle";

/// Structural problems that make an item impossible to evaluate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("duplicate point_id {0}")]
    DuplicatePointId(i64),
}

/// Per-item tally of an evaluation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemReport {
    /// Sub-questions carrying a result after the pass, synthetic ones included.
    pub sub_questions: usize,
    pub passed: usize,
    pub failed: usize,
    /// Failed without running their predicate (dependency failed or cycle).
    pub short_circuited: usize,
}

impl ItemReport {
    /// Add another report into this one.
    pub fn merge(&mut self, other: ItemReport) {
        self.sub_questions += other.sub_questions;
        self.passed += other.passed;
        self.failed += other.failed;
        self.short_circuited += other.short_circuited;
    }

    /// Whether every counted sub-question passed.
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Evaluates whole items through a [`Dispatcher`].
#[derive(Debug, Clone, Copy)]
pub struct Engine<'r> {
    dispatcher: Dispatcher<'r>,
}

impl Engine<'static> {
    /// Engine over the built-in rule registry.
    pub fn new() -> Self {
        Self {
            dispatcher: Dispatcher::new(),
        }
    }
}

impl Default for Engine<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> Engine<'r> {
    pub fn with_dispatcher(dispatcher: Dispatcher<'r>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher<'r> {
        &self.dispatcher
    }

    /// Evaluate every sub-question of `item` in place.
    pub fn evaluate_item(&self, item: &mut Item) -> ItemReport {
        mark_depended_on(item);

        if let Err(e) = validate(item) {
            tracing::warn!(error = %e, "Item cannot be evaluated");
            let explanation = format!("EngineError: {}", e);
            for sub in &mut item.sub_questions {
                sub.record(Verdict::fail(explanation.clone()));
            }
            return tally(item, item.sub_questions.len());
        }

        if let Err(e) = schema::expand(item) {
            // the anchor rule reports the schema error itself
            tracing::warn!(error = %e, "Schema expansion failed");
            item.sub_questions.retain(|s| !s.is_synthetic());
        }

        for sub in item.sub_questions.iter_mut().filter(|s| !s.is_synthetic()) {
            sub.reset();
        }

        let plan = plan(item);
        let mut short_circuited = 0;

        for &idx in &plan.order {
            let deps = &plan.deps[idx];
            let blocked = deps
                .iter()
                .any(|&d| !item.sub_questions[d].passed());
            let verdict = if blocked {
                short_circuited += 1;
                Verdict::fail(DEPENDENCY_FAILED)
            } else {
                let sub = &item.sub_questions[idx];
                let parts = match &sub.corresponding_parts {
                    Some(parts) if !parts.is_empty() => parts.clone(),
                    _ => vec![item.model_response.clone()],
                };
                self.dispatcher.evaluate(item, &sub.rule, &parts)
            };
            tracing::debug!(
                point_id = item.sub_questions[idx].point_id,
                passed = verdict.passed,
                "Evaluated sub-question"
            );
            item.sub_questions[idx].record(verdict);
        }

        for &idx in &plan.cyclic {
            tracing::warn!(point_id = item.sub_questions[idx].point_id, "Sub-question is in a dependency cycle");
            item.sub_questions[idx].record(Verdict::fail(DEPENDENCY_CYCLE));
        }

        tally(item, short_circuited + plan.cyclic.len())
    }

    /// Evaluate a batch of items sequentially and sum their reports.
    pub fn evaluate_all(&self, items: &mut [Item]) -> ItemReport {
        let mut total = ItemReport::default();
        for item in items.iter_mut() {
            total.merge(self.evaluate_item(item));
        }
        total
    }
}

/// Check the structural invariants the engine relies on.
pub fn validate(item: &Item) -> Result<(), EngineError> {
    let mut seen = HashSet::new();
    for sub in &item.sub_questions {
        if !seen.insert(sub.point_id) {
            return Err(EngineError::DuplicatePointId(sub.point_id));
        }
    }
    Ok(())
}

/// Set `被依赖` on every sub-question another one depends on.
pub fn mark_depended_on(item: &mut Item) {
    let referenced: HashSet<i64> = item
        .sub_questions
        .iter()
        .flat_map(|s| s.dep.iter().copied().filter(move |d| *d != s.point_id))
        .collect();
    for sub in &mut item.sub_questions {
        sub.depended_on = referenced.contains(&sub.point_id);
    }
}

/// Evaluation order over the human-authored sub-questions.
#[derive(Debug, Default)]
struct Plan {
    /// Indexes in evaluation order.
    order: Vec<usize>,
    /// Indexes that could not be ordered.
    cyclic: Vec<usize>,
    /// Effective dependency indexes per sub-question index.
    deps: Vec<Vec<usize>>,
}

fn plan(item: &Item) -> Plan {
    let subs = &item.sub_questions;
    let index: HashMap<i64, usize> = subs.iter().enumerate().map(|(i, s)| (s.point_id, i)).collect();

    let mut deps: Vec<Vec<usize>> = vec![Vec::new(); subs.len()];
    for (i, sub) in subs.iter().enumerate().filter(|(_, s)| !s.is_synthetic()) {
        for &d in &sub.dep {
            match index.get(&d) {
                None => {
                    tracing::warn!(point_id = sub.point_id, dep = d, "Ignoring unknown dependency");
                }
                Some(_) if d < 0 => {
                    tracing::warn!(point_id = sub.point_id, dep = d, "Ignoring dependency on a synthetic point");
                }
                Some(&j) => {
                    if !deps[i].contains(&j) {
                        deps[i].push(j);
                    }
                }
            }
        }
    }

    let mut indegree = vec![0usize; subs.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); subs.len()];
    for (i, ds) in deps.iter().enumerate() {
        indegree[i] = ds.len();
        for &j in ds {
            dependents[j].push(i);
        }
    }

    let mut ready: BTreeSet<usize> = (0..subs.len())
        .filter(|&i| !subs[i].is_synthetic() && indegree[i] == 0)
        .collect();
    let mut order = Vec::with_capacity(subs.len());
    while let Some(i) = ready.pop_first() {
        order.push(i);
        for &k in &dependents[i] {
            indegree[k] -= 1;
            if indegree[k] == 0 {
                ready.insert(k);
            }
        }
    }

    let ordered: HashSet<usize> = order.iter().copied().collect();
    let cyclic = (0..subs.len())
        .filter(|i| !subs[*i].is_synthetic() && !ordered.contains(i))
        .collect();

    Plan { order, cyclic, deps }
}

fn tally(item: &Item, short_circuited: usize) -> ItemReport {
    let mut report = ItemReport {
        short_circuited,
        ..ItemReport::default()
    };
    for sub in &item.sub_questions {
        match sub.eval_result {
            Some(1) => report.passed += 1,
            Some(_) => report.failed += 1,
            None => continue,
        }
        report.sub_questions += 1;
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::predicates::Input;
    use crate::rule::{ArgShape, PredicateError, RegistryBuilder, RuleArgs};
    use crate::types::SubQuestion;

    fn always_pass(_: &Input<'_>, _: &RuleArgs) -> Result<Verdict, PredicateError> {
        Ok(Verdict::pass("ok"))
    }

    fn always_fail(_: &Input<'_>, _: &RuleArgs) -> Result<Verdict, PredicateError> {
        Ok(Verdict::fail("no"))
    }

    fn boom(_: &Input<'_>, _: &RuleArgs) -> Result<Verdict, PredicateError> {
        panic!("predicate must not run")
    }

    fn test_registry() -> crate::rule::Registry {
        let mut builder = RegistryBuilder::new();
        builder
            .add("pass", Language::Generic, ArgShape::None, always_pass)
            .add("fail", Language::Generic, ArgShape::None, always_fail)
            .add("boom", Language::Generic, ArgShape::None, boom);
        builder.build()
    }

    fn item(subs: Vec<SubQuestion>) -> Item {
        let mut item = Item::new("q").with_response("answer");
        item.sub_questions = subs;
        item
    }

    fn result(item: &Item, id: i64) -> (u8, String) {
        let sub = item.sub_question(id).expect("sub-question");
        (sub.eval_result.expect("result"), sub.eval_explanation.clone().unwrap_or_default())
    }

    #[test]
    fn test_failed_dependency_short_circuits() {
        let registry = test_registry();
        let engine = Engine::with_dispatcher(Dispatcher::with_registry(&registry));
        let mut it = item(vec![
            SubQuestion::new(2, "b", "boom").with_dep([1]),
            SubQuestion::new(1, "a", "fail"),
        ]);
        let report = engine.evaluate_item(&mut it);
        assert_eq!(result(&it, 1).0, 0);
        assert_eq!(result(&it, 2), (0, DEPENDENCY_FAILED.to_string()));
        assert_eq!(report.short_circuited, 1);
        assert_eq!(report.failed, 2);
        assert!(it.sub_question(1).is_some_and(|s| s.depended_on));
        assert!(it.sub_question(2).is_some_and(|s| !s.depended_on));
    }

    #[test]
    fn test_passed_dependency_runs_dependent() {
        let registry = test_registry();
        let engine = Engine::with_dispatcher(Dispatcher::with_registry(&registry));
        let mut it = item(vec![
            SubQuestion::new(1, "a", "pass"),
            SubQuestion::new(2, "b", "pass").with_dep([1]),
        ]);
        let report = engine.evaluate_item(&mut it);
        assert!(report.all_passed());
        assert_eq!(report.sub_questions, 2);
    }

    #[test]
    fn test_cycle_fails_members() {
        let registry = test_registry();
        let engine = Engine::with_dispatcher(Dispatcher::with_registry(&registry));
        let mut it = item(vec![
            SubQuestion::new(1, "a", "boom").with_dep([2]),
            SubQuestion::new(2, "b", "boom").with_dep([1]),
            SubQuestion::new(3, "c", "pass"),
        ]);
        engine.evaluate_item(&mut it);
        assert_eq!(result(&it, 1), (0, DEPENDENCY_CYCLE.to_string()));
        assert_eq!(result(&it, 2), (0, DEPENDENCY_CYCLE.to_string()));
        assert_eq!(result(&it, 3).0, 1);
    }

    #[test]
    fn test_unknown_and_synthetic_dependencies_are_ignored() {
        let registry = test_registry();
        let engine = Engine::with_dispatcher(Dispatcher::with_registry(&registry));
        let mut failed_synthetic = SubQuestion::new(-1, "[0].a是否符合要求", "");
        failed_synthetic.record(Verdict::fail("required field missing"));
        let mut it = item(vec![
            failed_synthetic,
            SubQuestion::new(1, "a", "pass").with_dep([99, -1]),
        ]);
        engine.evaluate_item(&mut it);
        assert_eq!(result(&it, 1).0, 1);
    }

    #[test]
    fn test_duplicate_ids_fail_the_item() {
        let registry = test_registry();
        let engine = Engine::with_dispatcher(Dispatcher::with_registry(&registry));
        let mut it = item(vec![SubQuestion::new(1, "a", "pass"), SubQuestion::new(1, "b", "pass")]);
        let report = engine.evaluate_item(&mut it);
        assert_eq!(report.failed, 2);
        assert!(it.sub_questions[0]
            .eval_explanation
            .as_deref()
            .is_some_and(|e| e.contains("duplicate point_id 1")));
    }

    #[test]
    fn test_parts_default_to_response() {
        let mut it = item(vec![SubQuestion::new(1, "mentions answer", "keyword:[\"answer\"]")]);
        Engine::new().evaluate_item(&mut it);
        assert_eq!(result(&it, 1).0, 1);
    }

    #[test]
    fn test_tie_order_follows_list_position() {
        let it = item(vec![
            SubQuestion::new(5, "e", "pass"),
            SubQuestion::new(3, "c", "pass").with_dep([4]),
            SubQuestion::new(4, "d", "pass"),
        ]);
        let plan = plan(&it);
        assert_eq!(plan.order, vec![0, 2, 1]);
        assert!(plan.cyclic.is_empty());
    }

    #[test]
    fn test_reevaluation_is_stable() {
        let mut it = item(vec![
            SubQuestion::new(1, "a", "keyword:[\"answer\"]"),
            SubQuestion::new(2, "b", "each_length:[5,9]").with_dep([1]),
        ]);
        Engine::new().evaluate_item(&mut it);
        let first = it.clone();
        Engine::new().evaluate_item(&mut it);
        assert_eq!(first, it);
    }
}

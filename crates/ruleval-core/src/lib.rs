//! # ruleval-core
//!
//! Deterministic evaluation of LLM responses against constraint rules.
//!
//! An [`Item`] carries a prompt, the model's answer, and a list of
//! [`SubQuestion`]s. Each sub-question names a rule through a compact
//! descriptor (`each_length:[5,12]`, `german_article_der5`,
//! `SCHEMA:json_schema`) that is parsed, resolved against the rule
//! [`Registry`], and applied to the response fragments it targets.
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same item and parts always produce the same verdicts
//! 2. **No model calls**: Every rule is a pure function of text
//! 3. **Total**: A rule never aborts evaluation; errors become failing verdicts
//! 4. **Bilingual explanations**: Language rules explain in Chinese and English
//!
//! ## Example
//!
//! ```rust
//! use ruleval_core::{evaluate_item, Item, SubQuestion};
//!
//! let mut item = Item::new("Write two lines about autumn.")
//!     .with_response("Leaves fall softly\nThe wind turns cold")
//!     .with_sub_question(
//!         SubQuestion::new(1, "two lines", "item_count:[2,2]")
//!             .with_parts(["Leaves fall softly", "The wind turns cold"]),
//!     );
//!
//! let report = evaluate_item(&mut item);
//! assert!(report.all_passed());
//! assert_eq!(item.sub_questions[0].eval_result, Some(1));
//! ```

pub mod engine;
pub mod language;
pub mod predicates;
pub mod rule;
pub mod schema;
pub mod text;
pub mod types;

// Re-export main types at crate root
pub use engine::{Engine, EngineError, ItemReport, DEPENDENCY_CYCLE, DEPENDENCY_FAILED};
pub use language::Language;
pub use rule::{
    ArgShape, Descriptor, DescriptorError, Dispatcher, PredicateError, Registry, RegistryBuilder,
    RuleArgs, RuleSpec,
};
pub use schema::SchemaError;
pub use types::{Item, SubQuestion, Verdict, SCHEMA_RULE_PREFIX};

/// Evaluate one rule descriptor against `parts` of `item`'s response.
///
/// Uses the built-in registry. Never fails: unknown rules, bad arguments,
/// and predicate errors come back as failing verdicts.
pub fn evaluate(item: &Item, descriptor: &str, parts: &[String]) -> Verdict {
    Dispatcher::new().evaluate(item, descriptor, parts)
}

/// Evaluate every sub-question of `item` in place with the built-in registry.
pub fn evaluate_item(item: &mut Item) -> ItemReport {
    Engine::new().evaluate_item(item)
}

/// Names of every built-in rule, sorted.
pub fn rule_names() -> Vec<&'static str> {
    Registry::global().iter().map(|spec| spec.name.as_str()).collect()
}

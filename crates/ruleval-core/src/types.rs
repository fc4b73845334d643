//! Core data model: items, sub-questions, and verdicts.
//!
//! Items round-trip through the persisted JSON snapshots, so every struct
//! keeps unknown fields in a flattened `extra` map and the legacy Chinese
//! field names are preserved through serde renames.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Rule descriptor that marks a structured-output item.
pub const SCHEMA_RULE_PREFIX: &str = "SCHEMA";

/// One evaluation unit: a prompt, the model's latest answer, and its constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Prompt sent to the target model in the current round.
    pub question: String,

    /// Prompt as loaded from the dataset. Never rewritten.
    #[serde(default)]
    pub og_question: String,

    /// Constraints to check, in dataset order.
    #[serde(default)]
    pub sub_questions: Vec<SubQuestion>,

    /// Latest target-model answer.
    #[serde(default)]
    pub model_response: String,

    /// Present iff the item constrains structured output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<Value>,

    /// Taxonomy tag copied into synthetic results.
    #[serde(rename = "能力项", default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<String>,

    /// Optional language hint ("english", "de", "法语", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    /// Create an item whose current and original prompt are both `question`.
    pub fn new(question: impl Into<String>) -> Self {
        let question = question.into();
        Self {
            og_question: question.clone(),
            question,
            sub_questions: Vec::new(),
            model_response: String::new(),
            json_schema: None,
            capability: None,
            language: None,
            extra: Map::new(),
        }
    }

    /// Builder-style helper used heavily in tests and fixtures.
    pub fn with_sub_question(mut self, sub: SubQuestion) -> Self {
        self.sub_questions.push(sub);
        self
    }

    /// Set the model response.
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.model_response = response.into();
        self
    }

    /// Fill `og_question` from `question` for datasets that omit it.
    pub fn ensure_original_prompt(&mut self) {
        if self.og_question.is_empty() {
            self.og_question = self.question.clone();
        }
    }

    /// Whether any sub-question carries a failing result.
    pub fn has_failure(&self) -> bool {
        self.sub_questions
            .iter()
            .any(|s| s.eval_result == Some(0))
    }

    /// Whether this item constrains structured output.
    pub fn is_schema_item(&self) -> bool {
        self.json_schema.is_some()
            || self
                .sub_questions
                .iter()
                .any(|s| s.is_schema_rule())
    }

    /// Find a sub-question by id.
    pub fn sub_question(&self, point_id: i64) -> Option<&SubQuestion> {
        self.sub_questions.iter().find(|s| s.point_id == point_id)
    }
}

/// One constraint inside an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubQuestion {
    pub point_id: i64,

    /// Natural-language description; also guides part extraction.
    #[serde(default)]
    pub question: String,

    /// Rule descriptor, e.g. `each_length:[5,12]`.
    #[serde(default)]
    pub rule: String,

    /// Ids that must pass before this one is evaluated.
    #[serde(default)]
    pub dep: Vec<i64>,

    /// Whether another sub-question lists this one in its `dep`.
    #[serde(rename = "被依赖", default)]
    pub depended_on: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_result: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_explanation: Option<String>,

    /// Fragments of the response this constraint applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corresponding_parts: Option<Vec<String>>,

    #[serde(rename = "能力项", default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SubQuestion {
    /// Create a sub-question with a rule and description.
    pub fn new(point_id: i64, question: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            point_id,
            question: question.into(),
            rule: rule.into(),
            dep: Vec::new(),
            depended_on: false,
            eval_result: None,
            eval_explanation: None,
            corresponding_parts: None,
            capability: None,
            extra: Map::new(),
        }
    }

    /// Add dependencies.
    pub fn with_dep(mut self, dep: impl IntoIterator<Item = i64>) -> Self {
        self.dep.extend(dep);
        self
    }

    /// Attach pre-extracted parts.
    pub fn with_parts<S: Into<String>>(mut self, parts: impl IntoIterator<Item = S>) -> Self {
        self.corresponding_parts = Some(parts.into_iter().map(Into::into).collect());
        self
    }

    /// Negative ids are reserved for schema-expanded points.
    pub fn is_synthetic(&self) -> bool {
        self.point_id < 0
    }

    /// Whether the rule is a `SCHEMA:*` descriptor.
    pub fn is_schema_rule(&self) -> bool {
        let name = self.rule.split(':').next().unwrap_or_default().trim();
        name == SCHEMA_RULE_PREFIX
    }

    /// Record a verdict.
    pub fn record(&mut self, verdict: Verdict) {
        self.eval_result = Some(u8::from(verdict.passed));
        self.eval_explanation = Some(verdict.explanation);
    }

    /// Clear results before re-evaluation.
    pub fn reset(&mut self) {
        self.eval_result = None;
        self.eval_explanation = None;
    }

    /// Whether the recorded result is a pass.
    pub fn passed(&self) -> bool {
        self.eval_result == Some(1)
    }
}

/// Outcome of evaluating one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub passed: bool,
    pub explanation: String,
}

impl Verdict {
    pub fn pass(explanation: impl Into<String>) -> Self {
        Self::new(true, explanation)
    }

    pub fn fail(explanation: impl Into<String>) -> Self {
        Self::new(false, explanation)
    }

    /// Build a verdict. Empty explanations are replaced so results always carry text.
    pub fn new(passed: bool, explanation: impl Into<String>) -> Self {
        let mut explanation = explanation.into();
        if explanation.trim().is_empty() {
            explanation = if passed { "passed" } else { "failed" }.to_string();
        }
        Self {
            passed,
            explanation,
        }
    }

    /// Legacy `(0|1, explanation)` pair.
    pub fn as_pair(&self) -> (u8, &str) {
        (u8::from(self.passed), self.explanation.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_roundtrip_keeps_legacy_fields() {
        let raw = serde_json::json!({
            "question": "q",
            "og_question": "q",
            "model_response": "a",
            "能力项": "format",
            "source": "dataset-7",
            "sub_questions": [{
                "point_id": 1,
                "question": "has keyword",
                "rule": "keyword:[\"a\"]",
                "dep": [],
                "被依赖": true,
                "note": "kept"
            }]
        });
        let item: Item = serde_json::from_value(raw).unwrap();
        assert_eq!(item.capability.as_deref(), Some("format"));
        assert_eq!(item.extra["source"], "dataset-7");
        assert!(item.sub_questions[0].depended_on);

        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back["能力项"], "format");
        assert_eq!(back["sub_questions"][0]["被依赖"], true);
        assert_eq!(back["sub_questions"][0]["note"], "kept");
    }

    #[test]
    fn test_verdict_never_empty() {
        assert_eq!(Verdict::fail("").explanation, "failed");
        assert_eq!(Verdict::pass("  ").explanation, "passed");
        assert_eq!(Verdict::pass("ok").as_pair(), (1, "ok"));
    }

    #[test]
    fn test_schema_detection() {
        let item = Item::new("q").with_sub_question(SubQuestion::new(0, "s", "SCHEMA:json_schema"));
        assert!(item.is_schema_item());
        assert!(!Item::new("q").is_schema_item());
    }

    #[test]
    fn test_has_failure() {
        let mut sub = SubQuestion::new(1, "s", "jielong");
        sub.record(Verdict::fail("no"));
        let item = Item::new("q").with_sub_question(sub);
        assert!(item.has_failure());
    }
}

//! JSON-schema fan-out.
//!
//! Items whose rule is `SCHEMA:json_schema` are expanded before evaluation:
//! the schema is walked depth-first, every required property (and every
//! property under an array's item schema) that is a leaf becomes a
//! validation point, and each point is checked against every concrete data
//! element it addresses. Each check becomes a synthetic sub-question with a
//! negative `point_id`.
//!
//! ## Output order
//!
//! 1. The `SCHEMA` sub-question itself (whole-response conformance).
//! 2. Synthetic leaf points `-1, -2, ...`: schema point outer, data element inner.
//! 3. The remaining human-authored sub-questions in dataset order.
//!
//! Expansion first drops earlier synthetic points, so expanding twice is
//! the same as expanding once.

use serde_json::Value;
use thiserror::Error;

use crate::predicates::patterns::strip_code_fence;
use crate::rule::{Descriptor, SchemaMode};
use crate::types::{Item, SubQuestion, Verdict};

/// Suffix of every synthetic question text.
pub const POINT_QUESTION_SUFFIX: &str = "是否符合要求";

/// Errors from compiling an item's schema.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("failed to compile JSON schema: {0}")]
    Compile(String),
}

/// Compile a schema with the default draft detection.
pub fn compile(schema: &Value) -> Result<jsonschema::Validator, SchemaError> {
    jsonschema::options()
        .build(schema)
        .map_err(|e| SchemaError::Compile(e.to_string()))
}

/// Parse a model response as JSON, tolerating a surrounding code fence.
pub fn parse_response(response: &str) -> Result<Value, String> {
    serde_json::from_str(strip_code_fence(response)).map_err(|e| e.to_string())
}

/// Wrap a lone object in an array when the schema expects an array.
pub fn coerce_to_schema(value: Value, schema: &Value) -> Value {
    let wants_array = schema.get("type").and_then(Value::as_str) == Some("array");
    match value {
        Value::Object(_) if wants_array => Value::Array(vec![value]),
        other => other,
    }
}

/// Validation errors of `instance` against `schema`, each with its location.
pub fn conformance_errors(schema: &Value, instance: &Value) -> Result<Vec<String>, SchemaError> {
    let validator = compile(schema)?;
    Ok(validator
        .iter_errors(instance)
        .map(|e| {
            let at = e.instance_path.to_string();
            if at.is_empty() {
                e.to_string()
            } else {
                format!("{} at {}", e, at)
            }
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Key(String),
    Each,
}

/// One leaf of the schema walk.
#[derive(Debug, Clone)]
pub struct ValidationPoint {
    segments: Vec<Segment>,
    /// Whether the leaf is in its parent's `required` list.
    pub required: bool,
    /// The leaf's sub-schema.
    pub schema: Value,
}

impl ValidationPoint {
    /// Dotted path with `[*]` for array fan-out, e.g. `[*].name`.
    pub fn path(&self) -> String {
        render(self.segments.iter().map(|s| match s {
            Segment::Key(k) => PathPart::Key(k),
            Segment::Each => PathPart::Wildcard,
        }))
    }
}

enum PathPart<'a> {
    Key(&'a str),
    Index(usize),
    Wildcard,
}

fn render<'a>(parts: impl Iterator<Item = PathPart<'a>>) -> String {
    let mut out = String::new();
    for part in parts {
        match part {
            PathPart::Key(k) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(k);
            }
            PathPart::Index(i) => out.push_str(&format!("[{}]", i)),
            PathPart::Wildcard => out.push_str("[*]"),
        }
    }
    out
}

fn has_structure(schema: &Value) -> bool {
    schema.get("properties").is_some_and(Value::is_object)
        || schema
            .get("items")
            .is_some_and(has_structure)
}

/// Leaves of `schema` in depth-first order.
pub fn validation_points(schema: &Value) -> Vec<ValidationPoint> {
    let mut out = Vec::new();
    walk(schema, &mut Vec::new(), false, &mut out);
    out
}

fn walk(schema: &Value, path: &mut Vec<Segment>, in_array: bool, out: &mut Vec<ValidationPoint>) {
    if let Some(items) = schema.get("items") {
        if has_structure(items) {
            path.push(Segment::Each);
            walk(items, path, true, out);
            path.pop();
        }
        return;
    }
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return;
    };
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    for (name, child) in properties {
        let is_required = required.contains(&name.as_str());
        if !is_required && !in_array {
            continue;
        }
        path.push(Segment::Key(name.clone()));
        let before = out.len();
        if has_structure(child) {
            walk(child, path, in_array, out);
        }
        // a structured child with nothing required below it is checked as a whole
        if out.len() == before {
            out.push(ValidationPoint {
                segments: path.clone(),
                required: is_required,
                schema: child.clone(),
            });
        }
        path.pop();
    }
}

/// Concrete data locations addressed by a point: rendered path and value if present.
fn resolve<'v>(segments: &[Segment], data: Option<&'v Value>) -> Vec<(Vec<ConcretePart>, Option<&'v Value>)> {
    let Some((first, rest)) = segments.split_first() else {
        return vec![(Vec::new(), data)];
    };
    let prefixed = |part: ConcretePart, data: Option<&'v Value>| {
        resolve(rest, data)
            .into_iter()
            .map(move |(mut parts, value)| {
                parts.insert(0, part.clone());
                (parts, value)
            })
            .collect::<Vec<_>>()
    };
    match first {
        Segment::Key(k) => prefixed(ConcretePart::Key(k.clone()), data.and_then(|d| d.get(k))),
        Segment::Each => match data.and_then(Value::as_array) {
            Some(elements) => elements
                .iter()
                .enumerate()
                .flat_map(|(i, el)| prefixed(ConcretePart::Index(i), Some(el)))
                .collect(),
            None => prefixed(ConcretePart::Wildcard, None),
        },
    }
}

#[derive(Debug, Clone)]
enum ConcretePart {
    Key(String),
    Index(usize),
    Wildcard,
}

fn render_concrete(parts: &[ConcretePart]) -> String {
    render(parts.iter().map(|p| match p {
        ConcretePart::Key(k) => PathPart::Key(k),
        ConcretePart::Index(i) => PathPart::Index(*i),
        ConcretePart::Wildcard => PathPart::Wildcard,
    }))
}

/// A checked leaf location.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCheck {
    pub path: String,
    pub verdict: Verdict,
}

/// Check every point against the data. Points outer, elements inner.
pub fn check_points(points: &[ValidationPoint], data: &Value) -> Vec<PointCheck> {
    let mut out = Vec::new();
    for point in points {
        let validator = compile(&point.schema);
        for (parts, value) in resolve(&point.segments, Some(data)) {
            let path = render_concrete(&parts);
            let verdict = match (value, &validator) {
                (None, _) if point.required => Verdict::fail("required field missing"),
                (None, _) => Verdict::pass("optional field absent"),
                (Some(_), Err(e)) => Verdict::fail(e.to_string()),
                (Some(v), Ok(validator)) => {
                    let errors: Vec<String> = validator.iter_errors(v).map(|e| e.to_string()).collect();
                    if errors.is_empty() {
                        Verdict::pass("valid")
                    } else {
                        Verdict::fail(errors.join("; "))
                    }
                }
            };
            out.push(PointCheck { path, verdict });
        }
    }
    out
}

/// Whether a descriptor requests schema fan-out.
fn is_fan_out_rule(sub: &SubQuestion) -> bool {
    if !sub.is_schema_rule() {
        return false;
    }
    let Ok(descriptor) = Descriptor::parse(&sub.rule) else {
        return false;
    };
    matches!(
        crate::rule::ArgShape::Schema.parse(None, descriptor.arg.as_ref()),
        Ok(args) if args.schema_mode().ok() == Some(SchemaMode::JsonSchema)
    )
}

/// Expand a schema item in place. Returns the number of synthetic points.
///
/// Items without a schema or without a `SCHEMA:json_schema` sub-question are
/// left untouched.
pub fn expand(item: &mut Item) -> Result<usize, SchemaError> {
    let Some(schema) = item.json_schema.clone() else {
        return Ok(0);
    };
    let Some(anchor_idx) = item.sub_questions.iter().position(is_fan_out_rule) else {
        return Ok(0);
    };
    compile(&schema)?;

    let mut subs = std::mem::take(&mut item.sub_questions);
    let anchor = subs.remove(anchor_idx);
    let humans: Vec<SubQuestion> = subs.into_iter().filter(|s| !s.is_synthetic()).collect();
    let capability = anchor.capability.clone().or_else(|| item.capability.clone());

    let points = validation_points(&schema);
    let checks = match parse_response(&item.model_response) {
        Ok(data) => check_points(&points, &coerce_to_schema(data, &schema)),
        Err(e) => points
            .iter()
            .map(|p| PointCheck {
                path: p.path(),
                verdict: Verdict::fail(format!("JSON parse failed: {}", e)),
            })
            .collect(),
    };

    let synthetic: Vec<SubQuestion> = checks
        .into_iter()
        .enumerate()
        .map(|(i, check)| {
            let mut sub = SubQuestion::new(
                -(i as i64 + 1),
                format!("{}{}", check.path, POINT_QUESTION_SUFFIX),
                "",
            );
            sub.capability = capability.clone();
            sub.record(check.verdict);
            sub
        })
        .collect();
    let count = synthetic.len();
    tracing::debug!(points = points.len(), synthetic = count, "Expanded schema item");

    item.sub_questions = std::iter::once(anchor)
        .chain(synthetic)
        .chain(humans)
        .collect();
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn s5_schema() -> Value {
        json!({
            "type": "array",
            "items": {
                "type": "object",
                "required": ["name", "age"],
                "properties": {
                    "name": {"type": "string"},
                    "age": {"type": "integer"}
                }
            }
        })
    }

    fn s5_item(response: &str) -> Item {
        let mut item = Item::new("List people as JSON")
            .with_sub_question(SubQuestion::new(0, "matches schema", "SCHEMA:json_schema"))
            .with_sub_question(SubQuestion::new(1, "short", "item_count:[1,3]"))
            .with_response(response);
        item.json_schema = Some(s5_schema());
        item.capability = Some("结构化输出".to_string());
        item
    }

    #[test]
    fn test_validation_points_dfs() {
        let paths: Vec<String> = validation_points(&s5_schema()).iter().map(|p| p.path()).collect();
        assert_eq!(paths, vec!["[*].name", "[*].age"]);
    }

    #[test]
    fn test_top_level_object_only_required() {
        let schema = json!({
            "type": "object",
            "required": ["a", "b"],
            "properties": {
                "a": {"type": "string"},
                "b": {"type": "object", "required": ["c"], "properties": {"c": {"type": "number"}, "d": {}}},
                "e": {"type": "string"}
            }
        });
        let paths: Vec<String> = validation_points(&schema).iter().map(|p| p.path()).collect();
        assert_eq!(paths, vec!["a", "b.c"]);
    }

    #[test]
    fn test_required_object_without_required_children_is_a_point() {
        let schema = json!({
            "type": "object",
            "required": ["meta"],
            "properties": {
                "meta": {"type": "object", "properties": {"tag": {"type": "string"}}}
            }
        });
        let points = validation_points(&schema);
        let paths: Vec<String> = points.iter().map(|p| p.path()).collect();
        assert_eq!(paths, vec!["meta"]);
        assert!(points[0].required);

        let checks = check_points(&points, &json!({}));
        assert_eq!(checks[0].path, "meta");
        assert_eq!(checks[0].verdict.as_pair(), (0, "required field missing"));

        let checks = check_points(&points, &json!({"meta": {"tag": 7}}));
        assert!(!checks[0].verdict.passed);

        let checks = check_points(&points, &json!({"meta": {"tag": "x"}}));
        assert!(checks[0].verdict.passed);
    }

    #[test]
    fn test_s5_fan_out() {
        let mut item = s5_item(r#"[{"name":"A","age":3},{"name":"B"}]"#);
        assert_eq!(expand(&mut item).unwrap(), 4);
        let ids: Vec<i64> = item.sub_questions.iter().map(|s| s.point_id).collect();
        assert_eq!(ids, vec![0, -1, -2, -3, -4, 1]);
        let synthetic: Vec<(&str, Option<u8>)> = item.sub_questions[1..5]
            .iter()
            .map(|s| (s.question.as_str(), s.eval_result))
            .collect();
        assert_eq!(
            synthetic,
            vec![
                ("[0].name是否符合要求", Some(1)),
                ("[1].name是否符合要求", Some(1)),
                ("[0].age是否符合要求", Some(1)),
                ("[1].age是否符合要求", Some(0)),
            ]
        );
        assert_eq!(
            item.sub_questions[4].eval_explanation.as_deref(),
            Some("required field missing")
        );
        assert_eq!(item.sub_questions[1].capability.as_deref(), Some("结构化输出"));
    }

    #[test]
    fn test_expansion_is_idempotent() {
        let mut item = s5_item(r#"[{"name":"A","age":3},{"name":"B"}]"#);
        expand(&mut item).unwrap();
        let once = item.clone();
        expand(&mut item).unwrap();
        assert_eq!(once, item);
    }

    #[test]
    fn test_lone_object_is_coerced() {
        let mut item = s5_item(r#"```json
{"name":"A","age":"three"}
```"#);
        assert_eq!(expand(&mut item).unwrap(), 2);
        assert_eq!(item.sub_questions[1].eval_result, Some(1));
        assert_eq!(item.sub_questions[2].eval_result, Some(0));
    }

    #[test]
    fn test_malformed_json_fails_every_point() {
        let mut item = s5_item("not json at all");
        assert_eq!(expand(&mut item).unwrap(), 2);
        for sub in &item.sub_questions[1..3] {
            assert_eq!(sub.eval_result, Some(0));
            assert!(sub
                .eval_explanation
                .as_deref()
                .unwrap_or_default()
                .starts_with("JSON parse failed:"));
        }
        assert_eq!(item.sub_questions[1].question, "[*].name是否符合要求");
    }

    #[test]
    fn test_list_mode_is_not_expanded() {
        let mut item = s5_item("[]");
        item.sub_questions[0].rule = "SCHEMA:list".to_string();
        assert_eq!(expand(&mut item).unwrap(), 0);
        assert_eq!(item.sub_questions.len(), 2);
    }

    #[test]
    fn test_bad_schema_is_an_error() {
        let mut item = s5_item("[]");
        item.json_schema = Some(json!({"type": 12}));
        assert!(matches!(expand(&mut item), Err(SchemaError::Compile(_))));
    }
}

//! End-to-end evaluation of whole items through the public API.

use proptest::prelude::*;
use ruleval_core::{evaluate, evaluate_item, Engine, Item, SubQuestion, DEPENDENCY_FAILED};
use serde_json::json;

fn parts(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

fn single(question: &str, response: &str, sub: SubQuestion) -> Item {
    Item::new(question).with_response(response).with_sub_question(sub)
}

#[test]
fn test_keyword_pass() {
    let mut item = single(
        "Mention Paris and Lyon.",
        "Paris is lovely; Lyon too.",
        SubQuestion::new(1, "mentions both cities", "keyword:[\"Paris\",\"Lyon\"]")
            .with_parts(["Paris is lovely; Lyon too."]),
    );
    evaluate_item(&mut item);
    let sub = &item.sub_questions[0];
    assert_eq!(sub.eval_result, Some(1));
    assert_eq!(sub.eval_explanation.as_deref(), Some("all keywords present"));
}

#[test]
fn test_keyword_echo_excluded() {
    let mut item = single(
        "Write about Paris and Lyon.",
        "Lyon is nice.",
        SubQuestion::new(1, "mentions both cities", "keyword:[\"Paris\",\"Lyon\"]"),
    );
    evaluate_item(&mut item);
    assert_eq!(item.sub_questions[0].eval_result, Some(0));
}

#[test]
fn test_each_length_range() {
    let item = Item::new("Two sentences.").with_response("one two three\nfour five");
    let v = evaluate(&item, "each_length:[3,5]", &parts(&["one two three", "four five"]));
    assert!(!v.passed);
    assert!(v.explanation.contains("part 2"), "{}", v.explanation);
}

#[test]
fn test_jielong() {
    let chain = ["画蛇添足", "足智多谋", "谋事在人"];
    let mut item = single(
        "成语接龙，写三个。",
        "画蛇添足，足智多谋，谋事在人",
        SubQuestion::new(1, "成语接龙", "jielong").with_parts(chain),
    );
    evaluate_item(&mut item);
    assert_eq!(item.sub_questions[0].eval_result, Some(1));

    let broken = evaluate(&item, "jielong", &parts(&["画蛇添足", "智勇双全"]));
    assert!(!broken.passed);
}

#[test]
fn test_json_schema_fan_out() {
    let mut item = Item::new("List people as JSON.")
        .with_response(r#"[{"name":"A","age":3},{"name":"B"}]"#)
        .with_sub_question(SubQuestion::new(0, "matches the schema", "SCHEMA:json_schema"))
        .with_sub_question(SubQuestion::new(1, "two entries", "item_count:[2,2]").with_parts(["A", "B"]));
    item.json_schema = Some(json!({
        "type": "array",
        "items": {
            "type": "object",
            "required": ["name", "age"],
            "properties": {
                "name": {"type": "string"},
                "age": {"type": "integer"}
            }
        }
    }));

    let report = evaluate_item(&mut item);

    let ids: Vec<i64> = item.sub_questions.iter().map(|s| s.point_id).collect();
    assert_eq!(ids, vec![0, -1, -2, -3, -4, 1]);
    assert_eq!(item.sub_questions[0].eval_result, Some(0), "second element lacks age");

    let age_missing = item
        .sub_questions
        .iter()
        .find(|s| s.question == "[1].age是否符合要求")
        .expect("synthetic age point");
    assert_eq!(age_missing.eval_result, Some(0));
    assert_eq!(age_missing.eval_explanation.as_deref(), Some("required field missing"));

    assert_eq!(item.sub_question(1).and_then(|s| s.eval_result), Some(1));
    assert_eq!(report.sub_questions, 6);
    assert_eq!(report.failed, 2);
}

#[test]
fn test_french_rhyme_pattern() {
    let item = Item::new("Écris un quatrain.").with_response("");
    let verses = parts(&[
        "Sous la pâle lune",
        "Dort le vieux chien",
        "Tout est bien",
        "Dans la nuit brune",
    ]);
    assert!(evaluate(&item, "french_rhyme_pattern:ABBA", &verses).passed);
    for other in ["ABAB", "AABB", "ABCD", "AAAA"] {
        let v = evaluate(&item, &format!("french_rhyme_pattern:{}", other), &verses);
        assert!(!v.passed, "{} should fail", other);
    }
}

#[test]
fn test_dependents_short_circuit_end_to_end() {
    let mut item = Item::new("Answer in German.")
        .with_response("Hello there.")
        .with_sub_question(SubQuestion::new(1, "mentions Haus", "keyword:[\"Haus\"]"))
        .with_sub_question(SubQuestion::new(2, "uses der twice", "german_article_der:2").with_dep([1]));
    Engine::new().evaluate_item(&mut item);
    assert_eq!(item.sub_question(1).and_then(|s| s.eval_result), Some(0));
    let dependent = item.sub_question(2).expect("dependent");
    assert_eq!(dependent.eval_result, Some(0));
    assert_eq!(dependent.eval_explanation.as_deref(), Some(DEPENDENCY_FAILED));
    assert!(item.sub_question(1).is_some_and(|s| s.depended_on));
}

proptest! {
    #[test]
    fn prop_evaluation_is_pure(response in "\\PC{0,60}", rule_idx in 0usize..6) {
        let rules = [
            "each_length:[1,5]",
            "keyword:[\"a\"]",
            "no_digits",
            "sentence_count:[1,3]",
            "english_pangram",
            "chinese_reduplication_count:[0,2]",
        ];
        let build = || {
            Item::new("prompt")
                .with_response(response.clone())
                .with_sub_question(SubQuestion::new(1, "check", rules[rule_idx]))
        };
        let mut first = build();
        let mut second = build();
        evaluate_item(&mut first);
        evaluate_item(&mut second);
        prop_assert_eq!(&first, &second);
        prop_assert!(first.sub_questions[0].eval_result.is_some());
        prop_assert!(!first.sub_questions[0].eval_explanation.clone().unwrap_or_default().is_empty());
    }
}

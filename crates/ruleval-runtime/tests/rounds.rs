//! End-to-end round orchestration with fake and mocked model endpoints.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ruleval_core::{Item, SubQuestion};
use ruleval_runtime::{
    CompletionConfig, EchoProvider, EndpointConfig, LlmProvider, ProviderError, RetryPolicy,
    RoundOrchestrator, RoundOrchestratorBuilder, RuntimeConfig,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Extraction stand-in that always answers with the same reply.
struct FixedExtraction(&'static str);

#[async_trait]
impl LlmProvider for FixedExtraction {
    async fn complete(
        &self,
        prompts: &[String],
        _config: &CompletionConfig,
    ) -> Result<Vec<String>, ProviderError> {
        Ok(vec![self.0.to_string(); prompts.len()])
    }

    fn name(&self) -> &str {
        "fixed-extraction"
    }
}

/// Legacy-style endpoint answering every prompt in the batch with `reply`.
struct BatchReply(&'static str);

impl Respond for BatchReply {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let n = body["prompt"].as_array().map_or(0, |a| a.len());
        ResponseTemplate::new(200)
            .set_body_json(serde_json::json!({ "completions": vec![self.0; n] }))
    }
}

fn dataset() -> Vec<Item> {
    vec![
        Item::new("Mention Paris and Lyon.")
            .with_sub_question(SubQuestion::new(1, "Mention both cities", r#"keyword:["Paris","Lyon"]"#)),
        Item::new("Write exactly two lines.")
            .with_sub_question(SubQuestion::new(1, "Two lines", "item_count:[2,2]"))
            .with_sub_question(SubQuestion::new(2, "No digits", "no_digits").with_dep([1])),
    ]
}

fn config(dir: &std::path::Path) -> RuntimeConfig {
    RuntimeConfig {
        output_dir: dir.to_path_buf(),
        batch_size: 1,
        retry: RetryPolicy {
            max_attempts: 2,
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        },
        ..RuntimeConfig::default()
    }
}

#[tokio::test]
async fn test_identity_target_gives_identical_snapshots() {
    let mut snapshots = Vec::new();
    for _ in 0..2 {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = RoundOrchestrator::new(
            Arc::new(EchoProvider::new()),
            Arc::new(FixedExtraction("not an array")),
            config(dir.path()),
        );
        let report = orchestrator.run(dataset()).await.unwrap();
        assert_eq!(report.rounds.len(), 2);

        let round_0 = std::fs::read(dir.path().join("round_0.json")).unwrap();
        let round_1 = std::fs::read(dir.path().join("round_1.json")).unwrap();
        snapshots.push((round_0, round_1));
    }
    assert_eq!(snapshots[0], snapshots[1]);
}

#[tokio::test]
async fn test_original_prompt_survives_rounds() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = RoundOrchestrator::new(
        Arc::new(EchoProvider::new()),
        Arc::new(FixedExtraction("[]")),
        config(dir.path()),
    );
    let report = orchestrator.run(dataset()).await.unwrap();

    for (before, after) in dataset().iter().zip(&report.items) {
        assert_eq!(before.og_question, after.og_question);
        assert_ne!(after.question, after.og_question);
    }

    // Dependency short-circuit is visible in the snapshot.
    let round_0 = orchestrator.store().load_round(0).unwrap();
    let dependent = &round_0[1].sub_questions[1];
    assert_eq!(dependent.eval_result, Some(0));
    assert_eq!(dependent.eval_explanation.as_deref(), Some("dependency failed"));
}

#[tokio::test]
async fn test_mocked_endpoints_with_extraction_fallback() {
    let target = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "Paris at dawn.\nLyon at dusk."}}]
        })))
        .mount(&target)
        .await;

    let primary = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&primary)
        .await;

    let coder = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(BatchReply(r#"["Paris at dawn.", "Lyon at dusk."]"#))
        .mount(&coder)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(dir.path());
    cfg.target = EndpointConfig {
        model: Some("tested".to_string()),
        ..EndpointConfig::new("openai").with_base_url(format!("{}/v1", target.uri()))
    };
    cfg.extraction = EndpointConfig::new("qwen").with_base_url(primary.uri());
    cfg.extraction_fallback =
        Some(EndpointConfig::new("qwen").with_base_url(format!("{}/generate", coder.uri())));

    let orchestrator = RoundOrchestratorBuilder::new().config(cfg).build().unwrap();
    let report = orchestrator.run(dataset()).await.unwrap();

    assert_eq!(report.rounds.len(), 1, "everything passes in round 0");
    let summary = report.last_round().unwrap();
    assert_eq!(summary.sub_questions, 3);
    assert_eq!(summary.passed, 3);
    assert_eq!(
        report.items[1].sub_questions[0].corresponding_parts,
        Some(vec!["Paris at dawn.".to_string(), "Lyon at dusk.".to_string()])
    );
}

#[tokio::test]
async fn test_resume_after_complete_run_does_nothing_new() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = RoundOrchestrator::new(
        Arc::new(EchoProvider::new()),
        Arc::new(FixedExtraction("[]")),
        config(dir.path()),
    );
    orchestrator.run(dataset()).await.unwrap();
    let before = std::fs::read(dir.path().join("round_1.json")).unwrap();

    let report = orchestrator.resume_or_run(dataset()).await.unwrap();
    assert_eq!(report.rounds.len(), 2);
    assert!(!dir.path().join("round_2.json").exists());
    assert_eq!(std::fs::read(dir.path().join("round_1.json")).unwrap(), before);
}

//! Part extraction through an auxiliary model.
//!
//! For every human-authored sub-question the extraction model is shown the
//! original prompt, the answer, and the constraint text, and replies with a
//! JSON array of the fragments the constraint applies to. Those fragments
//! become the sub-question's `corresponding_parts`.
//!
//! Extraction never fails an item. An unreachable model, a reply that is
//! not a JSON array, or an empty array all leave the whole answer as the
//! single part.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use ruleval_core::Item;
use serde_json::Value as JsonValue;

use crate::cache::{CacheKey, ExtractionCache};
use crate::prompts::extraction_prompt;
use crate::providers::{CompletionConfig, LlmProvider};

lazy_static! {
    // First '[' through last ']', across lines; tolerates code fences and chatter.
    static ref JSON_ARRAY: Regex = Regex::new(r"(?s)\[.*\]").unwrap();
}

/// Counters for one extraction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    /// Sub-questions that needed parts.
    pub requested: usize,
    /// Served from the cache without a model call.
    pub cached: usize,
    /// Fell back to the whole answer.
    pub fallbacks: usize,
}

/// Fills `corresponding_parts` on every human-authored sub-question.
pub struct PartExtractor {
    provider: Arc<dyn LlmProvider>,
    cache: ExtractionCache,
    completion: CompletionConfig,
    batch_size: usize,
}

struct Pending {
    item: usize,
    sub: usize,
    key: CacheKey,
    prompt: String,
}

impl PartExtractor {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            cache: ExtractionCache::default(),
            completion: CompletionConfig::default(),
            batch_size: 5,
        }
    }

    pub fn with_cache(mut self, cache: ExtractionCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_completion(mut self, completion: CompletionConfig) -> Self {
        self.completion = completion;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn cache(&self) -> &ExtractionCache {
        &self.cache
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    /// Extract parts for every item in place.
    ///
    /// Synthetic and `SCHEMA` sub-questions are skipped; schema checks read
    /// the raw answer.
    pub async fn extract(&self, items: &mut [Item]) -> ExtractionStats {
        let mut stats = ExtractionStats::default();
        let mut pending = Vec::new();

        for (i, item) in items.iter_mut().enumerate() {
            let response = item.model_response.clone();
            for (j, sub) in item.sub_questions.iter_mut().enumerate() {
                if sub.is_synthetic() || sub.is_schema_rule() {
                    continue;
                }
                stats.requested += 1;

                if response.trim().is_empty() {
                    sub.corresponding_parts = Some(vec![response.clone()]);
                    stats.fallbacks += 1;
                    continue;
                }

                let key = CacheKey::new(&item.og_question, &response, &sub.question);
                if let Some(parts) = self.cache.get(&key).await {
                    sub.corresponding_parts = Some(parts);
                    stats.cached += 1;
                    continue;
                }

                pending.push(Pending {
                    item: i,
                    sub: j,
                    key,
                    prompt: extraction_prompt(&item.og_question, &response, &sub.question),
                });
            }
        }

        for chunk in pending.chunks(self.batch_size) {
            let prompts: Vec<String> = chunk.iter().map(|p| p.prompt.clone()).collect();
            let replies = match self.provider.complete(&prompts, &self.completion).await {
                Ok(replies) if replies.len() == prompts.len() => replies,
                Ok(replies) => {
                    tracing::warn!(
                        endpoint = %self.provider.name(),
                        expected = prompts.len(),
                        got = replies.len(),
                        "Extraction reply count mismatch, using whole answers"
                    );
                    vec![String::new(); prompts.len()]
                }
                Err(e) => {
                    tracing::warn!(
                        endpoint = %self.provider.name(),
                        error = %e,
                        batch = prompts.len(),
                        "Extraction failed, using whole answers"
                    );
                    vec![String::new(); prompts.len()]
                }
            };

            for (job, reply) in chunk.iter().zip(replies) {
                let item = &mut items[job.item];
                let parts = match parse_parts(&reply) {
                    Some(parts) => {
                        self.cache.insert(job.key, parts.clone()).await;
                        parts
                    }
                    None => {
                        tracing::debug!(
                            point_id = item.sub_questions[job.sub].point_id,
                            "Unusable extraction reply, using whole answer"
                        );
                        stats.fallbacks += 1;
                        vec![item.model_response.clone()]
                    }
                };
                item.sub_questions[job.sub].corresponding_parts = Some(parts);
            }
        }

        stats
    }
}

/// Parse an extraction reply into fragments.
///
/// Numbers and booleans are stringified, nested values and blank strings
/// are dropped. `None` when no non-empty array can be read.
pub fn parse_parts(reply: &str) -> Option<Vec<String>> {
    let array = JSON_ARRAY.find(reply)?.as_str();
    let values: Vec<JsonValue> = serde_json::from_str(array).ok()?;
    let parts: Vec<String> = values
        .into_iter()
        .filter_map(|v| match v {
            JsonValue::String(s) => Some(s),
            JsonValue::Number(n) => Some(n.to_string()),
            JsonValue::Bool(b) => Some(b.to_string()),
            _ => None,
        })
        .filter(|s| !s.trim().is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderError;
    use async_trait::async_trait;
    use ruleval_core::SubQuestion;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replies with a fixed string per prompt and counts prompts seen.
    struct Scripted {
        reply: Result<String, u16>,
        prompts_seen: AtomicUsize,
    }

    impl Scripted {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                prompts_seen: AtomicUsize::new(0),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                reply: Err(status),
                prompts_seen: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for Scripted {
        async fn complete(
            &self,
            prompts: &[String],
            _config: &CompletionConfig,
        ) -> Result<Vec<String>, ProviderError> {
            self.prompts_seen.fetch_add(prompts.len(), Ordering::SeqCst);
            match &self.reply {
                Ok(text) => Ok(vec![text.clone(); prompts.len()]),
                Err(status) => Err(ProviderError::ApiError {
                    status: *status,
                    message: "down".to_string(),
                }),
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn item() -> Item {
        Item::new("List two cities.")
            .with_response("Paris. Lyon.")
            .with_sub_question(SubQuestion::new(1, "The cities", "item_count:[2,2]"))
            .with_sub_question(SubQuestion::new(2, "Whole answer", "keyword:[\"Paris\"]"))
            .with_sub_question(SubQuestion::new(-1, "[0]是否符合要求", "SCHEMA:json_schema"))
    }

    #[test]
    fn test_parse_parts() {
        assert_eq!(
            parse_parts("```json\n[\"Paris\", \"Lyon\"]\n```"),
            Some(vec!["Paris".to_string(), "Lyon".to_string()])
        );
        assert_eq!(
            parse_parts("Fragments: [1, \"  \", \"x\", {\"a\": 1}]"),
            Some(vec!["1".to_string(), "x".to_string()])
        );
        assert_eq!(parse_parts("[]"), None);
        assert_eq!(parse_parts("no array here"), None);
        assert_eq!(parse_parts("[unterminated"), None);
    }

    #[tokio::test]
    async fn test_extract_fills_parts_and_caches() {
        let provider = Arc::new(Scripted::ok("[\"Paris.\", \"Lyon.\"]"));
        let extractor = PartExtractor::new(provider.clone()).with_batch_size(1);
        let mut items = vec![item()];

        let stats = extractor.extract(&mut items).await;
        assert_eq!(stats, ExtractionStats { requested: 2, cached: 0, fallbacks: 0 });
        assert_eq!(provider.prompts_seen.load(Ordering::SeqCst), 2);
        assert_eq!(
            items[0].sub_questions[0].corresponding_parts,
            Some(vec!["Paris.".to_string(), "Lyon.".to_string()])
        );
        assert!(items[0].sub_questions[2].corresponding_parts.is_none());

        let stats = extractor.extract(&mut items).await;
        assert_eq!(stats.cached, 2);
        assert_eq!(provider.prompts_seen.load(Ordering::SeqCst), 2);

        extractor.cache().invalidate_all();
        let stats = extractor.extract(&mut items).await;
        assert_eq!(stats.cached, 0);
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_whole_answer() {
        let extractor = PartExtractor::new(Arc::new(Scripted::failing(500)));
        let mut items = vec![item()];

        let stats = extractor.extract(&mut items).await;
        assert_eq!(stats.fallbacks, 2);
        for sub in &items[0].sub_questions[..2] {
            assert_eq!(sub.corresponding_parts, Some(vec!["Paris. Lyon.".to_string()]));
        }
    }

    #[tokio::test]
    async fn test_malformed_reply_is_not_cached() {
        let provider = Arc::new(Scripted::ok("I cannot help with that."));
        let extractor = PartExtractor::new(provider.clone());
        let mut items = vec![item()];

        extractor.extract(&mut items).await;
        let stats = extractor.extract(&mut items).await;
        assert_eq!(stats.cached, 0);
        assert_eq!(stats.fallbacks, 2);
        assert_eq!(provider.prompts_seen.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_empty_answer_skips_model() {
        let provider = Arc::new(Scripted::ok("[\"x\"]"));
        let extractor = PartExtractor::new(provider.clone());
        let mut items = vec![item().with_response("")];

        let stats = extractor.extract(&mut items).await;
        assert_eq!(stats.fallbacks, 2);
        assert_eq!(provider.prompts_seen.load(Ordering::SeqCst), 0);
        assert_eq!(items[0].sub_questions[0].corresponding_parts, Some(vec![String::new()]));
    }
}

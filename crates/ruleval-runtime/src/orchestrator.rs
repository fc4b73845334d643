//! Multi-round evaluation driver.
//!
//! Each round:
//! 1. From round 1 on, keeps only items with a failing sub-question and
//!    rewrites their prompt as the original prompt plus a failure recap
//! 2. Queries the target model in batches; a failed batch leaves its
//!    items with an empty answer instead of aborting the run
//! 3. Extracts corresponding parts
//! 4. Evaluates every item through the engine
//! 5. Writes `round_<N>.json` and the updated `summary.json`
//!
//! Rounds stop early once nothing fails. A round that is interrupted
//! before step 5 leaves no snapshot behind, so `resume_or_run` picks up
//! from the last complete round.

use std::sync::Arc;
use std::time::Duration;

use ruleval_core::{Engine, Item, ItemReport};
use thiserror::Error;

use crate::cache::ExtractionCache;
use crate::config::{ConfigError, EndpointConfig, RuntimeConfig};
use crate::extractor::PartExtractor;
use crate::prompts::failure_recap;
use crate::providers::{LlmProvider, ProviderError, ProviderRegistry};
use crate::resilience::{CircuitBreaker, FallbackProvider, GuardedProvider};
use crate::snapshot::{RoundSummary, SnapshotError, SnapshotStore};

/// Errors from the round orchestrator.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Outcome of a run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Every finished round, including rounds from a resumed run.
    pub rounds: Vec<RoundSummary>,

    /// Items as evaluated in the last round that ran.
    pub items: Vec<Item>,
}

impl RunReport {
    pub fn last_round(&self) -> Option<&RoundSummary> {
        self.rounds.last()
    }
}

/// Drives rounds of query, extract, evaluate, persist.
pub struct RoundOrchestrator {
    target: Arc<dyn LlmProvider>,
    extractor: PartExtractor,
    engine: Engine<'static>,
    store: SnapshotStore,
    config: RuntimeConfig,
}

impl RoundOrchestrator {
    pub fn new(
        target: Arc<dyn LlmProvider>,
        extraction: Arc<dyn LlmProvider>,
        config: RuntimeConfig,
    ) -> Self {
        let extractor = PartExtractor::new(extraction)
            .with_cache(ExtractionCache::new(&config.cache))
            .with_completion(config.completion.clone())
            .with_batch_size(config.batch_size);
        Self {
            target,
            extractor,
            engine: Engine::new(),
            store: SnapshotStore::new(config.output_dir.clone()),
            config,
        }
    }

    pub fn target(&self) -> &Arc<dyn LlmProvider> {
        &self.target
    }

    pub fn extraction(&self) -> &Arc<dyn LlmProvider> {
        self.extractor.provider()
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Run every configured round from round 0.
    pub async fn run(&self, items: Vec<Item>) -> Result<RunReport, RuntimeError> {
        self.run_from(items, 0, Vec::new()).await
    }

    /// Continue after the newest snapshot in the output directory, or start
    /// fresh with `items` when there is none.
    pub async fn resume_or_run(&self, items: Vec<Item>) -> Result<RunReport, RuntimeError> {
        let Some(last) = self.store.latest_round()? else {
            return self.run(items).await;
        };

        let restored = self.store.load_round(last)?;
        let mut summaries = self.store.load_summary()?;
        summaries.retain(|s| s.round <= last);
        tracing::info!(
            round = last,
            items = restored.len(),
            dir = %self.store.dir().display(),
            "Resuming from snapshot"
        );
        self.run_from(restored, last + 1, summaries).await
    }

    /// Run rounds `first_round..config.rounds` starting from `items`.
    pub async fn run_from(
        &self,
        mut items: Vec<Item>,
        first_round: u32,
        mut summaries: Vec<RoundSummary>,
    ) -> Result<RunReport, RuntimeError> {
        for round in first_round..self.config.rounds {
            if round > 0 {
                items.retain(Item::has_failure);
                if items.is_empty() {
                    tracing::info!(round, "No failing items left, stopping");
                    break;
                }
                for item in &mut items {
                    let recap = failure_recap(
                        &item.og_question,
                        item.sub_questions
                            .iter()
                            .filter(|s| s.eval_result == Some(0))
                            .map(|s| s.question.as_str()),
                    );
                    item.question = recap;
                }
            }

            let report = self.run_round(round, &mut items).await;
            self.store.write_round(round, &items)?;

            let summary = RoundSummary::new(round, items.len(), &report);
            tracing::info!(
                round,
                items = summary.items,
                sub_questions = summary.sub_questions,
                passed = summary.passed,
                failed = summary.failed,
                pass_rate = summary.pass_rate,
                "Round complete"
            );
            summaries.push(summary);
            self.store.write_summary(&summaries)?;
        }

        Ok(RunReport {
            rounds: summaries,
            items,
        })
    }

    async fn run_round(&self, round: u32, items: &mut [Item]) -> ItemReport {
        tracing::info!(round, items = items.len(), "Round started");
        self.query_target(round, items).await;

        let stats = self.extractor.extract(items).await;
        tracing::debug!(
            round,
            requested = stats.requested,
            cached = stats.cached,
            fallbacks = stats.fallbacks,
            "Parts extracted"
        );

        self.engine.evaluate_all(items)
    }

    async fn query_target(&self, round: u32, items: &mut [Item]) {
        let deadline = self.batch_deadline();
        let batch_size = self.config.batch_size.max(1);

        for (batch, chunk) in items.chunks_mut(batch_size).enumerate() {
            let prompts: Vec<String> = chunk.iter().map(|i| i.question.clone()).collect();
            let call = self.target.complete(&prompts, &self.config.completion);

            let replies = match tokio::time::timeout(deadline, call).await {
                Ok(Ok(replies)) if replies.len() == prompts.len() => Some(replies),
                Ok(Ok(replies)) => {
                    tracing::warn!(
                        round,
                        batch,
                        expected = prompts.len(),
                        got = replies.len(),
                        "Target reply count mismatch, answers left empty"
                    );
                    None
                }
                Ok(Err(e)) => {
                    tracing::warn!(round, batch, error = %e, "Target batch failed, answers left empty");
                    None
                }
                Err(_) => {
                    tracing::warn!(round, batch, timeout = ?deadline, "Target batch timed out, answers left empty");
                    None
                }
            };

            match replies {
                Some(replies) => {
                    for (item, reply) in chunk.iter_mut().zip(replies) {
                        item.model_response = reply;
                    }
                }
                None => {
                    for item in chunk.iter_mut() {
                        item.model_response.clear();
                    }
                }
            }
            tracing::debug!(round, batch, size = prompts.len(), "Target batch done");
        }
    }

    /// Upper bound for one batch including retries.
    fn batch_deadline(&self) -> Duration {
        let attempts = self.config.retry.max_attempts.max(1);
        self.config.completion.timeout * attempts + self.config.retry.max_delay * (attempts - 1)
    }
}

/// Builder for [`RoundOrchestrator`].
///
/// Providers not set explicitly are created from the config's endpoint
/// sections through [`ProviderRegistry::with_defaults`], each wrapped in
/// retry and circuit breaking.
pub struct RoundOrchestratorBuilder {
    config: RuntimeConfig,
    registry: ProviderRegistry,
    target: Option<Arc<dyn LlmProvider>>,
    extraction: Option<Arc<dyn LlmProvider>>,
}

impl RoundOrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            registry: ProviderRegistry::with_defaults(),
            target: None,
            extraction: None,
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Use this provider as the target model as-is.
    pub fn target(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.target = Some(provider);
        self
    }

    /// Use this provider as the extraction model as-is.
    pub fn extraction(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.extraction = Some(provider);
        self
    }

    pub fn build(self) -> Result<RoundOrchestrator, RuntimeError> {
        let Self {
            config,
            registry,
            target,
            extraction,
        } = self;
        config.validate()?;
        let breaker = Arc::new(CircuitBreaker::new(config.circuit_breaker.clone()));
        let guard = |name: &str, endpoint: &EndpointConfig| -> Result<Arc<dyn LlmProvider>, RuntimeError> {
            let settings = endpoint.provider_config(name, config.batch_size);
            let inner = registry.create(&endpoint.style, &settings)?;
            Ok(Arc::new(GuardedProvider::new(
                inner,
                breaker.clone(),
                config.retry.clone(),
            )))
        };

        let target = match target {
            Some(p) => p,
            None => guard("target", &config.target)?,
        };

        let extraction: Arc<dyn LlmProvider> = match extraction {
            Some(p) => p,
            None => {
                let primary = guard("extraction", &config.extraction)?;
                match &config.extraction_fallback {
                    Some(fallback) => {
                        let secondary = guard("extraction_fallback", fallback)?;
                        Arc::new(FallbackProvider::new(vec![primary, secondary])) as Arc<dyn LlmProvider>
                    }
                    None => primary,
                }
            }
        };

        Ok(RoundOrchestrator::new(target, extraction, config))
    }
}

impl Default for RoundOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

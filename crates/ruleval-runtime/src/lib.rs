//! # ruleval-runtime
//!
//! Model-facing half of ruleval: everything that talks to an LLM or
//! touches the disk. `ruleval-core` stays deterministic and I/O free.
//!
//! - [`providers`]: target and extraction model clients behind [`LlmProvider`]
//! - [`resilience`]: retry, per-endpoint circuit breaking, ordered fallback
//! - [`extractor`]: fills `corresponding_parts` through the extraction model
//! - [`orchestrator`]: the multi-round query, extract, evaluate loop
//! - [`snapshot`]: `round_<N>.json` and `summary.json`
//! - [`config`]: YAML plus environment configuration
//!
//! ## Example
//!
//! ```rust,ignore
//! use ruleval_runtime::{RoundOrchestratorBuilder, RuntimeConfig};
//!
//! let config = RuntimeConfig::load(Some("ruleval.yaml".as_ref()))?;
//! let orchestrator = RoundOrchestratorBuilder::new().config(config).build()?;
//! let report = orchestrator.run(items).await?;
//! println!("pass rate {:.2}", report.last_round().map_or(0.0, |r| r.pass_rate));
//! ```

pub mod cache;
pub mod config;
pub mod extractor;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod resilience;
pub mod snapshot;

pub use cache::{CacheConfig, ExtractionCache};
pub use config::{ConfigError, EndpointConfig, RuntimeConfig};
pub use extractor::{parse_parts, ExtractionStats, PartExtractor};
pub use orchestrator::{RoundOrchestrator, RoundOrchestratorBuilder, RunReport, RuntimeError};
pub use providers::{
    ApiCredential, CompletionConfig, EchoProvider, LlmProvider, OpenAiProvider, ProviderError,
    ProviderFactory, ProviderRegistry, QwenProvider,
};
pub use resilience::{CircuitBreaker, CircuitBreakerConfig, FallbackProvider, GuardedProvider, RetryPolicy};
pub use snapshot::{RoundSummary, SnapshotError, SnapshotStore};

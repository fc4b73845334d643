//! ruleval - multi-round multilingual constraint evaluation of LLM responses
//!
//! Loads a dataset, queries the target model, extracts the parts each
//! constraint applies to, evaluates every rule, and writes one snapshot per
//! round.
//!
//! Exit codes: 0 success, 1 configuration or data error, 130 interrupted.

mod args;
mod dataset;
mod logging;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use args::Cli;
use ruleval_core::Registry;
use ruleval_runtime::{RoundOrchestrator, RoundOrchestratorBuilder, RunReport, RuntimeConfig};

const EXIT_FAILURE: u8 = 1;
const EXIT_INTERRUPTED: u8 = 130;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init_tracing(&cli.log_level, cli.log_json) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    if cli.list_rules {
        print_rules();
        return ExitCode::SUCCESS;
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to start async runtime: {}", e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    runtime.block_on(async {
        tokio::select! {
            result = run(&cli) => match result {
                Ok(report) => {
                    print_report(&report);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("error: {:#}", e);
                    ExitCode::from(EXIT_FAILURE)
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("Interrupted, the current round was not persisted");
                ExitCode::from(EXIT_INTERRUPTED)
            }
        }
    })
}

async fn run(cli: &Cli) -> Result<RunReport> {
    let mut config =
        RuntimeConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);
    config.validate().context("Invalid configuration")?;

    let data_path = cli
        .data_path
        .as_deref()
        .context("--data_path is required")?;
    let mut items = dataset::load(data_path)?;
    if let Some(language) = &cli.language_filter {
        items = dataset::filter_language(items, language)?;
    }

    let orchestrator = RoundOrchestratorBuilder::new()
        .config(config)
        .build()
        .context("Failed to set up model endpoints")?;

    if !cli.skip_api_test {
        check_endpoints(&orchestrator).await;
    }

    let report = if cli.resume {
        orchestrator.resume_or_run(items).await
    } else {
        orchestrator.run(items).await
    };
    report.context("Evaluation run failed")
}

/// Advisory connectivity probe; a failure is logged, never fatal.
async fn check_endpoints(orchestrator: &RoundOrchestrator) {
    let (target_ok, extraction_ok) = tokio::join!(
        orchestrator.target().health_check(),
        orchestrator.extraction().health_check()
    );
    if target_ok && extraction_ok {
        tracing::info!("Model endpoints reachable");
    } else {
        tracing::warn!(
            target_ok,
            extraction_ok,
            "Model endpoint check failed, continuing anyway"
        );
    }
}

fn print_rules() {
    for spec in Registry::global().iter() {
        println!("{}\t{}\t{}", spec.name, spec.language, spec.shape);
    }
}

fn print_report(report: &RunReport) {
    for round in &report.rounds {
        println!(
            "round {}: {} items, {}/{} sub-questions passed ({:.1}%)",
            round.round,
            round.items,
            round.passed,
            round.sub_questions,
            round.pass_rate * 100.0
        );
    }
}

//! Command-line front-end for the pricing-intelligence pipeline.
//! Maps operations onto the orchestrator and translates outcomes to
//! process exit codes: 0 success, 1 pipeline-level failure, 2 usage/setup
//! error.

use clap::{Parser, Subcommand};
use pricing_intel_core::prelude::*;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pricing-intel", about = "Pricing-intelligence pipeline control")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pipeline immediately, ignoring the pending-changes gate.
    RunForced,
    /// Run the pipeline only if there are pending data changes.
    Run,
    /// Print the most recent run's status.
    Status,
    /// Print the last N runs.
    History {
        #[arg(long, default_value_t = 10)]
        limit: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    #[cfg(feature = "observability")]
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::from(2);
        }
    };

    let factory = MemoryRepositoryFactory::new();
    let orchestrator = PipelineOrchestrator::new(
        config,
        Arc::new(InMemoryDataSource::default()),
        ForecastEngine::without_model(SegmentLattice::default()),
        Arc::new(factory.run_record_repository()),
        Arc::new(factory.strategy_rule_repository()),
    );

    match run(cli.command, &orchestrator).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("pipeline error: {err}");
            ExitCode::from(1)
        }
    }
}

#[cfg(feature = "config")]
fn load_config() -> PipelineResult<PipelineConfig> {
    PipelineConfig::load()
}

#[cfg(not(feature = "config"))]
fn load_config() -> PipelineResult<PipelineConfig> {
    Ok(PipelineConfig::default())
}

async fn run(
    command: Command,
    orchestrator: &PipelineOrchestrator<
    InMemoryDataSource,
    impl RunRecordRepository,
    impl StrategyRuleRepository,
    >,
) -> PipelineResult<()> {
    match command {
        Command::RunForced => {
            let record = orchestrator.trigger_pipeline(TriggerKind::ManualForce).await?;
            print_record(&record);
        }
        Command::Run => {
            let record = orchestrator.trigger_pipeline(TriggerKind::Manual).await?;
            print_record(&record);
        }
        Command::Status => match orchestrator.get_last_run().await? {
            Some(record) => print_record(&record),
            None => println!("no runs yet"),
        },
        Command::History { limit } => {
            for record in orchestrator.get_history(limit).await? {
                print_record(&record);
            }
        }
    }
    Ok(())
}

fn print_record(record: &RunRecord) {
    println!(
        "run {} status={:?} recommendations={}",
        record.run_id,
        record.status,
        record.recommendations.len()
    );
}


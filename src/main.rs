use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;

use trellis_config::{PipelineDef, TriggerContext};
use trellis_graph::Pipeline;
use trellis_local::{EnvSecretStore, ProcessExecutor};
use trellis_runtime::{PipelineRuntime, RunStatus};

/// Trellis - a job-graph evaluator for CI pipelines
#[derive(Parser)]
#[command(name = "trellis")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Validate a pipeline definition and print its batch schedule
  Validate {
    /// Path to the pipeline file (JSON)
    pipeline_file: PathBuf,
  },

  /// Run a pipeline
  Run {
    /// Path to the pipeline file (JSON)
    pipeline_file: PathBuf,

    /// The event creating this run
    #[arg(long, value_enum, default_value_t = EventArg::Dispatch)]
    event: EventArg,

    /// The ref the run is for, e.g. "refs/heads/main"
    #[arg(long, default_value = "")]
    ref_name: String,

    /// Whether the ref is a tag
    #[arg(long)]
    tag: bool,

    /// Directory holding the unit executables
    #[arg(long, default_value = "units")]
    units_dir: PathBuf,
  },
}

#[derive(Clone, Copy, ValueEnum)]
enum EventArg {
  Push,
  Dispatch,
  Schedule,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let cli = Cli::parse();

  match cli.command {
    Commands::Validate { pipeline_file } => validate(pipeline_file),
    Commands::Run {
      pipeline_file,
      event,
      ref_name,
      tag,
      units_dir,
    } => {
      let context = match event {
        EventArg::Push => TriggerContext::push(ref_name, tag),
        EventArg::Dispatch => TriggerContext::dispatch(ref_name),
        EventArg::Schedule => TriggerContext::schedule(),
      };
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(run_async(pipeline_file, context, units_dir))
    }
  }
}

fn load(pipeline_file: &PathBuf) -> Result<Pipeline> {
  let content = std::fs::read_to_string(pipeline_file)
    .with_context(|| format!("failed to read pipeline file: {}", pipeline_file.display()))?;

  let def = PipelineDef::from_json(&content)
    .with_context(|| format!("failed to parse pipeline file: {}", pipeline_file.display()))?;

  Pipeline::lock(def).context("pipeline failed validation")
}

fn validate(pipeline_file: PathBuf) -> Result<()> {
  let pipeline = load(&pipeline_file)?;

  println!("pipeline '{}': {} jobs", pipeline.name, pipeline.jobs.len());
  for (index, batch) in pipeline.schedule().iter().enumerate() {
    println!("  batch {}: {}", index + 1, batch.join(", "));
  }

  Ok(())
}

async fn run_async(
  pipeline_file: PathBuf,
  context: TriggerContext,
  units_dir: PathBuf,
) -> Result<()> {
  let pipeline = load(&pipeline_file)?;

  eprintln!(
    "Running pipeline '{}' for {} event",
    pipeline.name,
    context.event.as_str()
  );

  let executor = Arc::new(ProcessExecutor::new(units_dir, Arc::new(EnvSecretStore)));
  let runtime = PipelineRuntime::new(pipeline, executor);

  let cancel = CancellationToken::new();
  let canceller = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      canceller.cancel();
    }
  });

  let result = runtime
    .execute(context, cancel)
    .wait()
    .await
    .context("run failed to complete")?;

  println!("{}", serde_json::to_string_pretty(&result)?);

  match result.status {
    RunStatus::Succeeded => Ok(()),
    RunStatus::Failed => bail!("run {} failed", result.run_id),
    RunStatus::Cancelled => bail!("run {} was cancelled", result.run_id),
  }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use dagwood_transforms::config::load_and_validate_config;
use dagwood_transforms::engine::PipelineRunner;
use dagwood_transforms::registry::ActionRegistry;

fn print_usage(program: &str) {
    eprintln!("Usage: {} <pipeline.yaml|json|toml> [pipeline ...] <input>", program);
    eprintln!("       {} --list-actions", program);
    eprintln!("<input> is a path to a JSON file or an inline JSON document.");
    eprintln!("Example: {} configs/order-fanout.yaml input.json", program);
    eprintln!("Example: {} configs/tag-cleanup.toml '{{\"tags\": [\"rust\", null]}}'", program);
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let args: Vec<String> = env::args().collect();
    let registry = Arc::new(ActionRegistry::with_core_transforms()?);

    if args.len() >= 2 && args[1] == "--list-actions" {
        list_actions(&registry);
        return Ok(());
    }

    if args.len() < 3 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    // The last argument is the input, everything between is a pipeline file
    let input = read_input(&args[args.len() - 1])?;
    let pipeline_files = &args[1..args.len() - 1];

    let mut failures = 0;
    for pipeline_file in pipeline_files {
        if let Err(e) = run_pipeline(&registry, pipeline_file, input.clone()).await {
            eprintln!("❌ Failed to run {}: {:#}", pipeline_file, e);
            failures += 1;
        }
    }

    if failures > 0 {
        bail!("{} of {} pipelines failed", failures, pipeline_files.len());
    }
    Ok(())
}

fn list_actions(registry: &ActionRegistry) {
    println!("📚 Registered actions ({})", registry.len());
    for spec in registry.list() {
        println!("  {:<28} {} - {}", spec.key(), spec.default_title, spec.description);
    }
}

fn read_input(arg: &str) -> Result<Value> {
    let path = Path::new(arg);
    if path.is_file() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading input file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("parsing input file {} as JSON", path.display()))
    } else {
        serde_json::from_str(arg).context("input is neither a readable file nor valid JSON")
    }
}

async fn run_pipeline(registry: &Arc<ActionRegistry>, pipeline_file: &str, input: Value) -> Result<()> {
    let config = load_and_validate_config(pipeline_file, registry)?;
    let step_count = config.steps.len();
    let runner = PipelineRunner::new(Arc::clone(registry), config)?;

    eprintln!("📋 Pipeline: {}", pipeline_file);
    eprintln!("🔢 Steps: {}", step_count);
    eprintln!("⚙️  Max Concurrency: {}", runner.max_concurrency());

    let start_time = Instant::now();
    let context = runner.run(input).await?;
    eprintln!("⏱️  Execution Time: {:?}", start_time.elapsed());

    println!("{}", serde_json::to_string_pretty(&context)?);
    Ok(())
}

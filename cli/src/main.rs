//! `shorten` binary: shorten every document in a directory with an LLM.
//!
//! ```text
//! main() -> ShortenConfig::load -> into_plan -> init_tracing
//!        -> list_documents -> run_batch | dry_run -> summary on stdout
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use shorten::{
    BatchOptions, dry_run, init_tracing, list_documents, render_plan_summary, render_summary,
    run_batch,
};
use shorten_config::ShortenConfig;
use shorten_context::{Shortener, Tokenizer};
use shorten_providers::OpenAIRewriter;

#[derive(Debug, Parser)]
#[command(name = "shorten", version, about = "Shorten documents chunk by chunk with an LLM")]
struct Args {
    /// Config file (default: $SHORTEN_CONFIG, then ~/.shorten/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory of documents to shorten
    #[arg(long)]
    input: Option<PathBuf>,
    /// Directory for shortened outputs
    #[arg(long)]
    output: Option<PathBuf>,
    /// Split documents and log the window plan without calling the model
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let mut config = ShortenConfig::load(args.config.as_deref())?;
    config.override_paths(args.input.as_deref(), args.output.as_deref());
    let plan = config.into_plan()?;

    init_tracing(plan.log_file.as_deref());
    tracing::info!(
        input = %plan.input_dir.display(),
        output = %plan.output_dir.display(),
        model = %plan.model,
        "Start shortening"
    );

    let tokenizer = Tokenizer::for_model(&plan.model)?;
    let shortener = Shortener::new(
        tokenizer,
        plan.request,
        plan.prompt_reserve,
        plan.sampling,
        plan.repeat.get(),
    )?;

    let documents = list_documents(&plan.input_dir)
        .with_context(|| format!("failed to list {}", plan.input_dir.display()))?;
    for (i, path) in documents.iter().enumerate() {
        tracing::info!(file = i + 1, path = %path.display(), "Target file");
    }

    if args.dry_run {
        let plans = dry_run(&shortener, &documents);
        print!("{}", render_plan_summary(&plans));
        let ok = plans.iter().all(|doc| doc.plan.is_ok());
        return Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE });
    }

    let api = plan.api_config()?;
    let rewriter = OpenAIRewriter::new(&api)?;
    let options = BatchOptions {
        output_dir: plan.output_dir.clone(),
        output_prefix: plan.output_prefix.clone(),
        on_remote_failure: plan.on_remote_failure,
        max_concurrent_documents: plan.max_concurrent_documents,
    };

    let report = run_batch(&shortener, &rewriter, &documents, &options).await;
    print!("{}", render_summary(&report));

    Ok(if report.aborted {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

//! # Deep Research CLI
//!
//! Plans a set of web searches for a query, runs them concurrently, writes a
//! long-form report and, if the query names a recipient, emails it.
//!
//! ## Quick Start
//! ```bash
//! cargo run -- "Latest advances in battery tech 2025"
//! cargo run -- "Rust async runtimes compared, send it to me@example.com"
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use deep_research::{
    build_generator, Config, Planner, ProgressEvent, Provider, Report, ResearchCoordinator,
    SearchPlan,
};

// =============================================================================
// CLI ARGUMENTS
// =============================================================================
#[derive(Parser, Debug)]
#[command(
    name = "deep-research",
    version,
    about = "Plans web searches, runs them in parallel and writes a detailed research report",
    long_about = r#"
Deep Research - a multi-agent research pipeline.

For every query it will:
  1. Plan a handful of web searches
  2. Run them concurrently and summarize each one
  3. Write a long-form markdown report
  4. Email the report if the query asks for it (needs SENDGRID_API_KEY and SENDER_EMAIL)

PREREQUISITES (default provider):
  1. Install Ollama: https://ollama.ai
  2. Pull a model: ollama pull llama3.2
  3. Start Ollama: ollama serve

EXAMPLES:
  deep-research "Latest advances in battery tech 2025"

  # Only show the planned searches
  deep-research --plan-only "State of WebAssembly outside the browser"

  # Use OpenAI and save the report
  deep-research -p openai -o report.md "Rust in the Linux kernel"
"#
)]
struct Args {
    /// The research topic or question
    #[arg(value_name = "QUERY")]
    query: String,

    /// Model to use (overrides OLLAMA_MODEL / OPENAI_MODEL)
    #[arg(short = 'm', long = "model")]
    model: Option<String>,

    /// LLM provider: ollama or openai (overrides LLM_PROVIDER)
    #[arg(short = 'p', long = "provider")]
    provider: Option<String>,

    /// Number of searches to plan (overrides HOW_MANY_SEARCHES)
    #[arg(short = 'n', long = "searches")]
    searches: Option<usize>,

    /// Print the search plan and exit
    #[arg(long = "plan-only", default_value = "false")]
    plan_only: bool,

    /// Also write the markdown report to this file
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Enable verbose/debug logging
    #[arg(short = 'v', long = "verbose", default_value = "false")]
    verbose: bool,
}

// =============================================================================
// MAIN FUNCTION
// =============================================================================
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args)?;
    init_logging(&config.log_level)?;

    let query = args.query.trim();
    if query.is_empty() {
        eprintln!("Please enter a research topic, e.g. deep-research \"Latest advances in battery tech\"");
        anyhow::bail!("empty research query");
    }

    info!(
        provider = %config.provider,
        model = %config.model,
        searches = config.how_many_searches,
        email = config.email_enabled(),
        "Configuration loaded"
    );

    if args.plan_only {
        return show_plan(&config, query).await;
    }

    let coordinator = ResearchCoordinator::from_config(&config)?;
    let events = coordinator.run(query.to_string());
    futures::pin_mut!(events);

    let mut report = None;
    while let Some(event) = events.next().await {
        match event {
            Ok(ProgressEvent::Status { stage, message }) => {
                eprintln!("[{}] {}", stage, message);
            }
            Ok(ProgressEvent::FinalReport(finished)) => report = Some(finished),
            Err(e) => {
                error!(error = %e, "Research failed");
                eprintln!("\nResearch failed: {}", e);
                print_tips(&e.to_string());
                return Err(e.into());
            }
        }
    }

    let report = report.context("research finished without a report")?;
    print_report(&report);

    if let Some(path) = &args.output {
        std::fs::write(path, &report.markdown_report)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "Report saved");
    }

    Ok(())
}

/// Environment configuration with the command-line overrides applied.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::from_env()?;

    if let Some(provider) = &args.provider {
        let provider: Provider = provider.parse()?;
        config = config.with_provider(provider);
    }
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(searches) = args.searches {
        config.how_many_searches = searches;
    }
    if args.verbose {
        config.log_level = "debug".to_string();
    }

    config.validate()?;
    Ok(config)
}

async fn show_plan(config: &Config, query: &str) -> Result<()> {
    let generator = build_generator(config, None)?;
    let planner = Planner::new(Arc::clone(&generator), config.how_many_searches);
    let plan = planner.plan(query).await?;
    print_plan(&plan, planner.target_searches());
    Ok(())
}

// =============================================================================
// OUTPUT
// =============================================================================
fn print_plan(plan: &SearchPlan, requested: usize) {
    println!("\n{}", "=".repeat(60));
    println!("SEARCH PLAN ({} of {} requested)", plan.searches.len(), requested);
    println!("{}\n", "=".repeat(60));
    for (i, item) in plan.searches.iter().enumerate() {
        println!("{}. {}", i + 1, item.query);
        println!("   why: {}", item.reason);
    }
    match &plan.receiver_email {
        Some(email) => println!("\nReport would be emailed to: {}", email),
        None => println!("\nNo email requested"),
    }
}

fn print_report(report: &Report) {
    println!("\n{}", "=".repeat(60));
    println!("SUMMARY");
    println!("{}\n", "=".repeat(60));
    println!("{}", report.short_summary);

    println!("\n{}", "=".repeat(60));
    println!("REPORT");
    println!("{}\n", "=".repeat(60));
    println!("{}", report.markdown_report);

    if !report.follow_up_questions.is_empty() {
        println!("\n{}", "=".repeat(60));
        println!("FOLLOW-UP QUESTIONS");
        println!("{}\n", "=".repeat(60));
        for question in &report.follow_up_questions {
            println!("- {}", question);
        }
    }
    println!("\n{}", "=".repeat(60));
}

fn print_tips(message: &str) {
    let message = message.to_lowercase();
    if message.contains("connection refused") {
        eprintln!("\nTip: make sure Ollama is running:");
        eprintln!("   ollama serve");
    } else if message.contains("openai_api_key") || message.contains("api key") {
        eprintln!("\nTip: set OPENAI_API_KEY or switch to --provider ollama");
    } else if message.contains("model") {
        eprintln!("\nTip: make sure the model is installed:");
        eprintln!("   ollama pull llama3.2");
    }
}

// =============================================================================
// LOGGING INITIALIZATION
// =============================================================================
/// Install a stderr subscriber filtered by `level` (RUST_LOG syntax).
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .with_context(|| format!("Invalid log filter: {}", level))?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::{LevelFilter, info};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use taskpilot::config::Config;
use taskpilot::llm::ChatClient;
use taskpilot::orchestrator::Orchestrator;
use taskpilot::prompt::PromptSet;
use taskpilot::tools::{ToolContext, ToolRegistry};

mod cli;

use cli::Cli;
use cli::commands::Commands;
use cli::report::{render_outcome, render_tools};

const EXAMPLE_QUERY: &str = "Find the current weather in Ontario and email it to me@example.com";

/// Start file logging before anything else runs
///
/// Returns true when `RUST_LOG` governs the filter, in which case the
/// configured level is not applied afterwards.
fn setup_logging() -> Result<bool> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskpilot")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("taskpilot.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let from_env = std::env::var_os("RUST_LOG").is_some();
    let mut builder = if from_env {
        env_logger::Builder::from_default_env()
    } else {
        // Our own records pass the filter; the max level set later decides
        let mut builder = env_logger::Builder::new();
        builder
            .filter_level(LevelFilter::Info)
            .filter_module("taskpilot", LevelFilter::Trace);
        builder
    };
    builder.target(env_logger::Target::Pipe(target)).init();

    if !from_env {
        log::set_max_level(LevelFilter::Info);
    }

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(from_env)
}

/// Level from `--verbose`, then the config's `log_level`, then info
fn log_level(verbose: bool, configured: Option<&str>) -> LevelFilter {
    if verbose {
        return LevelFilter::Debug;
    }
    match configured {
        Some(level) => level.parse().unwrap_or_else(|_| {
            log::warn!("Unknown log_level {:?}, using info", level);
            LevelFilter::Info
        }),
        None => LevelFilter::Info,
    }
}

/// Prompt for a query on stdin; an empty line runs the example query
fn read_query() -> Result<String> {
    print!("{} ", "Enter your query:".cyan());
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read query from stdin")?;

    let query = line.trim();
    if query.is_empty() {
        println!("{} {}", "Using example query:".yellow(), EXAMPLE_QUERY);
        Ok(EXAMPLE_QUERY.to_string())
    } else {
        Ok(query.to_string())
    }
}

async fn run_query(query: &str, as_json: bool, cli: &Cli, config: &Config) -> Result<()> {
    let llm = Arc::new(
        ChatClient::from_config(&config.llm).context("Failed to create LLM client")?,
    );
    let ctx = ToolContext::new(config.tools.clone()).context("Failed to create tool context")?;
    let prompts =
        PromptSet::load(config.prompts_dir.as_deref()).context("Failed to load prompts")?;

    let orchestrator = Orchestrator::with_config(
        llm,
        Arc::new(ToolRegistry::standard()),
        ctx,
        prompts,
        config.orchestrator.clone(),
    );

    if !as_json {
        println!("{} {}", "User Query:".bold(), query);
    }

    let outcome = orchestrator
        .process_query(query)
        .await
        .context("Query failed")?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", render_outcome(&outcome, cli.is_verbose()));
    }

    info!(
        "Query finished: {} task(s), {} failed, {} tokens",
        outcome.results.len(),
        outcome.failed_tasks(),
        outcome.usage.total()
    );
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Some(Commands::Tools) => {
            print!("{}", render_tools(&ToolRegistry::standard()));
            Ok(())
        }
        Some(command @ Commands::Ask { json, .. }) => {
            let query = command.query_text().unwrap_or_default();
            run_query(&query, *json, cli, config).await
        }
        None => {
            let query = read_query()?;
            run_query(&query, false, cli, config).await
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the environment may already carry the keys
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let from_env = setup_logging().context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    if !from_env {
        log::set_max_level(log_level(cli.is_verbose(), config.log_level.as_deref()));
    }

    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) => info!("No .env loaded: {}", e),
    }
    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}

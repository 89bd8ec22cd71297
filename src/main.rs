//! Edge request router.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────┐
//!                     │                 EDGE ROUTER                  │
//!                     │                                              │
//!   rules.txt/.yml ───┼─▶ rules (compile) ──▶ routing::RuleTable     │
//!        ▲            │        ▲                    │                │
//!        │            │        │                    ▼                │
//!   config::watcher ──┼────────┘       edge (event ↔ descriptor)     │
//!                     │                             │                │
//!   viewer event ─────┼────────────────────────────▶│──────────────▶─┼── redirect
//!                     │                                              │   or forward
//!                     │   observability (tracing, metrics)           │
//!                     └──────────────────────────────────────────────┘
//! ```
//!
//! # Commands
//! - `eval`: route a single event read from a file or stdin
//! - `lint`: report rules that fail to compile or look suspicious
//! - `check`: run rule cases against the compiled rules
//! - `serve`: route newline-delimited events from stdin until EOF or Ctrl-C

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncReadExt, BufReader};

use edge_router::config::{load_config, EdgeConfig, RuleWatcher};
use edge_router::edge::{handle_event, EdgeWorker, ViewerRequestEvent};
use edge_router::lifecycle::startup::{build_compiler, build_router, build_table, compile_rules};
use edge_router::observability::logging;
use edge_router::rules::cases::{load_cases, run_cases};
use edge_router::rules::lint::lint;

#[derive(Parser)]
#[command(name = "edge-router")]
#[command(
    about = "Rule-driven redirect and rewrite router for CDN edge requests",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Route one viewer-request event and print the result
    Eval {
        #[arg(short, long, default_value = "edge.toml")]
        config: PathBuf,
        /// Event file; reads stdin when omitted
        #[arg(short, long)]
        event: Option<PathBuf>,
    },
    /// Report compilation errors and lint findings
    Lint {
        #[arg(short, long, default_value = "edge.toml")]
        config: PathBuf,
    },
    /// Run rule cases against the compiled rules
    Check {
        #[arg(short, long, default_value = "edge.toml")]
        config: PathBuf,
        #[arg(long)]
        cases: PathBuf,
    },
    /// Route newline-delimited events from stdin
    Serve {
        #[arg(short, long, default_value = "edge.toml")]
        config: PathBuf,
    },
}

impl Commands {
    fn config_path(&self) -> &PathBuf {
        match self {
            Commands::Eval { config, .. }
            | Commands::Lint { config }
            | Commands::Check { config, .. }
            | Commands::Serve { config } => config,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.command.config_path())?;
    logging::init(&config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        rules = %config.rules.path.display(),
        watch = config.rules.watch,
        "edge-router starting"
    );

    match cli.command {
        Commands::Eval { event, .. } => eval(&config, event).await,
        Commands::Lint { .. } => lint_rules(&config),
        Commands::Check { cases, .. } => check(&config, &cases),
        Commands::Serve { .. } => serve(&config).await,
    }
}

async fn eval(
    config: &EdgeConfig,
    event: Option<PathBuf>,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let router = build_router(config, &build_compiler(&config.rules))?;

    let text = match event {
        Some(path) => tokio::fs::read_to_string(path).await?,
        None => {
            let mut text = String::new();
            tokio::io::stdin().read_to_string(&mut text).await?;
            text
        }
    };

    let event = ViewerRequestEvent::from_json(&text)?;
    let output = handle_event(&router, &event)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(ExitCode::SUCCESS)
}

fn lint_rules(config: &EdgeConfig) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let outcome = compile_rules(&config.rules, &build_compiler(&config.rules))?;

    for error in &outcome.errors {
        println!("error: {}", error);
    }
    for finding in lint(&outcome.rules) {
        println!("warning: {}", finding);
    }
    println!(
        "{} rules compiled, {} dropped",
        outcome.rules.len(),
        outcome.errors.len()
    );

    Ok(if outcome.errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn check(config: &EdgeConfig, cases: &Path) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let router = build_router(config, &build_compiler(&config.rules))?;
    let cases = load_cases(cases)?;
    let failures = run_cases(&router, &cases);

    for failure in &failures {
        println!(
            "FAIL {}: expected {}, got {}",
            failure.case.uri, failure.case.expected, failure.actual
        );
    }
    println!("{} cases, {} failed", cases.len(), failures.len());

    Ok(if failures.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn serve(config: &EdgeConfig) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let compiler = build_compiler(&config.rules);
    let table = Arc::new(build_table(config, &compiler)?);

    // Kept alive until the worker returns.
    let _watcher = if config.rules.watch {
        let (watcher, mut updates) = RuleWatcher::new(&config.rules, compiler);
        let watcher = watcher.run()?;

        let table = Arc::clone(&table);
        tokio::spawn(async move {
            while let Some(rules) = updates.recv().await {
                table.replace_rules(rules);
            }
        });
        Some(watcher)
    } else {
        None
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    let worker = EdgeWorker::new(table);
    let handled = worker
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), shutdown)
        .await?;

    tracing::info!(handled, "Shutdown complete");
    Ok(ExitCode::SUCCESS)
}

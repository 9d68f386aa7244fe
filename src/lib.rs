// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod protocol;
pub mod server;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, Command, RunArgs, ServeArgs};
use crate::config::{ConfigFile, load_or_default};
use crate::engine::Orchestrator;
use crate::exec::{CommandSpec, ProcessLauncher};
use crate::types::{LaunchRequest, RunStatus, StatusRecord};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the orchestrator and its child-process launcher
/// - either a followed one-off run or the HTTP API
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(args.config.as_deref())?;
    debug!(?cfg, "configuration loaded");

    match args.command {
        Command::Run(run_args) => run_once(&cfg, &run_args).await,
        Command::Serve(serve_args) => serve(&cfg, &serve_args).await,
    }
}

/// `crawlctl run`: start one crawl and follow it to the end.
async fn run_once(cfg: &ConfigFile, run_args: &RunArgs) -> Result<()> {
    let request = run_args.launch_request(&cfg.defaults);

    if run_args.dry_run {
        print_dry_run(&cfg.crawler.command_spec(), &request);
        return Ok(());
    }

    let orchestrator = Orchestrator::from_config(&cfg.crawler);
    orchestrator.start(&request).await?;

    let state = follow_run(&orchestrator, cfg.crawler.poll_interval()).await;
    orchestrator.shutdown().await;

    match state.status {
        RunStatus::Completed => {
            info!("crawler run completed");
            Ok(())
        }
        RunStatus::Failed => bail!("crawler run failed: {}", state.last_log),
        RunStatus::Idle | RunStatus::Running => {
            warn!(last_log = %state.last_log, "crawler exited without reporting completion");
            Ok(())
        }
    }
}

/// Poll the orchestrator, printing every change, until the run is over.
///
/// The first Ctrl-C stops the crawler; following the run continues so the
/// final status is still reported.
pub async fn follow_run<L: ProcessLauncher>(
    orchestrator: &Orchestrator<L>,
    poll_interval: Duration,
) -> StatusRecord {
    let mut ticker = tokio::time::interval(poll_interval);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut stopping = false;
    let mut last_printed: Option<StatusRecord> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            res = &mut ctrl_c, if !stopping => {
                stopping = true;
                if let Err(e) = res {
                    warn!(error = %e, "failed to listen for Ctrl+C");
                } else {
                    info!("Ctrl+C received; stopping crawler");
                    orchestrator.stop().await;
                }
            }
        }

        let state = orchestrator.full_state();
        if last_printed.as_ref() != Some(&state) {
            println!("{}", render_state(&state));
            last_printed = Some(state.clone());
        }

        if state.status != RunStatus::Running && !orchestrator.is_running() {
            return state;
        }
    }
}

/// One console line per observed state.
pub fn render_state(state: &StatusRecord) -> String {
    format!(
        "[{:>3}%] {:<9} {}",
        state.progress,
        state.status.as_str(),
        state.last_log
    )
}

/// `crawlctl serve`: expose the orchestrator over HTTP until Ctrl-C.
async fn serve(cfg: &ConfigFile, serve_args: &ServeArgs) -> Result<()> {
    let mut server = cfg.server.clone();
    if let Some(host) = &serve_args.host {
        server.host = host.clone();
    }
    if let Some(port) = serve_args.port {
        server.port = port;
    }

    let orchestrator = Arc::new(Orchestrator::from_config(&cfg.crawler));

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Ctrl+C received; shutting down");
    };

    crate::server::serve(orchestrator, &server, shutdown).await?;
    Ok(())
}

/// Simple dry-run output: print the command line and the request.
fn print_dry_run(command: &CommandSpec, request: &LaunchRequest) {
    println!("crawlctl dry-run");
    println!("  mode     = {}", request.mode);
    if let Some(round) = &request.start_round {
        println!("  start    = {round}");
    }
    if let Some(round) = &request.end_round {
        println!("  end      = {round}");
    }
    println!("  headless = {}", request.headless);
    println!("  timeout  = {}s", request.timeout_seconds);
    if let Some(dir) = &command.working_dir {
        println!("  cwd      = {}", dir.display());
    }
    println!();
    println!("{}", command.display_with(&request.to_args()));

    debug!("dry-run complete (no execution)");
}

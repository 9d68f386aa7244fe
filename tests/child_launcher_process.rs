// tests/child_launcher_process.rs
//
// Runs real `sh` scripts standing in for the crawler.
#![cfg(unix)]

mod common;
use crate::common::{init_tracing, wait_until, with_timeout};

use std::error::Error;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crawlctl::engine::Orchestrator;
use crawlctl::errors::CrawlctlError;
use crawlctl::exec::{ChildLauncher, CommandSpec, ExitOutcome, ProcessEvent, ProcessLauncher};
use crawlctl::types::{LaunchRequest, RunStatus, StatusRecord};
use crawlctl_test_utils::builders::LaunchRequestBuilder;
use crawlctl_test_utils::script::{FakeCrawler, fake_crawler_script};

type TestResult = Result<(), Box<dyn Error>>;

const GRACE: Duration = Duration::from_millis(200);

fn orchestrator_for(crawler: &FakeCrawler) -> Orchestrator<ChildLauncher> {
    Orchestrator::with_launcher(ChildLauncher::new(GRACE), crawler.command())
}

/// Collect every event of one run, up to and including the exit.
async fn collect_run(mut rx: mpsc::Receiver<ProcessEvent>) -> Vec<ProcessEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        let done = matches!(event, ProcessEvent::Exited(_));
        events.push(event);
        if done {
            break;
        }
    }
    events
}

async fn run_to_end(orch: &Orchestrator<ChildLauncher>) -> StatusRecord {
    wait_until(|| !orch.is_running()).await;
    with_timeout(orch.shutdown()).await;
    orch.full_state()
}

#[tokio::test]
async fn successful_crawl_ends_completed() -> TestResult {
    init_tracing();
    let crawler = fake_crawler_script(
        r#"
echo "STATUS:START"
echo "PROGRESS:10"
echo "Crawling round 1"
echo "PROGRESS:55"
echo "STATUS:COMPLETE"
"#,
    )?;
    let orch = orchestrator_for(&crawler);

    orch.start(&LaunchRequest::new("flashscore")).await?;
    let state = run_to_end(&orch).await;

    assert_eq!(
        state,
        StatusRecord::new(RunStatus::Completed, 100, "Crawling round 1")
    );
    Ok(())
}

#[tokio::test]
async fn crawler_receives_arguments_in_order() -> TestResult {
    init_tracing();
    let crawler = fake_crawler_script(r#"echo "$@""#)?;
    let orch = orchestrator_for(&crawler);

    let request = LaunchRequestBuilder::new("betinfo")
        .start_round("5")
        .end_round("7")
        .timeout(60)
        .build();
    orch.start(&request).await?;
    let state = run_to_end(&orch).await;

    // The run never reported a terminal status.
    assert_eq!(state.status, RunStatus::Idle);
    assert_eq!(state.last_log, "Process finished.");

    let (tx, rx) = mpsc::channel(16);
    let launcher = ChildLauncher::new(GRACE);
    launcher.execute(&crawler.command(), &request.to_args(), tx)?;
    let events = with_timeout(collect_run(rx)).await;
    assert_eq!(
        events[0],
        ProcessEvent::Stdout(
            "--mode betinfo --start-round 5 --end-round 7 --headless --timeout 60".to_string()
        )
    );
    Ok(())
}

#[tokio::test]
async fn error_on_stderr_fails_the_run() -> TestResult {
    init_tracing();
    let crawler = fake_crawler_script(
        r#"
echo "STATUS:START"
echo "PROGRESS:20"
echo "ERROR:Network down" >&2
exit 1
"#,
    )?;
    let orch = orchestrator_for(&crawler);

    orch.start(&LaunchRequest::new("flashscore")).await?;
    let state = run_to_end(&orch).await;

    assert_eq!(state.status, RunStatus::Failed);
    assert_eq!(state.last_log, "ERROR:Network down");
    assert_eq!(state.progress, 20);
    Ok(())
}

#[tokio::test]
async fn missing_program_is_reported_as_failed_run() -> TestResult {
    init_tracing();
    let orch = Orchestrator::with_launcher(
        ChildLauncher::new(GRACE),
        CommandSpec::new("/nonexistent/crawlctl-test-crawler"),
    );

    orch.start(&LaunchRequest::new("flashscore")).await?;

    let state = orch.full_state();
    assert_eq!(state.status, RunStatus::Failed);
    assert!(state.last_log.starts_with("Failed to start process:"));
    assert!(!state.last_log.contains("/nonexistent/crawlctl-test-crawler"));
    assert!(!orch.is_running());

    orch.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn launcher_reports_spawn_errors() -> TestResult {
    init_tracing();
    let launcher = ChildLauncher::new(GRACE);
    let (tx, _rx) = mpsc::channel(4);

    let result = launcher.execute(&CommandSpec::new("/nonexistent/crawlctl-test-crawler"), &[], tx);

    match result {
        Err(CrawlctlError::Launch { program, .. }) => {
            assert_eq!(program, "/nonexistent/crawlctl-test-crawler");
        }
        other => panic!("expected Launch error, got {other:?}"),
    }
    assert!(!launcher.is_running());
    Ok(())
}

#[tokio::test]
async fn launcher_runs_one_process_at_a_time() -> TestResult {
    init_tracing();
    let crawler = fake_crawler_script("echo ready\nsleep 1")?;
    let launcher = ChildLauncher::new(GRACE);

    let (tx, mut rx) = mpsc::channel(16);
    launcher.execute(&crawler.command(), &[], tx)?;

    let first = with_timeout(rx.recv()).await;
    assert_eq!(first, Some(ProcessEvent::Stdout("ready".to_string())));
    assert!(launcher.is_running());
    assert!(launcher.pid().is_some());

    let (tx2, _rx2) = mpsc::channel(16);
    let second = launcher.execute(&crawler.command(), &[], tx2);
    assert!(matches!(second, Err(CrawlctlError::AlreadyRunning)));

    with_timeout(launcher.shutdown()).await;
    assert!(!launcher.is_running());
    assert_eq!(launcher.pid(), None);
    Ok(())
}

#[tokio::test]
async fn lines_are_split_on_crlf_and_final_partial_line_is_kept() -> TestResult {
    init_tracing();
    let crawler = fake_crawler_script(r"printf 'STATUS:START\r\nPROGRESS:40\r\ncaf\377\nno newline at end'")?;
    let launcher = ChildLauncher::new(GRACE);

    let (tx, rx) = mpsc::channel(16);
    launcher.execute(&crawler.command(), &[], tx)?;
    let events = with_timeout(collect_run(rx)).await;

    assert_eq!(
        events,
        vec![
            ProcessEvent::Stdout("STATUS:START".to_string()),
            ProcessEvent::Stdout("PROGRESS:40".to_string()),
            ProcessEvent::Stdout("caf\u{FFFD}".to_string()),
            ProcessEvent::Stdout("no newline at end".to_string()),
            ProcessEvent::Exited(ExitOutcome::Code(0)),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn stop_terminates_cooperative_crawler() -> TestResult {
    init_tracing();
    let crawler = fake_crawler_script(
        r#"
echo "STATUS:START"
echo "PROGRESS:25"
while true; do sleep 0.05; done
"#,
    )?;
    let orch = orchestrator_for(&crawler);

    orch.start(&LaunchRequest::new("flashscore")).await?;
    wait_until(|| orch.full_state().progress == 25).await;

    with_timeout(orch.stop()).await;
    let state = run_to_end(&orch).await;

    assert_eq!(state.status, RunStatus::Idle);
    assert_eq!(state.last_log, "Process finished.");
    assert_eq!(state.progress, 25);
    Ok(())
}

#[tokio::test]
async fn stop_force_kills_crawler_ignoring_sigterm() -> TestResult {
    init_tracing();
    let crawler = fake_crawler_script(
        r#"
trap '' TERM
echo "STATUS:START"
while true; do sleep 0.05; done
"#,
    )?;
    let launcher = ChildLauncher::new(GRACE);
    let (tx, mut rx) = mpsc::channel(16);
    launcher.execute(&crawler.command(), &[], tx)?;

    let first = with_timeout(rx.recv()).await;
    assert_eq!(first, Some(ProcessEvent::Stdout("STATUS:START".to_string())));

    let started = Instant::now();
    with_timeout(launcher.stop()).await;
    assert!(started.elapsed() >= GRACE);

    let events = with_timeout(collect_run(rx)).await;
    assert_eq!(
        events.last(),
        Some(&ProcessEvent::Exited(ExitOutcome::Signal(9)))
    );

    wait_until(|| !launcher.is_running()).await;
    launcher.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn crawler_can_run_again_after_it_was_stopped() -> TestResult {
    init_tracing();
    let crawler = fake_crawler_script(
        r#"
echo "STATUS:START"
while true; do sleep 0.05; done
"#,
    )?;
    let orch = orchestrator_for(&crawler);

    orch.start(&LaunchRequest::new("flashscore")).await?;
    assert!(orch.is_running());
    with_timeout(orch.stop()).await;
    wait_until(|| !orch.is_running()).await;

    orch.start(&LaunchRequest::new("flashscore")).await?;
    assert_eq!(orch.status(), RunStatus::Running);
    assert!(orch.is_running());

    with_timeout(orch.shutdown()).await;
    assert!(!orch.is_running());
    Ok(())
}

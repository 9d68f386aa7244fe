// tests/config_loading.rs

mod common;
use crate::common::builders::ConfigFileBuilder;

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::NamedTempFile;

use crawlctl::config::{ConfigFile, load_and_validate, load_from_path};
use crawlctl::errors::CrawlctlError;

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(contents: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = NamedTempFile::new()?;
    write!(file, "{contents}")?;
    Ok(file)
}

fn expect_config_error(contents: &str, needle: &str) -> TestResult {
    let file = write_config(contents)?;
    match load_and_validate(file.path()) {
        Err(CrawlctlError::ConfigError(msg)) => {
            assert!(msg.contains(needle), "message {msg:?} should mention {needle:?}");
        }
        Err(e) => panic!("Expected ConfigError, got: {e:?}"),
        Ok(_) => panic!("Expected error, got Ok"),
    }
    Ok(())
}

#[test]
fn full_config_is_loaded() -> TestResult {
    let file = write_config(
        r#"
[crawler]
program = "/usr/bin/python3.12"
script = "crawler/run.py"
working_dir = "/srv/crawler"
grace_period_ms = 2500
poll_interval_ms = 250

[defaults]
mode = "betinfo"
headless = false
timeout = 90

[server]
host = "0.0.0.0"
port = 9090
"#,
    )?;

    let cfg = load_and_validate(file.path())?;

    assert_eq!(cfg.crawler.program, "/usr/bin/python3.12");
    assert_eq!(cfg.crawler.script, PathBuf::from("crawler/run.py"));
    assert_eq!(cfg.crawler.working_dir, Some(PathBuf::from("/srv/crawler")));
    assert_eq!(cfg.crawler.grace_period(), Duration::from_millis(2500));
    assert_eq!(cfg.crawler.poll_interval(), Duration::from_millis(250));

    let request = cfg.defaults.launch_request();
    assert_eq!(request.mode, "betinfo");
    assert!(!request.headless);
    assert_eq!(request.timeout_seconds, 90);

    assert_eq!(cfg.server.host, "0.0.0.0");
    assert_eq!(cfg.server.port, 9090);

    let command = cfg.crawler.command_spec();
    assert_eq!(command.program, "/usr/bin/python3.12");
    assert_eq!(command.script, Some(PathBuf::from("crawler/run.py")));
    assert_eq!(command.working_dir, Some(PathBuf::from("/srv/crawler")));
    Ok(())
}

#[test]
fn empty_file_uses_defaults() -> TestResult {
    let file = write_config("")?;

    let cfg = load_and_validate(file.path())?;

    assert_eq!(cfg.crawler.program, "python3");
    assert_eq!(cfg.crawler.script, PathBuf::from("python-crawler/main.py"));
    assert_eq!(cfg.crawler.working_dir, None);
    assert_eq!(cfg.crawler.grace_period(), Duration::from_secs(1));
    assert_eq!(cfg.crawler.poll_interval(), Duration::from_millis(500));
    assert_eq!(cfg.defaults.mode, "flashscore");
    assert!(cfg.defaults.headless);
    assert_eq!(cfg.defaults.timeout, 300);
    assert_eq!(cfg.server.host, "127.0.0.1");
    assert_eq!(cfg.server.port, 8080);
    Ok(())
}

#[test]
fn partial_section_keeps_other_defaults() -> TestResult {
    let file = write_config(
        r#"
[crawler]
grace_period_ms = 50
"#,
    )?;

    let cfg = load_and_validate(file.path())?;

    assert_eq!(cfg.crawler.grace_period(), Duration::from_millis(50));
    assert_eq!(cfg.crawler.program, "python3");
    assert_eq!(cfg.defaults.mode, "flashscore");
    Ok(())
}

#[test]
fn zero_grace_period_is_rejected() -> TestResult {
    expect_config_error("[crawler]\ngrace_period_ms = 0\n", "grace_period_ms")
}

#[test]
fn zero_poll_interval_is_rejected() -> TestResult {
    expect_config_error("[crawler]\npoll_interval_ms = 0\n", "poll_interval_ms")
}

#[test]
fn empty_program_is_rejected() -> TestResult {
    expect_config_error("[crawler]\nprogram = \"  \"\n", "[crawler].program")
}

#[test]
fn empty_script_is_rejected() -> TestResult {
    expect_config_error("[crawler]\nscript = \"\"\n", "[crawler].script")
}

#[test]
fn empty_default_mode_is_rejected() -> TestResult {
    expect_config_error("[defaults]\nmode = \"\"\n", "[defaults].mode")
}

#[test]
fn zero_timeout_is_rejected() -> TestResult {
    expect_config_error("[defaults]\ntimeout = 0\n", "[defaults].timeout")
}

#[test]
fn zero_port_is_rejected() -> TestResult {
    expect_config_error("[server]\nport = 0\n", "[server].port")
}

#[test]
fn malformed_toml_is_a_toml_error() -> TestResult {
    let file = write_config("[crawler\nprogram = ")?;

    let result = load_from_path(file.path());

    assert!(matches!(result, Err(CrawlctlError::TomlError(_))));
    Ok(())
}

#[test]
fn wrong_value_type_is_a_toml_error() -> TestResult {
    let file = write_config("[server]\nport = \"eighty\"\n")?;

    let result = load_and_validate(file.path());

    assert!(matches!(result, Err(CrawlctlError::TomlError(_))));
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() {
    let result = load_and_validate("/nonexistent/dir/Crawlctl.toml");
    assert!(matches!(result, Err(CrawlctlError::IoError(_))));
}

#[test]
fn builder_goes_through_validation() {
    let cfg = ConfigFileBuilder::new()
        .program("sh")
        .script("crawler.sh")
        .working_dir("/tmp")
        .grace_period_ms(100)
        .default_mode("betinfo")
        .build();

    assert_eq!(cfg.crawler.command_spec().display_with(&[]), "sh crawler.sh");
    assert_eq!(cfg.crawler.grace_period(), Duration::from_millis(100));
    assert_eq!(cfg.defaults.mode, "betinfo");

    let invalid = ConfigFileBuilder::new().grace_period_ms(0).raw();
    assert!(ConfigFile::try_from(invalid).is_err());
}

#[test]
fn default_config_matches_empty_file() {
    let cfg = ConfigFile::default();
    assert_eq!(cfg.crawler.program, "python3");
    assert_eq!(cfg.server.port, 8080);
}

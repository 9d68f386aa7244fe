// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::exec::CommandSpec;
use crate::types::{DEFAULT_TIMEOUT_SECONDS, LaunchRequest};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [crawler]
/// program = "python3"
/// script = "python-crawler/main.py"
/// grace_period_ms = 1000
///
/// [defaults]
/// mode = "flashscore"
/// headless = true
/// timeout = 300
///
/// [server]
/// host = "127.0.0.1"
/// port = 8080
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub crawler: CrawlerSection,

    #[serde(default)]
    pub defaults: DefaultsSection,

    #[serde(default)]
    pub server: ServerSection,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub crawler: CrawlerSection,
    pub defaults: DefaultsSection,
    pub server: ServerSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        crawler: CrawlerSection,
        defaults: DefaultsSection,
        server: ServerSection,
    ) -> Self {
        Self {
            crawler,
            defaults,
            server,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        let raw = RawConfigFile::default();
        Self::new_unchecked(raw.crawler, raw.defaults, raw.server)
    }
}

/// `[crawler]` section: how the crawler process is launched and stopped.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerSection {
    /// Interpreter or executable to run.
    #[serde(default = "default_program")]
    pub program: String,

    /// Script handed to `program` as its first argument.
    #[serde(default = "default_script")]
    pub script: PathBuf,

    /// Working directory of the child; the current directory when unset.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Delay between SIGTERM and the forced kill on stop.
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,

    /// How often `crawlctl run` polls the status while following a run.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_program() -> String {
    "python3".to_string()
}

fn default_script() -> PathBuf {
    PathBuf::from("python-crawler/main.py")
}

fn default_grace_period_ms() -> u64 {
    1000
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl Default for CrawlerSection {
    fn default() -> Self {
        Self {
            program: default_program(),
            script: default_script(),
            working_dir: None,
            grace_period_ms: default_grace_period_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl CrawlerSection {
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn command_spec(&self) -> CommandSpec {
        CommandSpec {
            program: self.program.clone(),
            script: Some(self.script.clone()),
            working_dir: self.working_dir.clone(),
        }
    }
}

/// `[defaults]` section: fallback values for launch requests.
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultsSection {
    #[serde(default = "default_mode")]
    pub mode: String,

    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Seconds, forwarded to the crawler as `--timeout`.
    #[serde(default = "default_timeout")]
    pub timeout: u32,
}

fn default_mode() -> String {
    "flashscore".to_string()
}

fn default_headless() -> bool {
    true
}

fn default_timeout() -> u32 {
    DEFAULT_TIMEOUT_SECONDS
}

impl Default for DefaultsSection {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            headless: default_headless(),
            timeout: default_timeout(),
        }
    }
}

impl DefaultsSection {
    /// A launch request made only of configured defaults.
    pub fn launch_request(&self) -> LaunchRequest {
        LaunchRequest {
            mode: self.mode.clone(),
            start_round: None,
            end_round: None,
            headless: self.headless,
            timeout_seconds: self.timeout,
        }
    }
}

/// `[server]` section for `crawlctl serve`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

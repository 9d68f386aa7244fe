#![allow(dead_code)]

use std::path::PathBuf;

use crawlctl::config::{ConfigFile, RawConfigFile};
use crawlctl::types::LaunchRequest;

/// Builder for `LaunchRequest` to simplify test setup.
pub struct LaunchRequestBuilder {
    request: LaunchRequest,
}

impl LaunchRequestBuilder {
    pub fn new(mode: &str) -> Self {
        Self {
            request: LaunchRequest::new(mode),
        }
    }

    pub fn start_round(mut self, round: &str) -> Self {
        self.request.start_round = Some(round.to_string());
        self
    }

    pub fn end_round(mut self, round: &str) -> Self {
        self.request.end_round = Some(round.to_string());
        self
    }

    pub fn headless(mut self, val: bool) -> Self {
        self.request.headless = val;
        self
    }

    pub fn timeout(mut self, seconds: u32) -> Self {
        self.request.timeout_seconds = seconds;
        self
    }

    pub fn build(self) -> LaunchRequest {
        self.request
    }
}

/// Builder for `ConfigFile`; goes through validation like a loaded file.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn program(mut self, program: &str) -> Self {
        self.config.crawler.program = program.to_string();
        self
    }

    pub fn script(mut self, script: impl Into<PathBuf>) -> Self {
        self.config.crawler.script = script.into();
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.crawler.working_dir = Some(dir.into());
        self
    }

    pub fn grace_period_ms(mut self, ms: u64) -> Self {
        self.config.crawler.grace_period_ms = ms;
        self
    }

    pub fn default_mode(mut self, mode: &str) -> Self {
        self.config.defaults.mode = mode.to_string();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

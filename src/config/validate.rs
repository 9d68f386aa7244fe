// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{CrawlctlError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = CrawlctlError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.crawler, raw.defaults, raw.server))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_crawler(cfg)?;
    validate_defaults(cfg)?;
    validate_server(cfg)?;
    Ok(())
}

fn validate_crawler(cfg: &RawConfigFile) -> Result<()> {
    let crawler = &cfg.crawler;

    if crawler.program.trim().is_empty() {
        return Err(config_error("[crawler].program must not be empty"));
    }
    if crawler.script.as_os_str().is_empty() {
        return Err(config_error("[crawler].script must not be empty"));
    }
    if crawler.grace_period_ms == 0 {
        return Err(config_error("[crawler].grace_period_ms must be >= 1 (got 0)"));
    }
    if crawler.poll_interval_ms == 0 {
        return Err(config_error("[crawler].poll_interval_ms must be >= 1 (got 0)"));
    }

    Ok(())
}

fn validate_defaults(cfg: &RawConfigFile) -> Result<()> {
    if cfg.defaults.mode.trim().is_empty() {
        return Err(config_error("[defaults].mode must not be empty"));
    }
    if cfg.defaults.timeout == 0 {
        return Err(config_error("[defaults].timeout must be >= 1 (got 0)"));
    }
    Ok(())
}

fn validate_server(cfg: &RawConfigFile) -> Result<()> {
    if cfg.server.host.trim().is_empty() {
        return Err(config_error("[server].host must not be empty"));
    }
    if cfg.server.port == 0 {
        return Err(config_error("[server].port must be >= 1 (got 0)"));
    }
    Ok(())
}

fn config_error(msg: &str) -> CrawlctlError {
    CrawlctlError::ConfigError(msg.to_string())
}

//! Logging setup.
//!
//! The terminal belongs to the UI, so everything goes to a size-rotated log file.
//!
//! # Environment Variables
//! - `AGENT_MAKER_LOG`: overrides the log level (e.g. `debug`).

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use log::LevelFilter;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::config::LoggingConfig;

pub const LEVEL_ENV: &str = "AGENT_MAKER_LOG";

const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {l:<5} {t} - {m}{n}";
const ROLL_SIZE_BYTES: u64 = 1024 * 1024;
const ROLL_ARCHIVES: u32 = 3;

/// Installs the global logger.
pub fn init(config: &LoggingConfig, workspace_root: &Path) -> Result<()> {
    if let Some(file) = config.config.as_ref() {
        let path = resolve(workspace_root, file);
        log4rs::init_file(&path, Default::default())
            .with_context(|| format!("failed to load log config: {}", path.display()))?;
        log::info!("Logging configured from {}", path.display());
        return Ok(());
    }

    let level = effective_level(env::var(LEVEL_ENV).ok().as_deref(), config.level.as_deref());
    let file = config
        .file
        .as_ref()
        .map(|file| resolve(workspace_root, file))
        .unwrap_or_else(|| default_log_file(workspace_root));
    let log_config = build_config(&file, level)?;
    log4rs::init_config(log_config).context("failed to install logger")?;
    log::info!("Logging initialized at {} ({})", file.display(), level);
    Ok(())
}

pub fn default_log_file(workspace_root: &Path) -> PathBuf {
    workspace_root.join("logs/agent-maker.log")
}

/// Builds a rolling file configuration writing to `file`.
pub fn build_config(file: &Path, level: LevelFilter) -> Result<Config> {
    let archive_pattern = format!("{}.{{}}.gz", file.display());
    let roller = FixedWindowRoller::builder()
        .build(&archive_pattern, ROLL_ARCHIVES)
        .context("failed to build log roller")?;
    let policy = CompoundPolicy::new(
        Box::new(SizeTrigger::new(ROLL_SIZE_BYTES)),
        Box::new(roller),
    );
    let appender = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(file, Box::new(policy))
        .with_context(|| format!("failed to open log file: {}", file.display()))?;

    Config::builder()
        .appender(Appender::builder().build("file", Box::new(appender)))
        .build(Root::builder().appender("file").build(level))
        .context("invalid log configuration")
}

/// Env override first, then the configured level, then `info`.
pub fn effective_level(env_level: Option<&str>, configured: Option<&str>) -> LevelFilter {
    env_level
        .and_then(parse_level)
        .or_else(|| configured.and_then(parse_level))
        .unwrap_or(LevelFilter::Info)
}

fn parse_level(value: &str) -> Option<LevelFilter> {
    match value.trim().to_lowercase().as_str() {
        "warning" => Some(LevelFilter::Warn),
        other => LevelFilter::from_str(other).ok(),
    }
}

fn resolve(workspace_root: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        workspace_root.join(path)
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_level_overrides_config() {
        assert_eq!(effective_level(Some("debug"), Some("warn")), LevelFilter::Debug);
        assert_eq!(effective_level(None, Some("WARNING")), LevelFilter::Warn);
        assert_eq!(effective_level(Some("nonsense"), Some("error")), LevelFilter::Error);
        assert_eq!(effective_level(None, None), LevelFilter::Info);
    }

    #[test]
    fn builds_rolling_config_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("logs/agent-maker.log");
        let config = build_config(&file, LevelFilter::Debug).unwrap();
        assert_eq!(config.root().level(), LevelFilter::Debug);
        assert_eq!(config.appenders().len(), 1);
    }

    #[test]
    fn relative_paths_resolve_under_workspace() {
        let root = Path::new("/work");
        assert_eq!(resolve(root, Path::new("logs/x.log")), PathBuf::from("/work/logs/x.log"));
        assert_eq!(resolve(root, Path::new("/var/log/x.log")), PathBuf::from("/var/log/x.log"));
    }
}

//! File-based logger with size-based rotation.
//!
//! Logs are written to `~/.config/cornice/logs/cornice.log`. When the
//! file exceeds the configured max size, it is rotated to
//! `cornice.log.1` (one backup kept). Lines are mirrored to stderr so
//! a `--console` run shows them live.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use serde::{Deserialize, Serialize};

static LOGGER: OnceLock<Mutex<Logger>> = OnceLock::new();

const LOG_FILE_NAME: &str = "cornice.log";
const BACKUP_SUFFIX: &str = ".1";

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Whether file logging is enabled. Defaults to `false`.
    pub enabled: bool,
    /// Minimum log level: "debug", "info", "warn", or "error".
    pub level: String,
    /// Maximum log file size in megabytes before rotation.
    pub max_file_mb: u64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".into(),
            max_file_mb: 10,
        }
    }
}

/// Log severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }

    fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Self::Debug,
            "warn" => Self::Warn,
            "error" => Self::Error,
            _ => Self::Info,
        }
    }
}

struct Logger {
    file: Option<File>,
    path: Option<PathBuf>,
    min_level: Level,
    max_bytes: u64,
    written: u64,
    echo: bool,
}

/// Initialises the global logger. Call once at service startup.
///
/// With `config.enabled` false the logger still exists so warn/error
/// lines reach stderr, but nothing is written to disk.
pub fn init(config: &LogConfig, echo: bool) {
    let mut file = None;
    let mut path = None;
    let mut written = 0;

    if config.enabled
        && let Some(dir) = crate::config::config_dir()
    {
        let log_dir = dir.join("logs");
        let _ = fs::create_dir_all(&log_dir);
        let candidate = log_dir.join(LOG_FILE_NAME);
        if let Ok(f) = OpenOptions::new().create(true).append(true).open(&candidate) {
            written = f.metadata().map(|m| m.len()).unwrap_or(0);
            file = Some(f);
            path = Some(candidate);
        }
    }

    let logger = Logger {
        file,
        path,
        min_level: Level::parse(&config.level),
        max_bytes: config.max_file_mb * 1024 * 1024,
        written,
        echo,
    };

    let _ = LOGGER.set(Mutex::new(logger));
}

/// Writes a log line if the level is at or above the configured minimum.
pub fn write(level: Level, args: fmt::Arguments<'_>) {
    let Some(mutex) = LOGGER.get() else {
        return;
    };
    let Ok(mut logger) = mutex.lock() else {
        return;
    };
    if level < logger.min_level {
        return;
    }
    let now = timestamp();
    let line = format!("{now} [{lvl}] {args}\n", lvl = level.as_str());

    if logger.echo {
        eprint!("{line}");
    }

    if let Some(file) = logger.file.as_mut() {
        let bytes = line.len() as u64;
        let _ = file.write_all(line.as_bytes());
        logger.written += bytes;

        if logger.max_bytes > 0 && logger.written >= logger.max_bytes {
            logger.rotate();
        }
    }
}

impl Logger {
    fn rotate(&mut self) {
        let Some(path) = self.path.clone() else {
            return;
        };
        let backup = path.with_extension(format!(
            "{}{}",
            LOG_FILE_NAME.rsplit('.').next().unwrap_or("log"),
            BACKUP_SUFFIX
        ));
        let _ = fs::rename(&path, &backup);
        if let Ok(f) = OpenOptions::new().create(true).append(true).open(&path) {
            self.file = Some(f);
        }
        self.written = 0;
    }
}

fn timestamp() -> String {
    // Use std::time for a simple UTC timestamp. No chrono dependency.
    let dur = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = dur.as_secs();
    let (h, m, s) = (secs / 3600 % 24, secs / 60 % 60, secs % 60);
    format!("{h:02}:{m:02}:{s:02}")
}

/// Logs at DEBUG level.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::log::write($crate::log::Level::Debug, format_args!($($arg)*)) };
}

/// Logs at INFO level.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::log::write($crate::log::Level::Info, format_args!($($arg)*)) };
}

/// Logs at WARN level.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::log::write($crate::log::Level::Warn, format_args!($($arg)*)) };
}

/// Logs at ERROR level.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => { $crate::log::write($crate::log::Level::Error, format_args!($($arg)*)) };
}

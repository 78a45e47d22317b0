//! Leveled run log for linebal.
//!
//! Every run truncates `~/.linebal/linebal.log` and appends one line per
//! message at or above the active level:
//! - ERROR: The failure a run exits with
//! - WARN: Suspicious but usable input (unconstrained tasks, empty stations)
//! - INFO: Inputs loaded and the result summary
//! - DEBUG: Phase summaries of the balancer
//! - TRACE: Every placement and improvement move
//!
//! The level comes from `--debug`/`--trace`, else from `LINEBAL_LOG=<level>`
//! or `LINEBAL_DEBUG=1`, else INFO.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

use crate::Error;

const LOG_FILE: &str = "linebal.log";

static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => LogLevel::Error,
            1 => LogLevel::Warn,
            2 => LogLevel::Info,
            3 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    /// Level requested through the environment, if any.
    ///
    /// `LINEBAL_LOG` names a level; `LINEBAL_DEBUG=1` (or `true`) means DEBUG.
    /// An unreadable `LINEBAL_LOG` is ignored.
    pub fn from_env() -> Option<Self> {
        if let Some(level) = std::env::var("LINEBAL_LOG")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            return Some(level);
        }
        std::env::var("LINEBAL_DEBUG")
            .ok()
            .filter(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .map(|_| LogLevel::Debug)
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(Error::invalid_input(
                "log level",
                format!("expected error, warn, info, debug or trace, got {:?}", s),
            )),
        }
    }
}

/// Start the run log at `level`, truncating the previous run's file.
///
/// Without a home directory the level is still set but nothing is written.
pub fn init(level: LogLevel) {
    set_level(level);
    if let Some(dir) = dirs::home_dir().map(|h| h.join(".linebal")) {
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join(LOG_FILE);
        let _ = std::fs::write(&path, "");
        LOG_PATH.set(path).ok();
    }
}

/// Where this run logs, once `init` found a home directory.
pub fn log_path() -> Option<&'static Path> {
    LOG_PATH.get().map(PathBuf::as_path)
}

pub fn set_level(level: LogLevel) {
    LOG_LEVEL.store(level as u8, Ordering::SeqCst);
}

pub fn get_level() -> LogLevel {
    LogLevel::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

pub fn enabled(level: LogLevel) -> bool {
    level <= get_level()
}

/// Append `msg` to the run log if `level` is active.
pub fn log_at(level: LogLevel, msg: &str) {
    if !enabled(level) {
        return;
    }

    if let Some(path) = log_path() {
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let timestamp = chrono::Local::now().format("%H:%M:%S%.3f");
            let _ = writeln!(file, "[{}] [{:<5}] {}", timestamp, level.as_str(), msg);
        }
    }
}

/// Log at INFO.
#[macro_export]
macro_rules! lblog {
    ($($arg:tt)*) => {
        $crate::log::log_at($crate::log::LogLevel::Info, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! lblog_error {
    ($($arg:tt)*) => {
        $crate::log::log_at($crate::log::LogLevel::Error, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! lblog_warn {
    ($($arg:tt)*) => {
        $crate::log::log_at($crate::log::LogLevel::Warn, &format!($($arg)*))
    };
}

/// Log at DEBUG. The message is only formatted when DEBUG is active.
#[macro_export]
macro_rules! lblog_debug {
    ($($arg:tt)*) => {
        if $crate::log::enabled($crate::log::LogLevel::Debug) {
            $crate::log::log_at($crate::log::LogLevel::Debug, &format!($($arg)*))
        }
    };
}

/// Log at TRACE. Used inside the balancer's loops, so formatting is skipped
/// unless TRACE is active.
#[macro_export]
macro_rules! lblog_trace {
    ($($arg:tt)*) => {
        if $crate::log::enabled($crate::log::LogLevel::Trace) {
            $crate::log::log_at($crate::log::LogLevel::Trace, &format!($($arg)*))
        }
    };
}

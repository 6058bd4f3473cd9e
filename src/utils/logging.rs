//! Structured Logging with Sensitive Data Redaction
//!
//! Writes one line per event to stderr:
//! `<timestamp> <LEVEL> [<module>] <message> | key=value ...`
//!
//! Field values are redacted by key name: key material is never printed,
//! addresses and digests are shortened.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Minimum level that is emitted; Info by default
static MIN_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl LogLevel {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Debug,
            1 => LogLevel::Info,
            2 => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Set the minimum level that gets written
pub fn set_level(level: LogLevel) {
    MIN_LEVEL.store(level as u8, Ordering::SeqCst);
}

/// Current minimum level
pub fn level() -> LogLevel {
    LogLevel::from_u8(MIN_LEVEL.load(Ordering::SeqCst))
}

/// Whether an entry at `level` would be written
///
/// The logging macros check this before evaluating field values.
pub fn enabled(level: LogLevel) -> bool {
    level >= self::level()
}

/// Enable debug logging
pub fn enable_debug() {
    set_level(LogLevel::Debug);
}

/// Check if debug logging is enabled
pub fn is_debug_enabled() -> bool {
    level() == LogLevel::Debug
}

/// Structured log entry
#[derive(Debug)]
pub struct LogEntry {
    pub level: LogLevel,
    pub module: &'static str,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
}

impl LogEntry {
    pub fn new(level: LogLevel, module: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            module,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field to the log entry (auto-redacts sensitive data)
    pub fn field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        let redacted = redact_if_sensitive(key, &value.to_string());
        self.fields.push((key, redacted));
        self
    }

    /// Render the line without the timestamp
    pub fn render(&self) -> String {
        if self.fields.is_empty() {
            return format!("{} [{}] {}", self.level, self.module, self.message);
        }

        let fields = self
            .fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");
        format!("{} [{}] {} | {}", self.level, self.module, self.message, fields)
    }

    /// Log the entry
    pub fn log(self) {
        if !enabled(self.level) {
            return;
        }

        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
        eprintln!("[{}] {}", timestamp, self.render());
    }
}

/// Redact a value if the key suggests it's sensitive
fn redact_if_sensitive(key: &str, value: &str) -> String {
    let key_lower = key.to_lowercase();

    const SECRET_KEYS: [&str; 6] = ["private", "secret", "seed", "mnemonic", "password", "key_hex"];
    if SECRET_KEYS.iter().any(|k| key_lower.contains(k)) || key_lower == "key" {
        return redact_value(value);
    }

    const ADDRESS_KEYS: [&str; 5] = ["address", "authority", "delegate", "sender", "signer"];
    if ADDRESS_KEYS.iter().any(|k| key_lower.contains(k)) || key_lower == "to" {
        return redact_address(value);
    }

    const HASH_KEYS: [&str; 3] = ["hash", "digest", "raw"];
    if HASH_KEYS.iter().any(|k| key_lower.contains(k)) {
        return redact_hash(value);
    }

    value.to_string()
}

/// Fully redact a sensitive value
fn redact_value(value: &str) -> String {
    match value.len() {
        0 => "[EMPTY]".to_string(),
        1..=4 => "[REDACTED]".to_string(),
        len => format!("[REDACTED:{}chars]", len),
    }
}

/// Partially redact an address (show prefix and last 4 chars)
fn redact_address(address: &str) -> String {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return "[EMPTY]".to_string();
    }

    let prefix_len = if trimmed.starts_with("0x") { 8 } else { 6 };
    if trimmed.len() <= prefix_len + 4 + 3 {
        return trimmed.to_string();
    }

    format!("{}...{}", &trimmed[..prefix_len], &trimmed[trimmed.len() - 4..])
}

/// Partially redact a hash (show first 10 and last 6 chars)
fn redact_hash(hash: &str) -> String {
    let trimmed = hash.trim();
    if trimmed.len() <= 20 {
        return trimmed.to_string();
    }

    let prefix_len = if trimmed.starts_with("0x") { 12 } else { 10 };
    format!("{}...{}", &trimmed[..prefix_len], &trimmed[trimmed.len() - 6..])
}

/// Convenience macro for debug logging
#[macro_export]
macro_rules! log_debug {
    ($module:expr, $msg:expr) => {
        $crate::utils::logging::LogEntry::new($crate::utils::logging::LogLevel::Debug, $module, $msg).log()
    };
    ($module:expr, $msg:expr, $($key:ident = $value:expr),* $(,)?) => {
        if $crate::utils::logging::enabled($crate::utils::logging::LogLevel::Debug) {
            $crate::utils::logging::LogEntry::new($crate::utils::logging::LogLevel::Debug, $module, $msg)
            $(.field(stringify!($key), &$value))*
            .log()
        }
    };
}

/// Convenience macro for info logging
#[macro_export]
macro_rules! log_info {
    ($module:expr, $msg:expr) => {
        $crate::utils::logging::LogEntry::new($crate::utils::logging::LogLevel::Info, $module, $msg).log()
    };
    ($module:expr, $msg:expr, $($key:ident = $value:expr),* $(,)?) => {
        if $crate::utils::logging::enabled($crate::utils::logging::LogLevel::Info) {
            $crate::utils::logging::LogEntry::new($crate::utils::logging::LogLevel::Info, $module, $msg)
            $(.field(stringify!($key), &$value))*
            .log()
        }
    };
}

/// Convenience macro for warning logging
#[macro_export]
macro_rules! log_warn {
    ($module:expr, $msg:expr) => {
        $crate::utils::logging::LogEntry::new($crate::utils::logging::LogLevel::Warn, $module, $msg).log()
    };
    ($module:expr, $msg:expr, $($key:ident = $value:expr),* $(,)?) => {
        if $crate::utils::logging::enabled($crate::utils::logging::LogLevel::Warn) {
            $crate::utils::logging::LogEntry::new($crate::utils::logging::LogLevel::Warn, $module, $msg)
            $(.field(stringify!($key), &$value))*
            .log()
        }
    };
}

/// Convenience macro for error logging
#[macro_export]
macro_rules! log_error {
    ($module:expr, $msg:expr) => {
        $crate::utils::logging::LogEntry::new($crate::utils::logging::LogLevel::Error, $module, $msg).log()
    };
    ($module:expr, $msg:expr, $($key:ident = $value:expr),* $(,)?) => {
        if $crate::utils::logging::enabled($crate::utils::logging::LogLevel::Error) {
            $crate::utils::logging::LogEntry::new($crate::utils::logging::LogLevel::Error, $module, $msg)
            $(.field(stringify!($key), &$value))*
            .log()
        }
    };
}

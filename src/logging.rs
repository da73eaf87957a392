/// Structured logging for the turtle risk service
///
/// Provides context-rich logging tagged with the data source and an
/// optional subject (a coordinate or a masked contact), with timestamps
/// and severity levels. Supports console output and an append-only file.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Data Source Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Erddap,
    Model,
    Sms,
    Directory,
    System,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Erddap => write!(f, "ERDDAP"),
            DataSource::Model => write!(f, "MODEL"),
            DataSource::Sms => write!(f, "SMS"),
            DataSource::Directory => write!(f, "DIR"),
            DataSource::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - e.g. the coordinate is on land or outside the grid
    Expected,
    /// Unexpected failure - indicates service degradation or configuration issue
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn log(&self, level: LogLevel, source: &DataSource, subject: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let subject_part = subject.map(|s| format!(" [{}]", s)).unwrap_or_default();
        let log_entry = format!(
            "{} {} {}{}: {}",
            timestamp, level, source, subject_part, message
        );

        // stdout is reserved for command output (JSON responses, reports)
        if self.console_timestamps {
            eprintln!("{}", log_entry);
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", source, subject_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", source, subject_part, message),
                LogLevel::Info => eprintln!("   {}", message),
                LogLevel::Debug => eprintln!("   [DEBUG] {}{}: {}", source, subject_part, message),
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn emit(level: LogLevel, source: DataSource, subject: Option<&str>, message: &str) {
    // Logging before init, or after a panic poisoned the lock, is a no-op.
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, &source, subject, message);
        }
    }
}

/// Log a general informational message
pub fn info(source: DataSource, subject: Option<&str>, message: &str) {
    emit(LogLevel::Info, source, subject, message);
}

/// Log a warning message
pub fn warn(source: DataSource, subject: Option<&str>, message: &str) {
    emit(LogLevel::Warning, source, subject, message);
}

/// Log an error message
pub fn error(source: DataSource, subject: Option<&str>, message: &str) {
    emit(LogLevel::Error, source, subject, message);
}

/// Log a debug message
pub fn debug(source: DataSource, subject: Option<&str>, message: &str) {
    emit(LogLevel::Debug, source, subject, message);
}

/// Reduce a phone contact to its last four digits for log output.
pub fn mask_contact(contact: &str) -> String {
    let digits: Vec<char> = contact.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() <= 4 {
        return "***".to_string();
    }
    let tail: String = digits[digits.len() - 4..].iter().collect();
    format!("***{}", tail)
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify an ERDDAP fetch failure from its error message.
///
/// ERDDAP answers 404 when the requested point falls outside the dataset's
/// grid or on a masked (land) cell, which is routine for near-shore
/// coordinates.
pub fn classify_erddap_failure(error_message: &str) -> FailureType {
    if error_message.contains("HTTP error: 404") {
        FailureType::Expected
    } else if error_message.contains("HTTP error")
        || error_message.contains("Request failed")
        || error_message.contains("timeout")
    {
        FailureType::Unexpected
    } else if error_message.contains("Parse error") {
        // Malformed tables suggest a dataset schema change
        FailureType::Unexpected
    } else {
        // Empty table, null cell
        FailureType::Unknown
    }
}

/// Classify a messaging provider failure
pub fn classify_sms_failure(error_message: &str) -> FailureType {
    if error_message.contains("credentials") || error_message.contains("HTTP 401") {
        FailureType::Unexpected
    } else if error_message.contains("HTTP 400") {
        // Usually an invalid or unreachable recipient number
        FailureType::Expected
    } else {
        FailureType::Unknown
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a failed observation fetch with automatic classification
pub fn log_observation_failure(coordinate: &str, operation: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_erddap_failure(&error_msg);

    let message = format!("{} failed [{}]: {}", operation, failure_type, error_msg);

    match failure_type {
        FailureType::Expected => debug(DataSource::Erddap, Some(coordinate), &message),
        FailureType::Unexpected => error(DataSource::Erddap, Some(coordinate), &message),
        FailureType::Unknown => warn(DataSource::Erddap, Some(coordinate), &message),
    }
}

/// Log a failed SMS send with classification
pub fn log_alert_failure(contact: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_sms_failure(&error_msg);
    let masked = mask_contact(contact);

    let message = format!("Alert delivery failed [{}]: {}", failure_type, error_msg);

    match failure_type {
        FailureType::Expected => warn(DataSource::Sms, Some(&masked), &message),
        FailureType::Unexpected => error(DataSource::Sms, Some(&masked), &message),
        FailureType::Unknown => warn(DataSource::Sms, Some(&masked), &message),
    }
}

// ---------------------------------------------------------------------------
// Verification Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of a batch of source checks
pub fn log_check_summary(source: DataSource, total: usize, successful: usize, failed: usize) {
    let message = format!(
        "Checks complete: {}/{} successful, {} failed",
        successful, total, failed
    );

    if failed == 0 {
        info(source, None, &message);
    } else if successful == 0 {
        error(source, None, &message);
    } else {
        warn(source, None, &message);
    }
}

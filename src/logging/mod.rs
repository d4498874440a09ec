use log::{LevelFilter, Metadata, Record};
use colored::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Log levels for the calculator pipeline.
///
/// The stage levels sit above `Trace`, so enabling `Vm` also shows
/// everything the lexer, parser and code generator report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CompilerLogLevel {
    /// Statement failures
    Error = 0,
    /// Suspicious but recoverable situations
    Warn = 1,
    /// Session progress
    Info = 2,
    /// Detailed information about each stage
    Debug = 3,
    /// Very detailed tracing information
    Trace = 4,
    /// Lexer-specific debug information
    Lexer = 5,
    /// Parser-specific debug information
    Parser = 6,
    /// Instruction emission
    CodeGen = 7,
    /// Stack machine execution
    Vm = 8,
}

impl CompilerLogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompilerLogLevel::Error => "ERROR",
            CompilerLogLevel::Warn => "WARN",
            CompilerLogLevel::Info => "INFO",
            CompilerLogLevel::Debug => "DEBUG",
            CompilerLogLevel::Trace => "TRACE",
            CompilerLogLevel::Lexer => "LEXER",
            CompilerLogLevel::Parser => "PARSER",
            CompilerLogLevel::CodeGen => "CODEGEN",
            CompilerLogLevel::Vm => "VM",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            CompilerLogLevel::Error => Color::Red,
            CompilerLogLevel::Warn => Color::Yellow,
            CompilerLogLevel::Info => Color::Green,
            CompilerLogLevel::Debug => Color::Blue,
            CompilerLogLevel::Trace => Color::Magenta,
            CompilerLogLevel::Lexer => Color::Cyan,
            CompilerLogLevel::Parser => Color::BrightCyan,
            CompilerLogLevel::CodeGen => Color::BrightGreen,
            CompilerLogLevel::Vm => Color::BrightYellow,
        }
    }

    fn from_usize(level: usize) -> CompilerLogLevel {
        match level {
            0 => CompilerLogLevel::Error,
            1 => CompilerLogLevel::Warn,
            2 => CompilerLogLevel::Info,
            3 => CompilerLogLevel::Debug,
            4 => CompilerLogLevel::Trace,
            5 => CompilerLogLevel::Lexer,
            6 => CompilerLogLevel::Parser,
            7 => CompilerLogLevel::CodeGen,
            8 => CompilerLogLevel::Vm,
            _ => CompilerLogLevel::Info,
        }
    }
}

/// Global log level filter
static LOG_LEVEL: AtomicUsize = AtomicUsize::new(CompilerLogLevel::Warn as usize);

/// Colored stderr logger keyed on the record target.
pub struct CompilerLogger {
    enabled_modules: Vec<String>,
}

impl Default for CompilerLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilerLogger {
    pub fn new() -> Self {
        Self {
            enabled_modules: Vec::new(),
        }
    }

    pub fn with_modules(mut self, modules: Vec<String>) -> Self {
        self.enabled_modules = modules;
        self
    }

    pub fn set_level(level: CompilerLogLevel) {
        LOG_LEVEL.store(level as usize, Ordering::Relaxed);
    }

    pub fn get_level() -> CompilerLogLevel {
        CompilerLogLevel::from_usize(LOG_LEVEL.load(Ordering::Relaxed))
    }

    fn should_log(&self, target: &str) -> bool {
        let current_level = Self::get_level();
        let record_level = parse_level_from_target(target);

        if record_level > current_level {
            return false;
        }

        // No filter means every module logs at the current level
        if self.enabled_modules.is_empty() {
            return true;
        }

        self.enabled_modules.iter().any(|module| target.starts_with(module))
    }
}

fn parse_level_from_target(target: &str) -> CompilerLogLevel {
    if target.starts_with("lexer") {
        CompilerLogLevel::Lexer
    } else if target.starts_with("parser") {
        CompilerLogLevel::Parser
    } else if target.starts_with("codegen") {
        CompilerLogLevel::CodeGen
    } else if target.starts_with("vm") {
        CompilerLogLevel::Vm
    } else {
        match target {
            "error" => CompilerLogLevel::Error,
            "warn" => CompilerLogLevel::Warn,
            "info" => CompilerLogLevel::Info,
            "debug" => CompilerLogLevel::Debug,
            "trace" => CompilerLogLevel::Trace,
            _ => CompilerLogLevel::Info,
        }
    }
}

impl log::Log for CompilerLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.should_log(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.should_log(record.target()) {
            return;
        }

        let level = parse_level_from_target(record.target());
        let level_str = level.as_str().color(level.color()).bold();
        let target = record.target().bright_black();

        // Format: [LEVEL] target: message
        eprintln!("[{}] {}: {}", level_str, target, record.args());
    }

    fn flush(&self) {}
}

/// Install the calculator logger as the global `log` backend.
pub fn init_logger(level: CompilerLogLevel, modules: Option<Vec<String>>) -> Result<(), log::SetLoggerError> {
    let logger = CompilerLogger::new().with_modules(modules.unwrap_or_default());
    CompilerLogger::set_level(level);
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(LevelFilter::Trace);
    Ok(())
}

/// Convenience macros for logging
#[macro_export]
macro_rules! compiler_error {
    ($($arg:tt)*) => {
        log::log!(target: "error", log::Level::Error, $($arg)*)
    };
}

#[macro_export]
macro_rules! compiler_warn {
    ($($arg:tt)*) => {
        log::log!(target: "warn", log::Level::Warn, $($arg)*)
    };
}

#[macro_export]
macro_rules! compiler_info {
    ($($arg:tt)*) => {
        log::log!(target: "info", log::Level::Info, $($arg)*)
    };
}

#[macro_export]
macro_rules! compiler_debug {
    ($($arg:tt)*) => {
        log::log!(target: "debug", log::Level::Debug, $($arg)*)
    };
}

#[macro_export]
macro_rules! compiler_trace {
    ($($arg:tt)*) => {
        log::log!(target: "trace", log::Level::Trace, $($arg)*)
    };
}

#[macro_export]
macro_rules! lexer_log {
    ($($arg:tt)*) => {
        log::log!(target: "lexer", log::Level::Debug, $($arg)*)
    };
}

#[macro_export]
macro_rules! parser_log {
    ($($arg:tt)*) => {
        log::log!(target: "parser", log::Level::Debug, $($arg)*)
    };
}

#[macro_export]
macro_rules! codegen_log {
    ($($arg:tt)*) => {
        log::log!(target: "codegen", log::Level::Debug, $($arg)*)
    };
}

#[macro_export]
macro_rules! vm_log {
    ($($arg:tt)*) => {
        log::log!(target: "vm", log::Level::Trace, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_targets_map_to_stage_levels() {
        assert_eq!(parse_level_from_target("lexer"), CompilerLogLevel::Lexer);
        assert_eq!(parse_level_from_target("codegen"), CompilerLogLevel::CodeGen);
        assert_eq!(parse_level_from_target("vm"), CompilerLogLevel::Vm);
        assert_eq!(parse_level_from_target("warn"), CompilerLogLevel::Warn);
        assert_eq!(parse_level_from_target("somewhere::else"), CompilerLogLevel::Info);
    }

    #[test]
    fn module_filter_restricts_targets() {
        let logger = CompilerLogger::new().with_modules(vec!["error".to_string()]);
        assert!(logger.should_log("error"));
        assert!(!logger.should_log("warn"));
    }

    #[test]
    fn level_round_trips_through_index() {
        for level in [CompilerLogLevel::Error, CompilerLogLevel::Parser, CompilerLogLevel::Vm] {
            assert_eq!(CompilerLogLevel::from_usize(level as usize), level);
        }
    }

    #[test]
    fn logger_installs_once() {
        assert!(init_logger(CompilerLogLevel::Warn, None).is_ok());
        assert!(init_logger(CompilerLogLevel::Warn, None).is_err());
    }
}

//! Diagnostic output on stderr
//!
//! Warnings and errors are always printed; lifecycle and trace messages
//! are gated by the `-v` count.

const PREFIX: &str = "bulkmt:";

#[derive(Debug, Clone, Copy, Default)]
pub struct DebugConfig {
    pub verbosity: u8, // 0-2 for debug levels
}

impl DebugConfig {
    pub fn new(verbose_count: u8) -> Self {
        DebugConfig {
            verbosity: verbose_count,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.verbosity > 0
    }

    pub fn should_trace(&self) -> bool {
        self.verbosity >= 2
    }

    /// Lifecycle messages: worker start/stop, files written
    pub fn log_basic(&self, message: &str) {
        if self.is_enabled() {
            eprintln!("{} {}", PREFIX, message);
        }
    }

    /// Per-bulk routing traces
    pub fn log_trace(&self, message: &str) {
        if self.should_trace() {
            eprintln!("{} {}", PREFIX, message);
        }
    }
}

pub fn format_error_message(message: &str) -> String {
    format!("{} Error: {}", PREFIX, message)
}

pub fn format_warning_message(message: &str) -> String {
    format!("{} Warning: {}", PREFIX, message)
}

pub fn warn(message: &str) {
    eprintln!("{}", format_warning_message(message));
}

/// Severity of a diagnostic message, most severe first.
///
/// `Panic` reports a condition the pipeline cannot continue from; the caller
/// that emits it also returns an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Panic,
    Error,
    Warning,
    Notice,
    Debug,
}

impl Severity {
    pub fn as_level(self) -> log::Level {
        match self {
            Self::Panic | Self::Error => log::Level::Error,
            Self::Warning => log::Level::Warn,
            Self::Notice => log::Level::Info,
            Self::Debug => log::Level::Debug,
        }
    }
}

/// Receiver for tagged pipeline diagnostics.
///
/// Called from the bootstrap caller and the copy-loop thread. Implementations
/// must be cheap; the copy loop calls `write` inline on a short write.
pub trait DiagnosticSink: Send + Sync {
    fn write(&self, tag: &str, severity: Severity, message: &str);
}

/// Forwards diagnostics to the `log` facade, using the tag as log target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn write(&self, tag: &str, severity: Severity, message: &str) {
        if severity == Severity::Panic {
            log::log!(target: tag, severity.as_level(), "PANIC: {}", message);
        } else {
            log::log!(target: tag, severity.as_level(), "{}", message);
        }
    }
}

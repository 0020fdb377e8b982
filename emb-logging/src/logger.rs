use std::sync::{
    Mutex, MutexGuard, OnceLock, PoisonError,
    atomic::{AtomicBool, AtomicU8, Ordering},
};

use log::{Log, Metadata, Record, SetLoggerError};

use crate::{DEFAULT_CAPACITY, buffer::LogBuffer, level::LogLevel, operation::LogOperation};

/// `log::Log` sink that keeps records in a [`LogBuffer`]
#[derive(Debug)]
pub struct HostLogger {
    buffer: Mutex<LogBuffer>,
    threshold: AtomicU8,
}

impl HostLogger {
    /// Create a logger buffering at most `capacity` records
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(LogBuffer::with_capacity(capacity)),
            threshold: AtomicU8::new(LogLevel::Trace as u8),
        }
    }

    /// Least severe level this logger keeps
    pub fn threshold(&self) -> LogLevel {
        LogLevel::from_index(self.threshold.load(Ordering::Relaxed))
    }

    /// Change the least severe level this logger keeps
    pub fn set_threshold(&self, level: LogLevel) {
        self.threshold.store(level as u8, Ordering::Relaxed);
    }

    // A panic while holding the lock leaves the buffer usable.
    fn lock(&self) -> MutexGuard<'_, LogBuffer> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store one operation
    pub fn record(&self, operation: LogOperation) {
        self.lock().push(operation);
    }

    /// Remove and return everything buffered so far
    pub fn drain(&self) -> Vec<LogOperation> {
        self.lock().drain()
    }

    /// Number of buffered records
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Records lost to eviction
    pub fn dropped(&self) -> usize {
        self.lock().dropped()
    }

    /// Resize the buffer
    pub fn set_capacity(&self, capacity: usize) {
        self.lock().set_capacity(capacity);
    }
}

impl Default for HostLogger {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Log for HostLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        LogLevel::from(metadata.level()) >= self.threshold()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.record(LogOperation::with_target(
            record.level().into(),
            record.args().to_string(),
            record.target(),
        ));
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<HostLogger> = OnceLock::new();
static ACTIVE: AtomicBool = AtomicBool::new(false);

/// Install the process-wide [`HostLogger`] and set the maximum level.
///
/// Calling this again (for instance when a second module built on this crate
/// initializes in the same host) keeps the existing logger, applies the new
/// level and resizes the buffer.
///
/// # Errors
///
/// Fails if a different logger was installed first.
pub fn install(level: LogLevel, capacity: usize) -> Result<&'static HostLogger, SetLoggerError> {
    let logger = LOGGER.get_or_init(|| HostLogger::new(capacity));
    if ACTIVE.load(Ordering::Acquire) {
        logger.set_capacity(capacity);
    } else {
        log::set_logger(logger)?;
        ACTIVE.store(true, Ordering::Release);
    }
    logger.set_threshold(level);
    log::set_max_level(level.to_level_filter());
    Ok(logger)
}

/// The installed logger, if [`install`] succeeded
pub fn installed() -> Option<&'static HostLogger> {
    if ACTIVE.load(Ordering::Acquire) { LOGGER.get() } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_buffers_records() {
        let logger = HostLogger::new(8);
        let record = Record::builder()
            .level(log::Level::Error)
            .target("emb_logging::tests")
            .args(format_args!("failed {}", 3))
            .build();
        logger.log(&record);
        let ops = logger.drain();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].level, LogLevel::Error);
        assert_eq!(ops[0].message, "failed 3");
        assert_eq!(ops[0].target.as_deref(), Some("emb_logging::tests"));
    }

    #[test]
    fn test_install_is_idempotent() {
        let first = install(LogLevel::Debug, 4).unwrap();
        let second = install(LogLevel::Warn, 16).unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(log::max_level(), log::LevelFilter::Warn);
        assert!(installed().is_some());

        log::warn!(target: "emb_logging::install", "kept");
        log::debug!(target: "emb_logging::install", "filtered");
        let ops: Vec<_> = second
            .drain()
            .into_iter()
            .filter(|op| op.target.as_deref() == Some("emb_logging::install"))
            .collect();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].message, "kept");
    }
}

use std::collections::VecDeque;

use crate::operation::LogOperation;

/// Ring of log operations that drops the oldest entry when full
#[derive(Debug, Clone, Default)]
pub struct LogBuffer {
    entries: VecDeque<LogOperation>,
    capacity: usize,
    dropped: usize,
}

impl LogBuffer {
    /// Create a buffer holding at most `capacity` operations
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: VecDeque::with_capacity(capacity), capacity, dropped: 0 }
    }

    /// Append an operation, evicting the oldest one if the buffer is full
    pub fn push(&mut self, operation: LogOperation) {
        if self.capacity == 0 {
            self.dropped += 1;
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
            self.dropped += 1;
        }
        self.entries.push_back(operation);
    }

    /// Remove and return all buffered operations, oldest first
    pub fn drain(&mut self) -> Vec<LogOperation> {
        self.entries.drain(..).collect()
    }

    /// Number of buffered operations
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is buffered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of buffered operations
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Operations evicted or refused since creation
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.dropped
    }

    /// Change the capacity, evicting the oldest entries if it shrinks
    pub fn set_capacity(&mut self, capacity: usize) {
        while self.entries.len() > capacity {
            self.entries.pop_front();
            self.dropped += 1;
        }
        self.capacity = capacity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LogLevel;

    fn op(message: &str) -> LogOperation {
        LogOperation::new(LogLevel::Info, message.to_string())
    }

    #[test]
    fn test_evicts_oldest() {
        let mut buffer = LogBuffer::with_capacity(2);
        buffer.push(op("a"));
        buffer.push(op("b"));
        buffer.push(op("c"));
        assert_eq!(buffer.dropped(), 1);
        let messages: Vec<_> = buffer.drain().into_iter().map(|o| o.message).collect();
        assert_eq!(messages, ["b", "c"]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut buffer = LogBuffer::with_capacity(0);
        buffer.push(op("a"));
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.dropped(), 1);
    }

    #[test]
    fn test_shrinking() {
        let mut buffer = LogBuffer::with_capacity(4);
        for m in ["a", "b", "c"] {
            buffer.push(op(m));
        }
        buffer.set_capacity(1);
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.dropped(), 2);
        assert_eq!(buffer.drain()[0].message, "c");
    }
}

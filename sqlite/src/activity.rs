//! Timestamped, human-readable record of what a session did.

use std::fmt;

use chrono::{DateTime, Local};
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEntry {
    pub at: DateTime<Local>,
    pub message: String,
}

impl fmt::Display for ActivityEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.at.format("%Y-%m-%d %H:%M:%S"), self.message)
    }
}

/// Status messages in the order they were recorded.
///
/// Each message is also emitted as an `info` event.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    entries: Vec<ActivityEntry>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(target: "dbkeeper::activity", "{message}");
        self.entries.push(ActivityEntry {
            at: Local::now(),
            message,
        });
    }

    pub fn entries(&self) -> &[ActivityEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&ActivityEntry> {
        self.entries.last()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_entry_format() {
        let entry = ActivityEntry {
            at: Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap(),
            message: "Opened db".into(),
        };
        assert_eq!(entry.to_string(), "[2024-03-09 07:05:01] Opened db");
    }

    #[test]
    fn test_record_keeps_order() {
        let mut log = ActivityLog::new();
        log.record("one");
        log.record("two");
        let messages: Vec<_> = log.entries().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["one", "two"]);
        assert_eq!(log.last().map(|e| e.message.as_str()), Some("two"));
    }
}

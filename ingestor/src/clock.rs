use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::{Arc, Mutex};

/// Source of wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Stamps accepted readings with the server receipt time.
///
/// Output is RFC 3339 in UTC at second precision (`2024-01-01T12:00:00Z`), so
/// lexicographic order equals chronological order. Issued instants never go
/// backwards, even if the wall clock is stepped back.
#[derive(Clone)]
pub struct TimestampAssigner {
    clock: Arc<dyn Clock>,
    last: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl TimestampAssigner {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            last: Arc::new(Mutex::new(None)),
        }
    }

    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    pub fn assign(&self) -> String {
        let now = self.clock.now();
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let issued = match *last {
            Some(prev) if prev > now => prev,
            _ => now,
        };
        *last = Some(issued);
        format_timestamp(issued)
    }
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

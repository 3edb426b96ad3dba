//! # Synthetic source for demos and tests.
//!
//! Emits one record per interval, picked at random from a fixed list of
//! one-liners (never the same line twice in a row). The pid is derived from
//! the line index and the process name is `dummy-<pid>`.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rand::Rng;

use crate::error::SourceError;
use crate::record::{Level, Record};
use crate::sources::{Captured, Source};

const LINES: [&str; 16] = [
    "Disk quota is a suggestion, not a promise.",
    "The cache was warm once. Those were the days.",
    "Nobody reads the logs until somebody does.",
    "Retrying is just optimism with a counter.",
    "A watched buffer never drains.",
    "The scheduler sends its regards.",
    "Every gap tells a story about a slow reader.",
    "Today is a good day to rotate your keys.",
    "Heartbeat received. Still alive, still logging.",
    "The network is reliable, said no packet ever.",
    "Somewhere a mutex is being held for too long.",
    "Your lucky port number is 8443.",
    "Ten thousand records and not a single typo.",
    "Time flies like an arrow; clocks drift like a leaf.",
    "A small step for a producer, a giant gap for a consumer.",
    "All threads are equal, but some are more blocked than others.",
];

const LEVELS: [Level; 5] = [
    Level::Verbose,
    Level::Debug,
    Level::Info,
    Level::Warning,
    Level::Error,
];

/// Default pause between two records.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(250);

/// Random one-liner generator.
pub struct DummySource {
    interval: Duration,
    limit: Option<u64>,
    emitted: u64,
    prev: Option<usize>,
}

impl Default for DummySource {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

impl DummySource {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            limit: None,
            emitted: 0,
            prev: None,
        }
    }

    /// Ends the stream after `n` records.
    #[must_use]
    pub fn with_limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    fn pick(&mut self) -> usize {
        let mut rng = rand::rng();
        loop {
            let i = rng.random_range(0..LINES.len());
            if self.prev != Some(i) {
                self.prev = Some(i);
                return i;
            }
        }
    }

    fn make(&mut self) -> Record {
        let i = self.pick();
        let pid = (i / 2 + 1) as i32;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Record::new(pid, pid)
            .with_timestamp(now.as_secs() as i32, now.subsec_nanos() as i32)
            .with_level(LEVELS[i % LEVELS.len()].as_u8())
            .with_tag("dummy")
            .with_text(LINES[i])
            .with_process_name(format!("dummy-{pid}"))
    }
}

#[async_trait]
impl Source for DummySource {
    async fn next(&mut self) -> Result<Option<Captured>, SourceError> {
        if self.limit.is_some_and(|n| self.emitted >= n) {
            return Ok(None);
        }
        if self.emitted > 0 && !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
        self.emitted += 1;
        Ok(Some(Captured::Record(self.make())))
    }

    fn name(&self) -> &'static str {
        "dummy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_limit_and_shape() {
        let mut src = DummySource::new(Duration::ZERO).with_limit(20);
        let mut prev_text = String::new();
        let mut count = 0;

        while let Some(item) = src.next().await.unwrap() {
            let Captured::Record(rec) = item else {
                panic!("dummy source never yields malformed frames");
            };
            assert!(LINES.iter().any(|l| *l == rec.text()));
            assert_ne!(rec.text(), prev_text, "same line twice in a row");
            assert_eq!(
                rec.process_name().to_string_lossy(),
                format!("dummy-{}", rec.pid())
            );
            prev_text = rec.text().to_string();
            count += 1;
        }
        assert_eq!(count, 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_between_records() {
        let mut src = DummySource::new(Duration::from_secs(1));
        let started = tokio::time::Instant::now();
        src.next().await.unwrap();
        src.next().await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(1));
    }
}

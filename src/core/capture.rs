//! # Capture task: drives a [`Source`] into the ring buffer.
//!
//! ```text
//! loop {
//!   select! {
//!     cancelled            → exit
//!     source.next() =>
//!       Ok(Some(Record))      → Session::append, failures = 0
//!                               (rejected once stopped → exit)
//!       Ok(Some(Malformed))   → malformed += 1, MalformedFrame event
//!       Ok(None)              → SourceExhausted event, exit
//!       Err(Transient) within retry budget
//!                             → SourceRetry event, sleep(delay) | cancelled
//!       Err(_) otherwise      → Session::fail(ProducerFault), exit
//!   }
//! }
//! ```
//!
//! End of stream is not a fault: the session stays `Started` and whatever was
//! buffered stays readable.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::core::Session;
use crate::error::{ProducerFault, SourceError};
use crate::events::{Bus, Event, EventKind};
use crate::policies::RetryPolicy;
use crate::sources::{Captured, Source};

/// Everything the capture task needs from its session.
pub(crate) struct Context {
    pub(crate) session: Weak<Session>,
    pub(crate) bus: Bus,
    pub(crate) retry: RetryPolicy,
    pub(crate) malformed: Arc<AtomicU64>,
    pub(crate) token: CancellationToken,
}

pub(crate) async fn run(mut source: Box<dyn Source>, ctx: Context) {
    let origin = source.name();
    info!(source = origin, "capture started");

    let mut failures: u32 = 0;
    loop {
        let next = tokio::select! {
            _ = ctx.token.cancelled() => break,
            next = source.next() => next,
        };

        match next {
            Ok(Some(Captured::Record(record))) => {
                failures = 0;
                let Some(session) = ctx.session.upgrade() else {
                    break;
                };
                match session.append(record) {
                    Ok(seq) => trace!(source = origin, seq, "record captured"),
                    Err(err) => {
                        debug!(source = origin, error = %err, "session no longer accepts records");
                        break;
                    }
                }
            }
            Ok(Some(Captured::Malformed(err))) => {
                failures = 0;
                ctx.malformed.fetch_add(1, Ordering::Relaxed);
                warn!(source = origin, error = %err, label = err.as_label(), "skipping malformed frame");
                ctx.bus
                    .publish(Event::new(EventKind::MalformedFrame).with_reason(err.to_string()));
            }
            Ok(None) => {
                info!(source = origin, "source exhausted");
                ctx.bus.publish(Event::new(EventKind::SourceExhausted));
                break;
            }
            Err(err) => {
                failures = failures.saturating_add(1);
                if !(err.is_retryable() && ctx.retry.allows(failures)) {
                    report_fault(&ctx, origin, err, failures);
                    break;
                }

                let delay = ctx.retry.delay(failures);
                warn!(source = origin, attempt = failures, delay_ms = delay.as_millis() as u64, error = %err, "source read failed; retrying");
                ctx.bus.publish(
                    Event::new(EventKind::SourceRetry)
                        .with_attempt(failures)
                        .with_delay(delay)
                        .with_reason(err.reason()),
                );
                tokio::select! {
                    _ = ctx.token.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }

    debug!(source = origin, "capture stopped");
}

fn report_fault(ctx: &Context, origin: &'static str, err: SourceError, failures: u32) {
    let reason = if err.is_retryable() {
        format!("{} (after {failures} consecutive failures)", err.reason())
    } else {
        err.reason().to_string()
    };
    let fault = ProducerFault { origin, reason };
    match ctx.session.upgrade() {
        Some(session) => session.fail(fault),
        None => debug!(source = origin, %fault, "session gone before fault could be recorded"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::core::{SessionConfig, SessionState};
    use crate::error::MalformedRecord;
    use crate::policies::Jitter;
    use crate::record::Record;

    /// Replays a fixed script of results.
    struct Scripted {
        script: VecDeque<Result<Option<Captured>, SourceError>>,
        pending_at_end: bool,
    }

    impl Scripted {
        fn new(script: Vec<Result<Option<Captured>, SourceError>>) -> Self {
            Self {
                script: script.into(),
                pending_at_end: false,
            }
        }
    }

    #[async_trait]
    impl Source for Scripted {
        async fn next(&mut self) -> Result<Option<Captured>, SourceError> {
            match self.script.pop_front() {
                Some(step) => step,
                None if self.pending_at_end => std::future::pending().await,
                None => Ok(None),
            }
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn fast_retry(max_retries: u32) -> SessionConfig {
        SessionConfig {
            retry: RetryPolicy {
                first: Duration::from_millis(1),
                max: Duration::from_millis(2),
                factor: 2.0,
                jitter: Jitter::None,
                max_retries,
            },
            ..SessionConfig::with_slots(16)
        }
    }

    fn transient() -> Result<Option<Captured>, SourceError> {
        Err(SourceError::Transient {
            reason: "busy".into(),
        })
    }

    fn record(pid: i32) -> Result<Option<Captured>, SourceError> {
        Ok(Some(Captured::Record(Record::new(pid, pid))))
    }

    #[tokio::test]
    async fn test_appends_records_and_counts_malformed() {
        let session = Session::new(fast_retry(0));
        let mut events = session.events();
        session
            .start_with_source(Box::new(Scripted::new(vec![
                record(1),
                Ok(Some(Captured::Malformed(MalformedRecord::TooShort { len: 3, min: 145 }))),
                record(2),
            ])))
            .unwrap();

        loop {
            let ev = events.recv().await.unwrap();
            if ev.kind == EventKind::SourceExhausted {
                break;
            }
        }

        let stats = session.stats();
        assert_eq!(stats.appended, 2);
        assert_eq!(stats.malformed, 1);
        assert!(session.is_running());
        session.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let session = Session::new(fast_retry(3));
        let mut events = session.events();
        session
            .start_with_source(Box::new(Scripted::new(vec![
                transient(),
                transient(),
                record(7),
            ])))
            .unwrap();

        let mut retries = 0;
        loop {
            let ev = events.recv().await.unwrap();
            match ev.kind {
                EventKind::SourceRetry => retries += 1,
                EventKind::SourceExhausted => break,
                _ => {}
            }
        }
        assert_eq!(retries, 2);
        assert_eq!(session.stats().appended, 1);
        assert!(session.fault().is_none());
        session.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_exhausted_retries_become_fault() {
        let session = Session::new(fast_retry(2));
        session
            .start_with_source(Box::new(Scripted::new(vec![
                transient(),
                transient(),
                transient(),
            ])))
            .unwrap();

        tokio::time::timeout(Duration::from_secs(2), session.halted())
            .await
            .expect("fault should halt the session");
        let fault = session.fault().expect("fault recorded");
        assert_eq!(fault.origin, "scripted");
        assert!(fault.reason.contains("after 3 consecutive failures"));
        assert!(!session.is_running());
        session.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_fatal_error_faults_immediately() {
        let session = Session::new(fast_retry(5));
        session
            .start_with_source(Box::new(Scripted::new(vec![Err(SourceError::Fatal {
                reason: "no such device".into(),
            })])))
            .unwrap();

        session.halted().await;
        assert_eq!(session.fault().unwrap().reason, "no such device");
    }

    #[tokio::test]
    async fn test_stop_cancels_pending_read() {
        let mut source = Scripted::new(vec![record(1)]);
        source.pending_at_end = true;

        let session = Session::new(fast_retry(0));
        session.start_with_source(Box::new(source)).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(2), session.stop())
            .await
            .expect("stop must not hang on a blocked source")
            .unwrap();
        assert_eq!(session.state(), SessionState::Stopped);
        assert!(session.fault().is_none());
    }

    #[tokio::test]
    async fn test_records_are_not_stored_once_session_stopped() {
        let session = Session::new(fast_retry(0));
        session.start().unwrap();
        session.stop().await.unwrap();

        let source = Scripted::new(vec![record(1), record(2)]);
        let ctx = Context {
            session: Arc::downgrade(&session),
            bus: session.bus().clone(),
            retry: session.config().retry,
            malformed: Arc::new(AtomicU64::new(0)),
            token: CancellationToken::new(),
        };
        tokio::time::timeout(Duration::from_secs(1), run(Box::new(source), ctx))
            .await
            .expect("capture ends when the session refuses records");

        assert_eq!(session.stats().appended, 0);
        assert_eq!(session.stats().buffered, 0);
    }
}

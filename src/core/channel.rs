//! # Channel: one subscriber with its own cursor and delivery task.
//!
//! A [`Channel`] is created by [`Session::create_channel`](crate::Session::create_channel)
//! and is `Open` until [`Channel::close`] (or `Session::stop`) ends it. There
//! is no reopen.
//!
//! ## Delivery loop
//! ```text
//! loop {
//!   ├─► cancelled? ──────────────────────────────► exit
//!   ├─► cursor.read()
//!   │     ├─ cancelled?          → exit (nothing handed over)
//!   │     ├─ Record(rec, next)   → on_record(&rec) → advance(next)
//!   │     ├─ Overwritten{n, at}  → RecordsDropped event → on_gap(n) → advance(at)
//!   │     └─ WouldBlock          → wait for append | cancellation
//! }
//! on exit: consumer dropped, channel deregistered, ChannelClosed published,
//!          exit flag raised
//! ```
//!
//! ## Rules
//! - The cursor only moves after the callback returned.
//! - Callbacks are never interrupted; cancellation is observed between them.
//! - `is_open()` turns false only once the delivery task exited.
//! - `close()` returns only after the delivery task exited, so no callback
//!   runs after it returns.
//! - `close()` from inside the channel's own callback cancels and returns
//!   right away. The channel stays registered with its session until the
//!   task exits, so `Session::stop()` still waits for that callback.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use futures::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::buffer::{Cursor, Read};
use crate::consumers::Consume;
use crate::core::Session;
use crate::events::{Bus, Event, EventKind};

static CHANNEL_IDS: AtomicU64 = AtomicU64::new(1);

/// Process-unique channel identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(u64);

impl ChannelId {
    pub(crate) fn next() -> Self {
        Self(CHANNEL_IDS.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch-{}", self.0)
    }
}

/// State shared between a [`Channel`] handle and its owning session.
pub(crate) struct ChannelCore {
    id: ChannelId,
    consumer: &'static str,
    token: CancellationToken,
    task_id: tokio::task::Id,
    exited: watch::Receiver<bool>,
    join: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl ChannelCore {
    /// Spawns the delivery task and returns its handle.
    pub(crate) fn spawn(
        consumer: Arc<dyn Consume>,
        cursor: Cursor,
        token: CancellationToken,
        bus: Bus,
        session: Weak<Session>,
    ) -> Arc<Self> {
        let id = ChannelId::next();
        let name = consumer.name();
        let (exit_tx, exited) = watch::channel(false);
        let task = Delivery {
            id,
            consumer,
            cursor,
            token: token.clone(),
            bus,
            session,
        };
        let join = tokio::spawn(deliver(task, ExitFlag(exit_tx)));
        Arc::new(Self {
            id,
            consumer: name,
            token,
            task_id: join.id(),
            exited,
            join: tokio::sync::Mutex::new(Some(join)),
        })
    }

    #[inline]
    pub(crate) fn id(&self) -> ChannelId {
        self.id
    }

    #[inline]
    pub(crate) fn is_open(&self) -> bool {
        !*self.exited.borrow()
    }

    #[inline]
    pub(crate) fn consumer_name(&self) -> &'static str {
        self.consumer
    }

    /// Completes once the delivery task exited.
    pub(crate) async fn exited(&self) {
        let mut exited = self.exited.clone();
        // The sender raises the flag before it is dropped.
        let _ = exited.wait_for(|done| *done).await;
    }

    /// Cancels the delivery task and waits until it has exited.
    ///
    /// When called from the delivery task itself (a consumer closing its own
    /// channel) this only cancels; whoever joins later waits for it.
    pub(crate) async fn shutdown(&self) {
        self.token.cancel();
        if tokio::task::try_id() == Some(self.task_id) {
            debug!(channel = %self.id, "channel closed from its own callback");
            return;
        }

        // Held across the join: concurrent closers return only once the task is gone.
        let mut join = self.join.lock().await;
        if let Some(handle) = join.take() {
            if let Err(err) = handle.await {
                warn!(channel = %self.id, consumer = self.consumer, error = %err, "delivery task ended abnormally");
            }
        }
    }
}

/// Handle to an open subscription.
///
/// Dropping the handle does not close the channel; the session still closes
/// it on `stop()`.
pub struct Channel {
    core: Arc<ChannelCore>,
}

impl Channel {
    pub(crate) fn new(core: Arc<ChannelCore>) -> Self {
        Self { core }
    }

    #[inline]
    pub fn id(&self) -> ChannelId {
        self.core.id
    }

    /// Name of the consumer this channel delivers to.
    #[inline]
    pub fn consumer_name(&self) -> &'static str {
        self.core.consumer
    }

    /// `true` until the delivery task exited, whether it was closed
    /// explicitly, by `stop()` or by a producer fault.
    ///
    /// Once this is `false` no callback runs for this channel again.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.core.is_open()
    }

    /// Waits until the channel closed, without closing it.
    pub async fn closed(&self) {
        self.core.exited().await;
    }

    /// Closes the channel and waits for its delivery task to exit.
    ///
    /// Idempotent: closing a closed channel returns immediately and delivers
    /// nothing further. Safe to call from any task, including from inside
    /// this channel's own `on_record`.
    pub async fn close(&self) {
        self.core.shutdown().await;
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.core.id)
            .field("consumer", &self.core.consumer)
            .field("open", &self.is_open())
            .finish()
    }
}

struct Delivery {
    id: ChannelId,
    consumer: Arc<dyn Consume>,
    cursor: Cursor,
    token: CancellationToken,
    bus: Bus,
    session: Weak<Session>,
}

/// Raises the channel's exit flag when the delivery task ends, however it ends.
struct ExitFlag(watch::Sender<bool>);

impl Drop for ExitFlag {
    fn drop(&mut self) {
        self.0.send_replace(true);
    }
}

async fn deliver(task: Delivery, _exit: ExitFlag) {
    let Delivery {
        id,
        consumer,
        mut cursor,
        token,
        bus,
        session,
    } = task;
    let name = consumer.name();
    debug!(channel = %id, consumer = name, start = cursor.position(), "delivery started");

    while !token.is_cancelled() {
        match step(&mut cursor, &*consumer, &bus, Some(id), Some(&token)).await {
            Step::Delivered => {}
            Step::Cancelled => break,
            Step::Idle => tokio::select! {
                _ = token.cancelled() => break,
                _ = cursor.wait() => {}
            },
        }
    }

    drop(consumer);
    if let Some(session) = session.upgrade() {
        session.forget_channel(id);
    }
    debug!(channel = %id, consumer = name, at = cursor.position(), "delivery stopped");
    bus.publish(
        Event::new(EventKind::ChannelClosed)
            .with_channel(id)
            .with_consumer(name),
    );
}

/// Outcome of a single [`step`].
pub(crate) enum Step {
    /// A record or a gap was handed to the consumer.
    Delivered,
    /// The cursor is at the head of the buffer.
    Idle,
    /// `stop` fired before anything was handed over; the cursor did not move.
    Cancelled,
}

/// Hands the next record (or gap) at `cursor` to `consumer` and advances.
///
/// `channel` is `None` for readers that are not channels (foreground view).
pub(crate) async fn step(
    cursor: &mut Cursor,
    consumer: &dyn Consume,
    bus: &Bus,
    channel: Option<ChannelId>,
    stop: Option<&CancellationToken>,
) -> Step {
    let name = consumer.name();
    let read = cursor.read();
    if !matches!(read, Read::WouldBlock) && stop.is_some_and(CancellationToken::is_cancelled) {
        return Step::Cancelled;
    }
    match read {
        Read::Record(record, next) => {
            guarded(bus, channel, name, consumer.on_record(&record)).await;
            cursor.advance(next);
            Step::Delivered
        }
        Read::Overwritten { dropped, resume } => {
            warn!(channel = ?channel, consumer = name, dropped, "records dropped due to slow consumption");
            bus.publish(Event::records_dropped(channel, name, dropped));
            guarded(bus, channel, name, consumer.on_gap(dropped)).await;
            cursor.advance(resume);
            Step::Delivered
        }
        Read::WouldBlock => Step::Idle,
    }
}

/// Runs one consumer callback, turning a panic into a `ConsumerPanicked` event.
async fn guarded<F>(bus: &Bus, channel: Option<ChannelId>, name: &'static str, fut: F)
where
    F: std::future::Future<Output = ()>,
{
    if let Err(panic) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
        let info = panic_message(&*panic);
        warn!(channel = ?channel, consumer = name, panic = %info, "consumer panicked");
        bus.publish(Event::consumer_panicked(channel, name, info));
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

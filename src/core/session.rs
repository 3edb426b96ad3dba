//! # Session: owner of the ring buffer, the capture task and every channel.
//!
//! A [`Session`] is the explicit context passed around instead of global
//! state. It is always handled as `Arc<Session>`.
//!
//! ## Architecture
//! ```text
//!                    Session::start_with_source(source)
//!                                 │
//!   Source ──► capture task ──► RingBuffer::append ──► watch(next)
//!   (child token)                 ▲                       │
//!   caller ── Session::append ────┘                       ▼
//!                                    ┌───────────────┬───────────────┐
//!                                    ▼               ▼               ▼
//!                               channel ch-1    channel ch-2     ForegroundView
//!                               (own cursor)    (own cursor)     (own cursor)
//!
//! Session token ─┬─ child: capture token
//!                ├─ child: ch-1 token
//!                └─ child: ch-2 token
//! ```
//!
//! ## Rules
//! - `start`, `stop`, `destroy` follow [`SessionState`]; anything else is
//!   [`EngineError::InvalidState`] and leaves the state untouched.
//! - `stop()` stops the capture task first, then closes every channel and
//!   returns only once all delivery tasks exited.
//! - A [`ProducerFault`] is recorded once: it cancels the session token
//!   (closing every channel) and `is_running()` turns false. The state stays
//!   `Started` until `stop()`.
//! - The open-channel set lives under one lock shared by `create_channel`,
//!   `Channel::close` and `stop`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::buffer::{Cursor, RingBuffer};
use crate::consumers::Consume;
use crate::core::capture;
use crate::core::channel::{Channel, ChannelCore, ChannelId};
use crate::core::{SessionConfig, SessionState, StartPosition};
use crate::error::{EngineError, ProducerFault};
use crate::events::{Bus, Event, EventKind};
use crate::record::Record;
use crate::sources::Source;

struct Inner {
    state: SessionState,
    channels: HashMap<ChannelId, Arc<ChannelCore>>,
}

/// Point-in-time counters of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionStats {
    pub state: SessionState,
    pub open_channels: usize,
    /// Records currently retained by the ring buffer.
    pub buffered: usize,
    /// Encoded bytes currently retained by the ring buffer.
    pub stored_bytes: usize,
    /// Records appended since the session started.
    pub appended: u64,
    /// Frames skipped by the capture task because they did not decode.
    pub malformed: u64,
}

/// Log distribution session.
pub struct Session {
    me: Weak<Session>,
    cfg: SessionConfig,
    ring: Arc<RingBuffer>,
    bus: Bus,
    token: CancellationToken,
    inner: Mutex<Inner>,
    capture: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
    fault: Mutex<Option<ProducerFault>>,
    malformed: Arc<AtomicU64>,
}

impl Session {
    /// Creates a session in state `Created`.
    pub fn new(cfg: SessionConfig) -> Arc<Self> {
        let ring = RingBuffer::new(cfg.capacity());
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            cfg,
            ring,
            bus,
            token: CancellationToken::new(),
            inner: Mutex::new(Inner {
                state: SessionState::Created,
                channels: HashMap::new(),
            }),
            capture: Mutex::new(None),
            fault: Mutex::new(None),
            malformed: Arc::new(AtomicU64::new(0)),
        })
    }

    /// `Created → Started`.
    pub fn start(&self) -> Result<(), EngineError> {
        {
            let mut inner = self.inner.lock();
            inner.state.require(SessionState::Created, "start")?;
            inner.state = SessionState::Started;
        }
        let cap = self.ring.capacity();
        info!(buffer_bytes = cap.bytes, buffer_slots = cap.slots, "session started");
        self.bus.publish(Event::new(EventKind::SessionStarted));
        Ok(())
    }

    /// Starts the session and spawns a capture task reading from `source`.
    pub fn start_with_source(&self, source: Box<dyn Source>) -> Result<(), EngineError> {
        self.start()?;

        let token = self.token.child_token();
        let handle = tokio::spawn(capture::run(
            source,
            capture::Context {
                session: self.me.clone(),
                bus: self.bus.clone(),
                retry: self.cfg.retry,
                malformed: Arc::clone(&self.malformed),
                token: token.clone(),
            },
        ));
        *self.capture.lock() = Some((token, handle));
        Ok(())
    }

    /// `Started → Stopped`.
    ///
    /// Stops the capture task, closes every open channel and waits until all
    /// of their delivery tasks exited.
    pub async fn stop(&self) -> Result<(), EngineError> {
        let channels: Vec<Arc<ChannelCore>> = {
            let mut inner = self.inner.lock();
            inner.state.require(SessionState::Started, "stop")?;
            inner.state = SessionState::Stopped;
            inner.channels.drain().map(|(_, ch)| ch).collect()
        };

        let capture = self.capture.lock().take();
        if let Some((token, handle)) = capture {
            token.cancel();
            if let Err(err) = handle.await {
                error!(error = %err, "capture task ended abnormally");
            }
        }

        self.token.cancel();
        for ch in &channels {
            ch.shutdown().await;
        }

        info!(closed_channels = channels.len(), "session stopped");
        self.bus.publish(Event::new(EventKind::SessionStopped));
        Ok(())
    }

    /// `Stopped → Destroyed`: releases the buffered records.
    ///
    /// Calling it on a destroyed session is a no-op.
    pub fn destroy(&self) -> Result<(), EngineError> {
        {
            let mut inner = self.inner.lock();
            if inner.state == SessionState::Destroyed {
                return Ok(());
            }
            inner.state.require(SessionState::Stopped, "destroy")?;
            inner.state = SessionState::Destroyed;
        }
        self.ring.release();
        debug!("session destroyed");
        self.bus.publish(Event::new(EventKind::SessionDestroyed));
        Ok(())
    }

    /// Opens a channel delivering to `consumer`.
    ///
    /// Its cursor starts according to [`SessionConfig::start_position`].
    pub fn create_channel(&self, consumer: Arc<dyn Consume>) -> Result<Channel, EngineError> {
        let mut inner = self.inner.lock();
        inner.state.require(SessionState::Started, "open a channel on")?;
        if let Some(fault) = self.fault() {
            return Err(EngineError::Producer(fault));
        }

        let core = ChannelCore::spawn(
            consumer,
            self.cursor(),
            self.token.child_token(),
            self.bus.clone(),
            self.me.clone(),
        );
        let id = core.id();
        inner.channels.insert(id, Arc::clone(&core));
        drop(inner);

        debug!(channel = %id, consumer = core.consumer_name(), "channel opened");
        self.bus.publish(
            Event::new(EventKind::ChannelOpened)
                .with_channel(id)
                .with_consumer(core.consumer_name()),
        );
        Ok(Channel::new(core))
    }

    /// Offers a record to every reader. Only accepted while `Started`.
    ///
    /// Returns the record's sequence number.
    pub fn append(&self, record: Record) -> Result<u64, EngineError> {
        // Held across the append: nothing lands once `stop()` flipped the state.
        let inner = self.inner.lock();
        inner.state.require(SessionState::Started, "append to")?;
        Ok(self.ring.append(record))
    }

    /// New cursor placed according to [`SessionConfig::start_position`].
    pub fn cursor(&self) -> Cursor {
        match self.cfg.start_position {
            StartPosition::Oldest => self.ring.cursor_at_oldest(),
            StartPosition::Latest => self.ring.cursor_at_next(),
        }
    }

    /// `true` while `Started` and no producer fault was recorded.
    pub fn is_running(&self) -> bool {
        self.state() == SessionState::Started && self.fault.lock().is_none()
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    /// The recorded producer fault, if any.
    pub fn fault(&self) -> Option<ProducerFault> {
        self.fault.lock().clone()
    }

    /// Completes once the session stopped, faulted or was dropped.
    pub async fn halted(&self) {
        self.token.cancelled().await;
    }

    /// Subscribes to the session's diagnostic events.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.cfg
    }

    pub fn stats(&self) -> SessionStats {
        let (state, open_channels) = {
            let inner = self.inner.lock();
            (inner.state, inner.channels.len())
        };
        SessionStats {
            state,
            open_channels,
            buffered: self.ring.len(),
            stored_bytes: self.ring.stored_bytes(),
            appended: self.ring.next_seq(),
            malformed: self.malformed.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Cancelled by `stop()`, a producer fault or drop.
    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Called by a delivery task on exit.
    pub(crate) fn forget_channel(&self, id: ChannelId) {
        self.inner.lock().channels.remove(&id);
    }

    /// Records a producer fault and closes every channel.
    ///
    /// Only the first fault is kept.
    pub(crate) fn fail(&self, fault: ProducerFault) {
        {
            let mut slot = self.fault.lock();
            if slot.is_some() {
                return;
            }
            *slot = Some(fault.clone());
        }

        error!(origin = fault.origin, reason = %fault.reason, "producer fault; closing all channels");
        self.bus.publish(Event::new(EventKind::ProducerFault).with_reason(fault.to_string()));

        // Channel tokens are children of the session token.
        self.token.cancel();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

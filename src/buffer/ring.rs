//! # Ring buffer of records with overwrite-on-full.
//!
//! [`RingBuffer`] stores the most recent records within a byte budget (and an
//! optional slot cap). Every append gets a monotonically increasing sequence
//! number; a reader position is just the sequence number it wants next.
//!
//! ## Architecture
//! ```text
//! producer ── append() ──► [ seq=first .. seq=next-1 ] ──► watch(next) ──► waiting cursors
//!                              ▲ evicts from the front
//!                              │ while over budget
//!
//! cursor(pos) ── read_from(pos) ──► Record(rec, pos+1)     pos in window
//!                                 ► WouldBlock             pos == next
//!                                 ► Overwritten{dropped}   pos < first (fast-forward)
//! ```
//!
//! ## Rules
//! - `append` never blocks on readers and never fails.
//! - The newest record is always retained, even if it alone exceeds the budget.
//! - A reader that fell out of the window is told how many records it lost.
//! - Waiting is event driven (`tokio::sync::watch`), never polled.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::record::{Record, encoded_len};

/// Retention budget of a [`RingBuffer`]. `0` means "no limit" for that axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capacity {
    /// Sum of encoded record sizes kept in memory.
    pub bytes: usize,
    /// Number of records kept in memory.
    pub slots: usize,
}

impl Capacity {
    /// Budget expressed in bytes only.
    pub const fn bytes(bytes: usize) -> Self {
        Self { bytes, slots: 0 }
    }

    /// Budget expressed in record slots only.
    pub const fn slots(slots: usize) -> Self {
        Self { bytes: 0, slots }
    }

    #[inline]
    fn exceeded(&self, slots: usize, bytes: usize) -> bool {
        (self.slots != 0 && slots > self.slots) || (self.bytes != 0 && bytes > self.bytes)
    }
}

/// Outcome of [`RingBuffer::read_from`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Read {
    /// The record at the requested position and the position after it.
    Record(Arc<Record>, u64),
    /// Nothing at or past the requested position yet.
    WouldBlock,
    /// The requested position was evicted; `dropped` records are gone and
    /// reading resumes at `resume` (the oldest retained record).
    Overwritten { dropped: u64, resume: u64 },
}

struct Slot {
    record: Arc<Record>,
    size: usize,
}

struct Inner {
    slots: VecDeque<Slot>,
    /// Sequence number of `slots[0]`.
    first: u64,
    /// Sequence number the next append receives.
    next: u64,
    bytes: usize,
}

/// Single-writer, multi-reader record store.
pub struct RingBuffer {
    inner: Mutex<Inner>,
    head: watch::Sender<u64>,
    capacity: Capacity,
}

impl RingBuffer {
    /// Creates an empty buffer. A capacity of zero on both axes falls back to
    /// [`DEFAULT_BUFFER_BYTES`](crate::DEFAULT_BUFFER_BYTES).
    pub fn new(capacity: Capacity) -> Arc<Self> {
        let capacity = if capacity.bytes == 0 && capacity.slots == 0 {
            Capacity::bytes(crate::core::DEFAULT_BUFFER_BYTES)
        } else {
            capacity
        };
        let (head, _rx) = watch::channel(0);
        Arc::new(Self {
            inner: Mutex::new(Inner {
                slots: VecDeque::new(),
                first: 0,
                next: 0,
                bytes: 0,
            }),
            head,
            capacity,
        })
    }

    /// Appends a record, evicting the oldest ones while over budget.
    ///
    /// Returns the sequence number assigned to the record.
    pub fn append(&self, record: Record) -> u64 {
        let size = encoded_len(&record);
        let seq = {
            let mut inner = self.inner.lock();
            let seq = inner.next;
            inner.next += 1;
            inner.bytes += size;
            inner.slots.push_back(Slot {
                record: Arc::new(record),
                size,
            });
            while inner.slots.len() > 1 && self.capacity.exceeded(inner.slots.len(), inner.bytes)
            {
                if let Some(evicted) = inner.slots.pop_front() {
                    inner.bytes -= evicted.size;
                    inner.first += 1;
                }
            }
            seq
        };
        self.head.send_replace(seq + 1);
        seq
    }

    /// Reads the record at `pos` without blocking.
    pub fn read_from(&self, pos: u64) -> Read {
        let inner = self.inner.lock();
        if pos < inner.first {
            return Read::Overwritten {
                dropped: inner.first - pos,
                resume: inner.first,
            };
        }
        if pos >= inner.next {
            return Read::WouldBlock;
        }
        let idx = (pos - inner.first) as usize;
        match inner.slots.get(idx) {
            Some(slot) => Read::Record(Arc::clone(&slot.record), pos + 1),
            None => Read::WouldBlock,
        }
    }

    /// Cursor positioned at the oldest retained record.
    pub fn cursor_at_oldest(self: &Arc<Self>) -> Cursor {
        let pos = self.inner.lock().first;
        self.cursor_at(pos)
    }

    /// Cursor positioned after the newest record (sees only future appends).
    pub fn cursor_at_next(self: &Arc<Self>) -> Cursor {
        let pos = self.inner.lock().next;
        self.cursor_at(pos)
    }

    /// Cursor at an explicit position.
    pub fn cursor_at(self: &Arc<Self>, pos: u64) -> Cursor {
        Cursor {
            pos,
            wake: self.head.subscribe(),
            ring: Arc::clone(self),
        }
    }

    /// Drops every retained record. Sequence numbers keep counting.
    pub(crate) fn release(&self) {
        let mut inner = self.inner.lock();
        inner.slots.clear();
        inner.bytes = 0;
        inner.first = inner.next;
    }

    /// Sequence number of the oldest retained record.
    pub fn oldest(&self) -> u64 {
        self.inner.lock().first
    }

    /// Sequence number the next append will receive.
    pub fn next_seq(&self) -> u64 {
        self.inner.lock().next
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.inner.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().slots.is_empty()
    }

    /// Encoded bytes currently retained.
    pub fn stored_bytes(&self) -> usize {
        self.inner.lock().bytes
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }
}

/// Independent read position into a [`RingBuffer`].
///
/// Reading does not move the cursor; callers [`advance`](Cursor::advance)
/// once they are done with what they read.
pub struct Cursor {
    pos: u64,
    wake: watch::Receiver<u64>,
    ring: Arc<RingBuffer>,
}

impl Cursor {
    /// Next sequence number this cursor will read.
    #[inline]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Reads at the current position (does not advance).
    #[inline]
    pub fn read(&self) -> Read {
        self.ring.read_from(self.pos)
    }

    /// Moves the cursor to `pos` (as returned by [`Read`]).
    #[inline]
    pub fn advance(&mut self, pos: u64) {
        self.pos = pos;
    }

    /// Suspends until a record at or past the current position exists.
    pub async fn wait(&mut self) {
        let pos = self.pos;
        // The sender lives inside the ring this cursor keeps alive.
        let _ = self.wake.wait_for(|&next| next > pos).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn rec(n: i32) -> Record {
        Record::new(n, n).with_text(format!("record {n}"))
    }

    fn expect_record(read: Read) -> (i32, u64) {
        match read {
            Read::Record(r, next) => (r.pid(), next),
            other => panic!("expected record, got {other:?}"),
        }
    }

    #[test]
    fn test_read_after_insert() {
        let ring = RingBuffer::new(Capacity::slots(100));
        let cursor = ring.cursor_at_oldest();
        assert_eq!(cursor.read(), Read::WouldBlock);

        ring.append(rec(1234));
        assert_eq!(expect_record(cursor.read()), (1234, 1));
    }

    #[test]
    fn test_mixed_inserts_and_reads() {
        let ring = RingBuffer::new(Capacity::slots(100));
        let mut cursor = ring.cursor_at_oldest();

        ring.append(rec(1));
        let (pid, next) = expect_record(cursor.read());
        assert_eq!(pid, 1);
        cursor.advance(next);
        assert_eq!(cursor.read(), Read::WouldBlock);

        ring.append(rec(2));
        let (pid, next) = expect_record(cursor.read());
        assert_eq!(pid, 2);
        cursor.advance(next);
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_cursors_are_independent() {
        let ring = RingBuffer::new(Capacity::slots(100));
        ring.append(rec(1));
        let mut c1 = ring.cursor_at_oldest();
        let c2 = ring.cursor_at_next();
        ring.append(rec(2));

        let (pid, next) = expect_record(c1.read());
        assert_eq!(pid, 1);
        c1.advance(next);
        assert_eq!(expect_record(c1.read()).0, 2);
        assert_eq!(expect_record(c2.read()).0, 2);
    }

    #[test]
    fn test_overwrite_reports_gap_then_resumes() {
        // capacity 3; A,B,C,D appended while the cursor sits at A.
        let ring = RingBuffer::new(Capacity::slots(3));
        let mut cursor = ring.cursor_at_oldest();
        for n in 1..=4 {
            ring.append(rec(n));
        }

        assert_eq!(
            cursor.read(),
            Read::Overwritten {
                dropped: 1,
                resume: 1
            }
        );
        cursor.advance(1);

        let mut seen = Vec::new();
        while let Read::Record(r, next) = cursor.read() {
            seen.push(r.pid());
            cursor.advance(next);
        }
        assert_eq!(seen, vec![2, 3, 4]);
    }

    #[test]
    fn test_n_plus_one_appends_yield_single_gap() {
        let n = 8;
        let ring = RingBuffer::new(Capacity::slots(n));
        let mut cursor = ring.cursor_at_oldest();
        for i in 0..=n as i32 {
            ring.append(rec(i));
        }

        let mut gaps = Vec::new();
        let mut seen = Vec::new();
        loop {
            match cursor.read() {
                Read::Record(r, next) => {
                    seen.push(r.pid());
                    cursor.advance(next);
                }
                Read::Overwritten { dropped, resume } => {
                    gaps.push(dropped);
                    cursor.advance(resume);
                }
                Read::WouldBlock => break,
            }
        }
        assert_eq!(gaps, vec![1]);
        assert_eq!(seen, (1..=n as i32).collect::<Vec<_>>());
    }

    #[test]
    fn test_byte_budget_evicts_oldest() {
        let one = encoded_len(&rec(1));
        let ring = RingBuffer::new(Capacity::bytes(one * 2));
        for n in 1..=5 {
            ring.append(rec(n));
        }
        assert_eq!(ring.len(), 2);
        assert_eq!(ring.oldest(), 3);
        assert_eq!(ring.next_seq(), 5);
        assert!(ring.stored_bytes() <= one * 2);
    }

    #[test]
    fn test_oversized_record_is_still_retained() {
        let ring = RingBuffer::new(Capacity::bytes(16));
        ring.append(rec(1));
        ring.append(rec(2));
        assert_eq!(ring.len(), 1);
        assert_eq!(expect_record(ring.read_from(1)).0, 2);
    }

    #[test]
    fn test_zero_capacity_falls_back_to_default() {
        let ring = RingBuffer::new(Capacity { bytes: 0, slots: 0 });
        assert_eq!(
            ring.capacity(),
            Capacity::bytes(crate::core::DEFAULT_BUFFER_BYTES)
        );
    }

    #[tokio::test]
    async fn test_wait_wakes_on_append() {
        let ring = RingBuffer::new(Capacity::slots(4));
        let mut cursor = ring.cursor_at_oldest();

        let writer = Arc::clone(&ring);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            writer.append(rec(7));
        });

        tokio::time::timeout(Duration::from_secs(2), cursor.wait())
            .await
            .expect("append should wake the cursor");
        assert_eq!(expect_record(cursor.read()).0, 7);
    }

    #[tokio::test]
    async fn test_wait_returns_immediately_when_data_present() {
        let ring = RingBuffer::new(Capacity::slots(4));
        ring.append(rec(1));
        let mut cursor = ring.cursor_at_oldest();
        tokio::time::timeout(Duration::from_millis(100), cursor.wait())
            .await
            .expect("data already present");
    }

    #[test]
    fn test_release_empties_but_keeps_numbering() {
        let ring = RingBuffer::new(Capacity::slots(4));
        ring.append(rec(1));
        ring.append(rec(2));
        ring.release();

        assert!(ring.is_empty());
        assert_eq!(ring.stored_bytes(), 0);
        assert_eq!(ring.oldest(), 2);
        assert_eq!(ring.append(rec(3)), 2);
    }
}

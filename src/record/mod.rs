//! # Captured log records.
//!
//! A [`Record`] is one captured log line: origin (pid/tid/process name),
//! timing, severity, tag, text and the raw payload it was decoded from.
//!
//! Records are immutable once shared. The ring buffer hands every channel an
//! `Arc<Record>`, so no reader can change what another reader sees.
//!
//! ## Normalization
//! Construction normalizes the text fields so that every record survives the
//! wire codec unchanged:
//! - `tag` and `text` are cut at the first NUL byte;
//! - trailing `'\n'` are stripped from `text`;
//! - the process name is truncated or NUL-padded to [`PNAME_LEN`] bytes;
//! - the payload is truncated to [`MAX_PAYLOAD`] bytes.
//!
//! ## Example
//! ```rust
//! use logtap::{Level, Record};
//!
//! let rec = Record::new(1234, 1240)
//!     .with_timestamp(1_700_000_000, 5)
//!     .with_level(Level::Info.as_u8())
//!     .with_tag("ActivityManager")
//!     .with_text("Start proc com.example\n")
//!     .with_process_name("system_server");
//!
//! assert_eq!(rec.text(), "Start proc com.example");
//! assert_eq!(rec.level(), Level::Info);
//! assert_eq!(rec.process_name().to_string_lossy(), "system_server");
//! ```

mod codec;
mod level;

pub use codec::{HEADER_LEN, MIN_FRAME_LEN, decode, encode, encoded_len};
pub use level::Level;

use std::borrow::Cow;
use std::fmt;

/// Width of the fixed process-name field.
pub const PNAME_LEN: usize = 128;

/// Largest raw payload a record carries.
pub const MAX_PAYLOAD: usize = 4 * 1024;

/// Visible characters kept when a process name is shown in a column.
pub const PNAME_DISPLAY_WIDTH: usize = 24;

/// Fixed-width process name (NUL padded).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessName([u8; PNAME_LEN]);

impl ProcessName {
    /// Builds a name from raw bytes, truncating to [`PNAME_LEN`].
    pub fn new(raw: &[u8]) -> Self {
        let mut buf = [0u8; PNAME_LEN];
        let n = raw.len().min(PNAME_LEN);
        buf[..n].copy_from_slice(&raw[..n]);
        Self(buf)
    }

    /// All 128 bytes, padding included.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; PNAME_LEN] {
        &self.0
    }

    /// The name up to its first NUL.
    pub fn trimmed(&self) -> &[u8] {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(PNAME_LEN);
        &self.0[..end]
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.trimmed())
    }

    /// True when the name holds no visible bytes.
    pub fn is_empty(&self) -> bool {
        self.0[0] == 0
    }

    /// Right-justified column of `width` characters; longer names keep their
    /// last `width` characters.
    pub fn display(&self, width: usize) -> String {
        let name = self.to_string_lossy();
        let count = name.chars().count();
        if count > width {
            name.chars().skip(count - width).collect()
        } else {
            format!("{name:>width$}")
        }
    }
}

impl Default for ProcessName {
    fn default() -> Self {
        Self([0u8; PNAME_LEN])
    }
}

impl fmt::Debug for ProcessName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProcessName({:?})", self.to_string_lossy())
    }
}

/// One captured log line.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Record {
    pid: i32,
    tid: i32,
    sec: i32,
    nsec: i32,
    level: u8,
    tag: String,
    text: String,
    process_name: ProcessName,
    payload: Vec<u8>,
}

impl Record {
    /// Creates an empty record for the given process/thread.
    pub fn new(pid: i32, tid: i32) -> Self {
        Self {
            pid,
            tid,
            ..Self::default()
        }
    }

    #[inline]
    pub fn with_timestamp(mut self, sec: i32, nsec: i32) -> Self {
        self.sec = sec;
        self.nsec = nsec;
        self
    }

    /// Sets the raw severity byte (kept as-is, even when out of range).
    #[inline]
    pub fn with_level(mut self, raw: u8) -> Self {
        self.level = raw;
        self
    }

    #[inline]
    pub fn with_tag(mut self, tag: impl AsRef<str>) -> Self {
        self.tag = cut_at_nul(tag.as_ref()).to_string();
        self
    }

    /// Sets the message text, cut at NUL and without trailing newlines.
    #[inline]
    pub fn with_text(mut self, text: impl AsRef<str>) -> Self {
        self.text = normalize_text(text.as_ref()).to_string();
        self
    }

    #[inline]
    pub fn with_process_name(mut self, name: impl AsRef<[u8]>) -> Self {
        self.process_name = ProcessName::new(name.as_ref());
        self
    }

    /// Attaches the raw payload (truncated to [`MAX_PAYLOAD`]).
    #[inline]
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        let mut payload = payload.into();
        payload.truncate(MAX_PAYLOAD);
        self.payload = payload;
        self
    }

    #[inline]
    pub fn pid(&self) -> i32 {
        self.pid
    }

    #[inline]
    pub fn tid(&self) -> i32 {
        self.tid
    }

    /// Seconds since the epoch (UTC).
    #[inline]
    pub fn sec(&self) -> i32 {
        self.sec
    }

    #[inline]
    pub fn nsec(&self) -> i32 {
        self.nsec
    }

    /// Display level; out-of-range bytes map to [`Level::Unknown`].
    #[inline]
    pub fn level(&self) -> Level {
        Level::from_raw(self.level)
    }

    /// Severity byte exactly as captured.
    #[inline]
    pub fn raw_level(&self) -> u8 {
        self.level
    }

    #[inline]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn process_name(&self) -> &ProcessName {
        &self.process_name
    }

    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

pub(crate) fn cut_at_nul(s: &str) -> &str {
    match s.find('\0') {
        Some(i) => &s[..i],
        None => s,
    }
}

pub(crate) fn normalize_text(s: &str) -> &str {
    cut_at_nul(s).trim_end_matches('\n')
}

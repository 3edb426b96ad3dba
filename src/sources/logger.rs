//! # Android `logger_entry` stream.
//!
//! ```text
//! ┌────────┬──────────┬─────┬─────┬─────┬──────┬────────────┬──────────────────────────┐
//! │len u16 │hdr_size  │ pid │ tid │ sec │ nsec │ extra      │ payload (len bytes)      │
//! │        │u16       │ i32 │ i32 │ i32 │ i32  │ hdr_size-20│ level u8, tag\0, text\0  │
//! └────────┴──────────┴─────┴─────┴─────┴──────┴────────────┴──────────────────────────┘
//! ```
//!
//! v1 entries carry `hdr_size = 0` (the field is padding). Newer layouts put
//! their header size there; whatever follows the first 20 bytes is skipped.
//! The stream has no process names.

use std::path::Path;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};

use crate::error::{MalformedRecord, SourceError};
use crate::record::Record;
use crate::sources::{Captured, Source, read_header};

/// Size of the v1 header.
pub const ENTRY_HEADER_LEN: usize = 20;

/// Largest payload a logger entry may announce.
pub const ENTRY_MAX_PAYLOAD: usize = 5 * 1024;

/// Reads `logger_entry` frames from an async reader.
pub struct LoggerEntrySource<R> {
    reader: R,
    payload: Vec<u8>,
}

impl LoggerEntrySource<BufReader<File>> {
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = File::open(path).await?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R> LoggerEntrySource<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            payload: Vec::new(),
        }
    }
}

struct Header {
    len: usize,
    hdr_size: usize,
    pid: i32,
    tid: i32,
    sec: i32,
    nsec: i32,
}

impl Header {
    fn parse(raw: &[u8; ENTRY_HEADER_LEN]) -> Self {
        let u16_at = |at: usize| u16::from_le_bytes([raw[at], raw[at + 1]]) as usize;
        let i32_at =
            |at: usize| i32::from_le_bytes([raw[at], raw[at + 1], raw[at + 2], raw[at + 3]]);
        Self {
            len: u16_at(0),
            hdr_size: u16_at(2),
            pid: i32_at(4),
            tid: i32_at(8),
            sec: i32_at(12),
            nsec: i32_at(16),
        }
    }
}

/// Splits a `level, tag\0, text\0` payload into a record.
fn decode_payload(hdr: &Header, payload: &[u8]) -> Result<Record, MalformedRecord> {
    let (&level, rest) = payload.split_first().ok_or(MalformedRecord::TooShort {
        len: 0,
        min: 3,
    })?;
    let tag_end = rest
        .iter()
        .position(|&b| b == 0)
        .ok_or(MalformedRecord::Unterminated { field: "tag" })?;
    let text = &rest[tag_end + 1..];
    if !text.contains(&0) {
        return Err(MalformedRecord::Unterminated { field: "text" });
    }

    Ok(Record::new(hdr.pid, hdr.tid)
        .with_timestamp(hdr.sec, hdr.nsec)
        .with_level(level)
        .with_tag(String::from_utf8_lossy(&rest[..tag_end]))
        .with_text(String::from_utf8_lossy(text)))
}

#[async_trait]
impl<R> Source for LoggerEntrySource<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    async fn next(&mut self) -> Result<Option<Captured>, SourceError> {
        let mut raw = [0u8; ENTRY_HEADER_LEN];
        if !read_header(&mut self.reader, &mut raw, "entry header").await? {
            return Ok(None);
        }
        let hdr = Header::parse(&raw);

        if hdr.len > ENTRY_MAX_PAYLOAD {
            return Err(SourceError::Fatal {
                reason: MalformedRecord::Framing {
                    reason: format!("entry payload {} exceeds {ENTRY_MAX_PAYLOAD}", hdr.len),
                }
                .to_string(),
            });
        }

        let extra = hdr.hdr_size.saturating_sub(ENTRY_HEADER_LEN);
        self.payload.resize(extra + hdr.len, 0);
        if let Err(err) = self.reader.read_exact(&mut self.payload).await {
            if err.kind() == std::io::ErrorKind::UnexpectedEof {
                return Err(SourceError::Fatal {
                    reason: format!("stream ended inside a {} byte entry", hdr.len),
                });
            }
            return Err(err.into());
        }

        Ok(Some(match decode_payload(&hdr, &self.payload[extra..]) {
            Ok(record) => Captured::Record(record),
            Err(err) => Captured::Malformed(err),
        }))
    }

    fn name(&self) -> &'static str {
        "logger"
    }
}

//! # Length-prefixed record frames.
//!
//! ```text
//! ┌──────────────┬───────────────────────────────┐
//! │ len: u32 LE  │ record bytes (see codec)      │ ... repeated
//! └──────────────┴───────────────────────────────┘
//! ```
//!
//! A frame whose body does not decode is reported as
//! [`Captured::Malformed`] and reading goes on with the next frame. A length
//! above [`MAX_FRAME_LEN`] means the stream is out of sync, which is fatal.
//! So is a stream that ends inside a frame, prefix included.

use std::path::Path;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::{MalformedRecord, SourceError};
use crate::record::{Record, decode, encode};
use crate::sources::{Captured, Source, read_header};

/// Largest accepted frame body.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Reads codec frames from any async reader (file, pipe, socket).
pub struct FrameSource<R> {
    reader: R,
    buf: Vec<u8>,
}

impl FrameSource<BufReader<File>> {
    /// Opens a frame file.
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = File::open(path).await?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R> FrameSource<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

#[async_trait]
impl<R> Source for FrameSource<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    async fn next(&mut self) -> Result<Option<Captured>, SourceError> {
        let mut prefix = [0u8; 4];
        if !read_header(&mut self.reader, &mut prefix, "length prefix").await? {
            return Ok(None);
        }
        let len = u32::from_le_bytes(prefix) as usize;
        if len > MAX_FRAME_LEN {
            return Err(SourceError::Fatal {
                reason: MalformedRecord::Framing {
                    reason: format!("frame length {len} exceeds {MAX_FRAME_LEN}"),
                }
                .to_string(),
            });
        }

        self.buf.resize(len, 0);
        if let Err(err) = self.reader.read_exact(&mut self.buf).await {
            if err.kind() == std::io::ErrorKind::UnexpectedEof {
                return Err(SourceError::Fatal {
                    reason: format!("stream ended inside a {len} byte frame"),
                });
            }
            return Err(err.into());
        }

        Ok(Some(match decode(&self.buf) {
            Ok(record) => Captured::Record(record),
            Err(err) => Captured::Malformed(err),
        }))
    }

    fn name(&self) -> &'static str {
        "frames"
    }
}

/// Writes one length-prefixed frame; the counterpart of [`FrameSource`].
pub async fn write_frame<W>(writer: &mut W, record: &Record) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let body = encode(record);
    let len = u32::try_from(body.len()).map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "record too large for a frame")
    })?;
    writer.write_u32_le(len).await?;
    writer.write_all(&body).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Level;

    fn sample(pid: i32) -> Record {
        Record::new(pid, pid + 1)
            .with_timestamp(100, 200)
            .with_level(Level::Warning.as_u8())
            .with_tag("net")
            .with_text(format!("link {pid} down"))
            .with_process_name("netd")
    }

    async fn stream(records: &[Record]) -> Vec<u8> {
        let mut out = Vec::new();
        for r in records {
            write_frame(&mut out, r).await.unwrap();
        }
        out
    }

    #[tokio::test]
    async fn test_reads_frames_until_eof() {
        let bytes = stream(&[sample(1), sample(2)]).await;
        let mut src = FrameSource::new(std::io::Cursor::new(bytes));

        assert_eq!(src.next().await.unwrap(), Some(Captured::Record(sample(1))));
        assert_eq!(src.next().await.unwrap(), Some(Captured::Record(sample(2))));
        assert_eq!(src.next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_bad_body_is_skipped_not_fatal() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(b"abc");
        bytes.extend(stream(&[sample(5)]).await);

        let mut src = FrameSource::new(std::io::Cursor::new(bytes));
        assert!(matches!(
            src.next().await.unwrap(),
            Some(Captured::Malformed(MalformedRecord::TooShort { len: 3, .. }))
        ));
        assert_eq!(src.next().await.unwrap(), Some(Captured::Record(sample(5))));
    }

    #[tokio::test]
    async fn test_oversized_length_is_fatal() {
        let bytes = (MAX_FRAME_LEN as u32 + 1).to_le_bytes().to_vec();
        let mut src = FrameSource::new(std::io::Cursor::new(bytes));
        let err = src.next().await.unwrap_err();
        assert!(!err.is_retryable());
        assert!(err.reason().contains("exceeds"));
    }

    #[tokio::test]
    async fn test_truncated_frame_is_fatal() {
        let mut bytes = stream(&[sample(1)]).await;
        bytes.truncate(bytes.len() - 10);
        let mut src = FrameSource::new(std::io::Cursor::new(bytes));
        assert!(matches!(src.next().await, Err(SourceError::Fatal { .. })));
    }

    #[tokio::test]
    async fn test_stream_ending_inside_length_prefix_is_fatal() {
        let mut bytes = stream(&[sample(1)]).await;
        bytes.extend_from_slice(&[0x10, 0x00]);
        let mut src = FrameSource::new(std::io::Cursor::new(bytes));

        assert_eq!(src.next().await.unwrap(), Some(Captured::Record(sample(1))));
        let err = src.next().await.unwrap_err();
        assert!(matches!(err, SourceError::Fatal { .. }));
        assert!(err.reason().contains("2 of 4"));
    }
}

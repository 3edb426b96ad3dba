use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{MalformedRecord, SourceError};
use crate::record::Record;

/// One item produced by a [`Source`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Captured {
    /// A decoded record, ready to be appended.
    Record(Record),
    /// A frame that was read completely but does not decode. The stream is
    /// still in sync and reading continues.
    Malformed(MalformedRecord),
}

/// Producer-side adapter yielding records from a capture stream.
///
/// # Contract
/// - `Ok(None)` means end of stream; `next` is not called again.
/// - [`SourceError::Transient`] is retried by the capture task with backoff.
/// - [`SourceError::Fatal`] (or too many transient errors) becomes a
///   [`ProducerFault`](crate::ProducerFault).
/// - `next` must be cancel-safe enough to be dropped at an `.await` point
///   when the session stops.
#[async_trait]
pub trait Source: Send + 'static {
    async fn next(&mut self) -> Result<Option<Captured>, SourceError>;

    /// Name used in logs, events and fault reports.
    fn name(&self) -> &'static str;
}

/// Fills `buf` from `reader`.
///
/// Returns `Ok(false)` when the stream ended before the first byte (a clean
/// end of stream) and a fatal error when it ended partway through `buf`.
pub(crate) async fn read_header<R>(
    reader: &mut R,
    buf: &mut [u8],
    what: &str,
) -> Result<bool, SourceError>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await? {
            0 if filled == 0 => return Ok(false),
            0 => {
                return Err(SourceError::Fatal {
                    reason: format!("stream ended after {filled} of {} {what} bytes", buf.len()),
                });
            }
            n => filled += n,
        }
    }
    Ok(true)
}

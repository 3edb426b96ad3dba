//! # Wire codec for records.
//!
//! Layout (little-endian):
//! ```text
//! offset  field   type
//! 0       pid     i32
//! 4       tid     i32
//! 8       sec     i32
//! 12      nsec    i32
//! 16      level   u8
//! 17      tag     bytes, NUL terminated
//! ..      text    bytes, NUL terminated
//! ..      pname   128 bytes, NUL padded
//! ..      msg     0..=4096 bytes (rest of frame)
//! ```
//!
//! Decoding is strict about the frame shape and lenient about text: invalid
//! UTF-8 in `tag`/`text` is replaced with U+FFFD instead of failing the whole
//! record.

use crate::error::MalformedRecord;

use super::{MAX_PAYLOAD, PNAME_LEN, ProcessName, Record, normalize_text};

/// Size of the fixed numeric header.
pub const HEADER_LEN: usize = 17;

/// Shortest frame worth looking at: header plus the process-name field.
pub const MIN_FRAME_LEN: usize = HEADER_LEN + PNAME_LEN;

/// Number of bytes [`encode`] produces for `record`.
pub fn encoded_len(record: &Record) -> usize {
    HEADER_LEN + record.tag.len() + 1 + record.text.len() + 1 + PNAME_LEN + record.payload.len()
}

/// Serializes a record into one frame.
pub fn encode(record: &Record) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(record));
    out.extend_from_slice(&record.pid.to_le_bytes());
    out.extend_from_slice(&record.tid.to_le_bytes());
    out.extend_from_slice(&record.sec.to_le_bytes());
    out.extend_from_slice(&record.nsec.to_le_bytes());
    out.push(record.level);
    out.extend_from_slice(record.tag.as_bytes());
    out.push(0);
    out.extend_from_slice(record.text.as_bytes());
    out.push(0);
    out.extend_from_slice(record.process_name.as_bytes());
    out.extend_from_slice(&record.payload);
    out
}

/// Parses one frame.
pub fn decode(frame: &[u8]) -> Result<Record, MalformedRecord> {
    if frame.len() < MIN_FRAME_LEN {
        return Err(MalformedRecord::TooShort {
            len: frame.len(),
            min: MIN_FRAME_LEN,
        });
    }

    let pid = read_i32(frame, 0);
    let tid = read_i32(frame, 4);
    let sec = read_i32(frame, 8);
    let nsec = read_i32(frame, 12);
    let level = frame[16];

    let (tag, rest) = split_nul(&frame[HEADER_LEN..], "tag")?;
    let (text, rest) = split_nul(rest, "text")?;

    if rest.len() < PNAME_LEN {
        return Err(MalformedRecord::Truncated {
            needed: PNAME_LEN,
            available: rest.len(),
        });
    }
    let (pname, payload) = rest.split_at(PNAME_LEN);
    if payload.len() > MAX_PAYLOAD {
        return Err(MalformedRecord::PayloadTooLarge {
            len: payload.len(),
            max: MAX_PAYLOAD,
        });
    }

    let text = String::from_utf8_lossy(text);
    Ok(Record {
        pid,
        tid,
        sec,
        nsec,
        level,
        tag: String::from_utf8_lossy(tag).into_owned(),
        text: normalize_text(&text).to_string(),
        process_name: ProcessName::new(pname),
        payload: payload.to_vec(),
    })
}

#[inline]
fn read_i32(buf: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn split_nul<'a>(
    buf: &'a [u8],
    field: &'static str,
) -> Result<(&'a [u8], &'a [u8]), MalformedRecord> {
    match buf.iter().position(|&b| b == 0) {
        Some(i) => Ok((&buf[..i], &buf[i + 1..])),
        None => Err(MalformedRecord::Unterminated { field }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Level;

    fn sample() -> Record {
        Record::new(4242, 4250)
            .with_timestamp(1_700_000_123, 999_999_999)
            .with_level(Level::Warning.as_u8())
            .with_tag("WindowManager")
            .with_text("focus changed")
            .with_process_name("system_server")
            .with_payload(b"\x05WindowManager\0focus changed\0".to_vec())
    }

    #[test]
    fn test_round_trip() {
        let records = [
            sample(),
            Record::default(),
            Record::new(-1, i32::MIN)
                .with_level(250)
                .with_tag("ünïcødé")
                .with_text("multi\nline")
                .with_process_name(vec![b'p'; PNAME_LEN])
                .with_payload(vec![0xAB; MAX_PAYLOAD]),
        ];
        for rec in records {
            let frame = encode(&rec);
            assert_eq!(frame.len(), encoded_len(&rec));
            assert_eq!(decode(&frame).expect("well-formed frame"), rec);
        }
    }

    #[test]
    fn test_fixed_header_offsets() {
        let frame = encode(&sample());
        assert_eq!(&frame[0..4], &4242i32.to_le_bytes());
        assert_eq!(&frame[4..8], &4250i32.to_le_bytes());
        assert_eq!(&frame[8..12], &1_700_000_123i32.to_le_bytes());
        assert_eq!(&frame[12..16], &999_999_999i32.to_le_bytes());
        assert_eq!(frame[16], Level::Warning.as_u8());
        assert_eq!(&frame[17..30], b"WindowManager");
        assert_eq!(frame[30], 0);
    }

    #[test]
    fn test_rejects_short_frame() {
        let err = decode(&[0u8; MIN_FRAME_LEN - 1]).unwrap_err();
        assert_eq!(
            err,
            MalformedRecord::TooShort {
                len: MIN_FRAME_LEN - 1,
                min: MIN_FRAME_LEN
            }
        );
    }

    #[test]
    fn test_rejects_unterminated_text() {
        let mut frame = vec![0u8; HEADER_LEN];
        frame.extend_from_slice(b"tag\0");
        frame.extend(std::iter::repeat_n(b'x', PNAME_LEN + 10));
        assert_eq!(
            decode(&frame).unwrap_err(),
            MalformedRecord::Unterminated { field: "text" }
        );
    }

    #[test]
    fn test_rejects_truncated_process_name() {
        let mut frame = vec![0u8; HEADER_LEN];
        frame.push(0); // empty tag
        frame.extend(std::iter::repeat_n(b'x', PNAME_LEN));
        frame.push(0); // text ends here, nothing left for pname
        assert!(matches!(
            decode(&frame).unwrap_err(),
            MalformedRecord::Truncated { needed: PNAME_LEN, available: 0 }
        ));
    }

    #[test]
    fn test_rejects_oversized_payload() {
        let mut frame = encode(&Record::new(1, 1));
        frame.extend(std::iter::repeat_n(1u8, MAX_PAYLOAD + 1));
        assert!(matches!(
            decode(&frame).unwrap_err(),
            MalformedRecord::PayloadTooLarge { .. }
        ));
    }

    #[test]
    fn test_invalid_utf8_is_lossy_not_fatal() {
        let mut frame = vec![0u8; HEADER_LEN];
        frame[16] = Level::Error.as_u8();
        frame.extend_from_slice(b"t\xffg\0");
        frame.extend_from_slice(b"bad \xc3\x28 text\n\0");
        frame.extend_from_slice(&[0u8; PNAME_LEN]);

        let rec = decode(&frame).expect("lossy decode");
        assert_eq!(rec.tag(), "t\u{FFFD}g");
        assert_eq!(rec.text(), "bad \u{FFFD}( text");
        assert_eq!(rec.level(), Level::Error);
    }
}

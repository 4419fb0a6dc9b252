//! Line codec: `id;title;artist;price\n`.
//!
//! Values are not escaped. `validate` rejects values that would break the
//! layout, so the store never writes such a line; files edited by hand can
//! still contain them and those lines decode as noise, as do lines that are
//! not valid UTF-8.

use crate::record::{PartialRecord, Record};
use std::fmt::Write;
use std::io::{self, BufRead};

pub const FIELD_DELIMITER: char = ';';
pub const FIELD_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("invalid price: {0:?}")]
    InvalidPrice(String),
    #[error("{field} contains a delimiter or line break")]
    Delimiter { field: &'static str },
}

/// Split a line into its four fields. `None` when the count is wrong.
#[inline]
pub fn split_fields(line: &str) -> Option<[&str; FIELD_COUNT]> {
    let mut fields = line.split(FIELD_DELIMITER);
    match (fields.next(), fields.next(), fields.next(), fields.next(), fields.next()) {
        (Some(id), Some(title), Some(artist), Some(price), None) => Some([id, title, artist, price]),
        _ => None,
    }
}

/// Bytes before the first delimiter (the whole line if there is none).
#[inline]
pub fn leading_id(line: &[u8]) -> &[u8] {
    match line.iter().position(|&b| b == FIELD_DELIMITER as u8) {
        Some(end) => &line[..end],
        None => line,
    }
}

/// Raw lines of `reader`, without the `\n` or `\r\n` terminator.
pub fn read_lines<R: BufRead>(reader: R) -> impl Iterator<Item = io::Result<Vec<u8>>> {
    reader.split(b'\n').map(|line| {
        line.map(|mut line| {
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            line
        })
    })
}

pub fn parse_price(field: &str) -> Result<i64, CodecError> {
    field
        .parse()
        .map_err(|_| CodecError::InvalidPrice(field.to_string()))
}

/// Decode one line (without its trailing newline).
///
/// `Ok(None)` means the field count is wrong and the line should be skipped.
pub fn decode(line: &str) -> Result<Option<Record>, CodecError> {
    let Some([id, title, artist, price]) = split_fields(line) else {
        return Ok(None);
    };

    Ok(Some(Record {
        id: id.to_string(),
        title: title.to_string(),
        artist: artist.to_string(),
        price: parse_price(price)?,
    }))
}

/// Decode one raw line. Invalid UTF-8 is treated like a wrong field count.
pub fn decode_bytes(line: &[u8]) -> Result<Option<Record>, CodecError> {
    match std::str::from_utf8(line) {
        Ok(line) => decode(line),
        Err(_) => Ok(None),
    }
}

/// Encode a record as one newline-terminated line.
pub fn encode(record: &Record) -> String {
    let mut line = String::with_capacity(
        record.id.len() + record.title.len() + record.artist.len() + 24,
    );
    encode_into(record, &mut line);
    line
}

#[inline]
pub fn encode_into(record: &Record, out: &mut String) {
    // Writing into a String cannot fail.
    let _ = writeln!(
        out,
        "{}{d}{}{d}{}{d}{}",
        record.id,
        record.title,
        record.artist,
        record.price,
        d = FIELD_DELIMITER
    );
}

fn check_field(field: &'static str, value: &str) -> Result<(), CodecError> {
    if value.contains([FIELD_DELIMITER, '\n', '\r']) {
        return Err(CodecError::Delimiter { field });
    }
    Ok(())
}

/// Reject values that would not survive an encode/decode cycle.
pub fn validate(record: &Record) -> Result<(), CodecError> {
    check_field("id", &record.id)?;
    check_field("title", &record.title)?;
    check_field("artist", &record.artist)
}

pub fn validate_partial(partial: &PartialRecord) -> Result<(), CodecError> {
    check_field("id", &partial.id)?;
    if let Some(title) = &partial.title {
        check_field("title", title)?;
    }
    if let Some(artist) = &partial.artist {
        check_field("artist", artist)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_well_formed() {
        let record = decode("a1;Song;Band;10").unwrap().unwrap();
        assert_eq!(record, Record::new("Song", "Band", 10).with_id("a1"));
    }

    #[test]
    fn test_decode_wrong_field_count_is_skipped() {
        assert_eq!(decode("bad-line").unwrap(), None);
        assert_eq!(decode("").unwrap(), None);
        assert_eq!(decode("a;b;c").unwrap(), None);
        assert_eq!(decode("a;b;c;1;extra").unwrap(), None);
    }

    #[test]
    fn test_decode_bad_price() {
        assert_eq!(
            decode("a1;Song;Band;ten"),
            Err(CodecError::InvalidPrice("ten".into()))
        );
        assert!(decode("a1;Song;Band;").is_err());
    }

    #[test]
    fn test_encode_then_decode() {
        for line in ["a1;Song;Band;10\n", "x;;;0\n", "id;T;A;-42\n"] {
            let record = decode(line.trim_end_matches('\n')).unwrap().unwrap();
            assert_eq!(encode(&record), line);
        }
    }

    #[test]
    fn test_encode_into_appends() {
        let mut out = String::from("a;b;c;1\n");
        encode_into(&Record::new("t", "r", 2).with_id("z"), &mut out);
        assert_eq!(out, "a;b;c;1\nz;t;r;2\n");
    }

    #[test]
    fn test_leading_id() {
        assert_eq!(leading_id(b"a1;Song;Band;10"), b"a1");
        assert_eq!(leading_id(b"bad-line"), b"bad-line");
        assert_eq!(leading_id(b"a1;\xff;x;1"), b"a1");
        assert_eq!(leading_id(b""), b"");
    }

    #[test]
    fn test_decode_bytes_invalid_utf8_is_skipped() {
        assert_eq!(decode_bytes(b"\xff\xfe garbage").unwrap(), None);
        assert_eq!(decode_bytes(b"a1;\xff;Band;10").unwrap(), None);
        assert_eq!(
            decode_bytes(b"a1;Song;Band;10").unwrap(),
            Some(Record::new("Song", "Band", 10).with_id("a1"))
        );
    }

    #[test]
    fn test_read_lines_keeps_raw_bytes() {
        let input: &[u8] = b"a1;Song;Band;10\r\n\xff\xfe\nlast";
        let lines: Vec<Vec<u8>> = read_lines(input).collect::<io::Result<_>>().unwrap();
        assert_eq!(
            lines,
            vec![b"a1;Song;Band;10".to_vec(), b"\xff\xfe".to_vec(), b"last".to_vec()]
        );
    }

    #[test]
    fn test_validate_rejects_delimiter() {
        assert!(validate(&Record::new("A;B", "x", 1)).is_err());
        assert!(validate(&Record::new("A", "x\ny", 1)).is_err());
        assert_eq!(
            validate(&Record::new("ok", "ok", 1).with_id("i;d")),
            Err(CodecError::Delimiter { field: "id" })
        );
        assert!(validate(&Record::new("fine", "fine", 1)).is_ok());

        assert!(validate_partial(&PartialRecord::new("a1").with_artist("x;y")).is_err());
        assert!(validate_partial(&PartialRecord::new("a1").with_title("ok")).is_ok());
    }
}

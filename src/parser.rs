//! UTF-8 agnostic line parser for SSE

use core::str::Utf8Error;

use bytes::{Buf, Bytes, BytesMut};
use bytes_utils::Str;

use crate::constants::{CR, LF};

/// A full line from an SSE stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEventLine<'a> {
    Comment,
    Field {
        field_name: &'a [u8],
        field_value: Option<&'a [u8]>,
    },
    Empty,
}

/// Owned version of [RawEventLine]. You probably want to [RawEventLineOwned::validate] these into [ValidatedEventLine]s
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEventLineOwned {
    /// Everything after the leading colon
    Comment(Bytes),
    Empty,
    Field {
        field_name: Bytes,
        field_value: Option<Bytes>,
    },
}

/// Field names the decoder acts on, anything else (`retry` included) lands in [FieldName::Ignored]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldName {
    Event,
    Data,
    Id,
    Ignored,
}

impl FieldName {
    fn from_bytes(name: &[u8]) -> Self {
        match name {
            b"event" => FieldName::Event,
            b"data" => FieldName::Data,
            b"id" => FieldName::Id,
            _ => FieldName::Ignored,
        }
    }
}

/// Completely parsed SSE event line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedEventLine {
    Comment,
    Empty,
    Field {
        field_name: FieldName,
        field_value: Option<Str>,
    },
}

fn validate_bytes(val: Bytes) -> Result<Str, Utf8Error> {
    match str::from_utf8(val.as_ref()) {
        // Safety: just checked the bytes are valid utf8
        Ok(_) => Ok(unsafe { Str::from_inner_unchecked(val) }),
        Err(e) => Err(e),
    }
}

impl RawEventLineOwned {
    pub fn validate(self) -> Result<ValidatedEventLine, Utf8Error> {
        match self {
            RawEventLineOwned::Comment(comment) => {
                str::from_utf8(&comment)?;
                Ok(ValidatedEventLine::Comment)
            }
            RawEventLineOwned::Empty => Ok(ValidatedEventLine::Empty),
            RawEventLineOwned::Field {
                field_name,
                field_value,
            } => {
                str::from_utf8(&field_name)?;
                let field_name = FieldName::from_bytes(&field_name);
                let field_value = match field_value {
                    Some(b) => Some(validate_bytes(b)?),
                    None => None,
                };

                Ok(ValidatedEventLine::Field {
                    field_name,
                    field_value,
                })
            }
        }
    }
}

/// Finds the next EOL in `bytes`, returning the non-inclusive end of the line and the inclusive start of the remainder.
/// Returns [None] if more data is required to find the next EOL.
fn find_eol(bytes: &[u8]) -> Option<(usize, usize)> {
    let first_match = memchr::memchr2(CR, LF, bytes)?;

    match bytes[first_match] {
        LF => Some((first_match, first_match + 1)),
        CR => {
            if first_match + 1 >= bytes.len() {
                return None; // need more data to see if it's CRLF or just CR
            }

            if bytes[first_match + 1] == LF {
                Some((first_match, first_match + 2))
            } else {
                Some((first_match, first_match + 1))
            }
        }
        _ => unreachable!(),
    }
}

/// Index of the first colon and where the value starts, skipping a single leading space
fn split_field(line: &[u8]) -> Option<(usize, usize)> {
    let colon_pos = memchr::memchr(b':', line)?;
    let value_start = if line.get(colon_pos + 1) == Some(&b' ') {
        colon_pos + 2
    } else {
        colon_pos + 1
    };
    Some((colon_pos, value_start))
}

fn read_line(bytes: &[u8]) -> RawEventLine<'_> {
    if bytes.is_empty() {
        return RawEventLine::Empty;
    }
    match split_field(bytes) {
        Some((0, _)) => RawEventLine::Comment,
        Some((colon_pos, value_start)) => RawEventLine::Field {
            field_name: &bytes[..colon_pos],
            field_value: Some(&bytes[value_start..]),
        },
        None => RawEventLine::Field {
            field_name: bytes,
            field_value: None,
        },
    }
}

/// Tries to read the next [RawEventLine] from `bytes`, also returning what's left after the EOL.
/// Returns [None] if `bytes` contains no complete EOL, this includes a slice ending in a lone cr since it may yet become crlf.
pub fn parse_line(bytes: &[u8]) -> Option<(RawEventLine<'_>, &[u8])> {
    let (line_end, rem_start) = find_eol(bytes)?;
    Some((read_line(&bytes[..line_end]), &bytes[rem_start..]))
}

/// Reads the next [RawEventLineOwned] from the buffer, then advances the buffer past the corresponding EOL.
/// Returns [None] under the same conditions as [parse_line].
pub fn parse_line_from_buffer(buffer: &mut BytesMut) -> Option<RawEventLineOwned> {
    let (line_end, rem_start) = find_eol(buffer)?;

    let line = buffer.split_to(line_end).freeze();
    buffer.advance(rem_start - line_end);

    if line.is_empty() {
        return Some(RawEventLineOwned::Empty);
    }

    match split_field(&line) {
        Some((0, _)) => Some(RawEventLineOwned::Comment(line.slice(1..))),
        Some((colon_pos, value_start)) => Some(RawEventLineOwned::Field {
            field_name: line.slice(..colon_pos),
            field_value: Some(line.slice(value_start..)),
        }),
        None => Some(RawEventLineOwned::Field {
            field_name: line,
            field_value: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn borrowed_lines() {
        assert_eq!(
            parse_line(b"data: hello\nrest"),
            Some((
                RawEventLine::Field {
                    field_name: b"data",
                    field_value: Some(&b"hello"[..]),
                },
                &b"rest"[..]
            ))
        );
        assert_eq!(parse_line(b": keep-alive\n"), Some((RawEventLine::Comment, &b""[..])));
        assert_eq!(parse_line(b"\r\n"), Some((RawEventLine::Empty, &b""[..])));
        assert_eq!(
            parse_line(b"data\r"),
            None,
            "a trailing cr might still become crlf"
        );
        assert_eq!(parse_line(b"data: no newline yet"), None);
    }

    #[test]
    fn only_one_space_is_stripped() {
        let (line, _) = parse_line(b"data:  two spaces\n").unwrap();
        assert_eq!(
            line,
            RawEventLine::Field {
                field_name: b"data",
                field_value: Some(&b" two spaces"[..]),
            }
        );

        let (line, _) = parse_line(b"data:no space\n").unwrap();
        assert_eq!(
            line,
            RawEventLine::Field {
                field_name: b"data",
                field_value: Some(&b"no space"[..]),
            }
        );
    }

    #[test]
    fn splits_at_first_colon_only() {
        let mut buffer = BytesMut::from(&b"data: {\"a\": 1}\n"[..]);
        let line = parse_line_from_buffer(&mut buffer).unwrap().validate().unwrap();
        assert_eq!(
            line,
            ValidatedEventLine::Field {
                field_name: FieldName::Data,
                field_value: Some(Str::from("{\"a\": 1}")),
            }
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn buffer_is_advanced_past_each_eol() {
        let mut buffer = BytesMut::from(&b"event: text\r\ndata\rid: 7\n\nretry: 10"[..]);

        let lines: Vec<_> = core::iter::from_fn(|| parse_line_from_buffer(&mut buffer))
            .map(|line| line.validate().unwrap())
            .collect();

        assert_eq!(
            lines,
            vec![
                ValidatedEventLine::Field {
                    field_name: FieldName::Event,
                    field_value: Some(Str::from("text")),
                },
                ValidatedEventLine::Field {
                    field_name: FieldName::Data,
                    field_value: None,
                },
                ValidatedEventLine::Field {
                    field_name: FieldName::Id,
                    field_value: Some(Str::from("7")),
                },
                ValidatedEventLine::Empty,
            ]
        );
        assert_eq!(&buffer[..], b"retry: 10");
    }

    #[test]
    fn invalid_utf8_in_fields() {
        let mut buffer = BytesMut::from(&b"data: \xFF\xFE\n"[..]);
        assert!(parse_line_from_buffer(&mut buffer).unwrap().validate().is_err());

        let mut buffer = BytesMut::from(&b"x-\xFF: ok\n"[..]);
        assert!(parse_line_from_buffer(&mut buffer).unwrap().validate().is_err());

        let mut buffer = BytesMut::from(&b": \xFF\n: fine\n"[..]);
        assert!(parse_line_from_buffer(&mut buffer).unwrap().validate().is_err());
        assert_eq!(
            parse_line_from_buffer(&mut buffer).unwrap().validate(),
            Ok(ValidatedEventLine::Comment)
        );
    }
}

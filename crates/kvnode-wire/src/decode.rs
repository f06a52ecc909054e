//! Incremental RESP decoding.
//!
//! The low-level "read a CRLF-terminated line" step is expressed as a
//! `combine` parser over byte slices; the recursive value grammar (arrays
//! nest values of any type, including other arrays) is assembled on top of
//! it by plain recursion rather than a single combinator tree, since
//! `combine`'s `Stream` impls for partial/incomplete input add more
//! complexity than a length-prefixed protocol like this one needs.

use bytes::Bytes;
use combine::parser::range::take_while;
use combine::parser::Parser;

use crate::value::Value;
use crate::WireError;

fn crlf_line<'a>() -> impl Parser<&'a [u8], Output = &'a [u8]> {
    take_while(|b: u8| b != b'\r').skip(combine::parser::range::range(&b"\r\n"[..]))
}

/// Reads one CRLF-terminated line from the front of `buf`.
///
/// Returns `Ok(None)` if `buf` does not yet contain a full line (the
/// caller should buffer more bytes and retry); `Err` is never the result
/// of insufficient data, only of a line containing no valid terminator
/// within the attempted parse.
fn read_line(buf: &[u8]) -> Option<(&[u8], usize)> {
    match crlf_line().parse(buf) {
        Ok((line, remaining)) => {
            let consumed = buf.len() - remaining.len();
            Some((line, consumed))
        }
        Err(_) => None,
    }
}

fn parse_i64(line: &[u8]) -> Result<i64, WireError> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(WireError::Protocol("invalid integer in RESP header"))
}

/// Attempts to decode one RESP value from the front of `buf`.
///
/// Returns `Ok(None)` when `buf` holds an incomplete value and the caller
/// should wait for more bytes. On success, returns the decoded value and
/// the number of bytes consumed from `buf`.
pub fn decode_value(buf: &[u8]) -> Result<Option<(Value, usize)>, WireError> {
    if buf.is_empty() {
        return Ok(None);
    }
    let type_byte = buf[0];
    let rest = &buf[1..];
    match type_byte {
        b'+' => match read_line(rest) {
            None => Ok(None),
            Some((line, used)) => {
                let text = String::from_utf8_lossy(line).into_owned();
                Ok(Some((Value::SimpleString(text), 1 + used)))
            }
        },
        b'-' => match read_line(rest) {
            None => Ok(None),
            Some((line, used)) => {
                let text = String::from_utf8_lossy(line).into_owned();
                Ok(Some((Value::Error(text), 1 + used)))
            }
        },
        b':' => match read_line(rest) {
            None => Ok(None),
            Some((line, used)) => Ok(Some((Value::Integer(parse_i64(line)?), 1 + used))),
        },
        b'$' => match read_line(rest) {
            None => Ok(None),
            Some((line, header_used)) => {
                let len = parse_i64(line)?;
                if len < 0 {
                    return Ok(Some((Value::NullBulk, 1 + header_used)));
                }
                let len = len as usize;
                let body_start = 1 + header_used;
                let total = body_start + len + 2;
                if buf.len() < total {
                    return Ok(None);
                }
                let data = &buf[body_start..body_start + len];
                if &buf[body_start + len..total] != b"\r\n" {
                    return Err(WireError::Protocol("bulk string missing CRLF terminator"));
                }
                Ok(Some((Value::Bulk(Bytes::copy_from_slice(data)), total)))
            }
        },
        b'*' => match read_line(rest) {
            None => Ok(None),
            Some((line, header_used)) => {
                let count = parse_i64(line)?;
                if count < 0 {
                    return Ok(Some((Value::NullArray, 1 + header_used)));
                }
                let mut items = Vec::with_capacity(count as usize);
                let mut consumed = 1 + header_used;
                for _ in 0..count {
                    match decode_value(&buf[consumed..])? {
                        None => return Ok(None),
                        Some((value, used)) => {
                            items.push(value);
                            consumed += used;
                        }
                    }
                }
                Ok(Some((Value::Array(items), consumed)))
            }
        },
        _ => Err(WireError::Protocol("unrecognized RESP type byte")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_simple_string() {
        let (value, used) = decode_value(b"+OK\r\n").unwrap().unwrap();
        assert_eq!(value, Value::SimpleString("OK".into()));
        assert_eq!(used, 5);
    }

    #[test]
    fn decodes_integer() {
        let (value, used) = decode_value(b":1000\r\n").unwrap().unwrap();
        assert_eq!(value, Value::Integer(1000));
        assert_eq!(used, 7);
    }

    #[test]
    fn decodes_bulk_string() {
        let (value, used) = decode_value(b"$5\r\nhello\r\n").unwrap().unwrap();
        assert_eq!(value, Value::Bulk(Bytes::from_static(b"hello")));
        assert_eq!(used, 11);
    }

    #[test]
    fn decodes_null_bulk() {
        let (value, used) = decode_value(b"$-1\r\n").unwrap().unwrap();
        assert_eq!(value, Value::NullBulk);
        assert_eq!(used, 5);
    }

    #[test]
    fn decodes_command_array() {
        let input = b"*2\r\n$3\r\nGET\r\n$7\r\ndefault\r\n";
        let (value, used) = decode_value(input).unwrap().unwrap();
        assert_eq!(used, input.len());
        match value {
            Value::Array(items) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0], Value::Bulk(Bytes::from_static(b"GET")));
            }
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn incomplete_input_requests_more_bytes() {
        assert_eq!(decode_value(b"*2\r\n$3\r\nGET").unwrap(), None);
        assert_eq!(decode_value(b"$5\r\nhel").unwrap(), None);
        assert_eq!(decode_value(b"").unwrap(), None);
    }
}

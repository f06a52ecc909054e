//! The RESP value type and its wire encoding.

use bytes::{BufMut, Bytes, BytesMut};

/// A single Redis Serialization Protocol value.
///
/// Covers the reply-side grammar (`+`, `-`, `:`, `$`, `*`) used for both
/// client replies and, nested inside an `Array` of `Bulk`, inbound command
/// frames.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    SimpleString(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    NullBulk,
    Array(Vec<Value>),
    NullArray,
}

impl Value {
    pub fn ok() -> Value {
        Value::SimpleString("OK".to_string())
    }

    pub fn error(message: impl Into<String>) -> Value {
        Value::Error(message.into())
    }

    pub fn bulk(bytes: impl Into<Bytes>) -> Value {
        Value::Bulk(bytes.into())
    }

    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(items)
    }

    /// Appends this value's wire encoding to `out`.
    pub fn encode(&self, out: &mut BytesMut) {
        match self {
            Value::SimpleString(s) => {
                out.put_u8(b'+');
                out.put_slice(s.as_bytes());
                out.put_slice(b"\r\n");
            }
            Value::Error(s) => {
                out.put_u8(b'-');
                out.put_slice(s.as_bytes());
                out.put_slice(b"\r\n");
            }
            Value::Integer(i) => {
                out.put_u8(b':');
                let mut buf = itoa::Buffer::new();
                out.put_slice(buf.format(*i).as_bytes());
                out.put_slice(b"\r\n");
            }
            Value::Bulk(bytes) => {
                out.put_u8(b'$');
                let mut buf = itoa::Buffer::new();
                out.put_slice(buf.format(bytes.len()).as_bytes());
                out.put_slice(b"\r\n");
                out.put_slice(bytes);
                out.put_slice(b"\r\n");
            }
            Value::NullBulk => out.put_slice(b"$-1\r\n"),
            Value::Array(items) => {
                out.put_u8(b'*');
                let mut buf = itoa::Buffer::new();
                out.put_slice(buf.format(items.len()).as_bytes());
                out.put_slice(b"\r\n");
                for item in items {
                    item.encode(out);
                }
            }
            Value::NullArray => out.put_slice(b"*-1\r\n"),
        }
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode(&mut buf);
        buf.freeze()
    }
}

/// Canonically re-encodes an argument vector as a RESP array of bulk
/// strings, the shape every inbound command frame takes on the wire.
///
/// Used by the validation wrappers to rebuild the raw frame after
/// namespace-stripping key arguments, per the immutable hand-off design.
pub fn encode_command(args: &[Bytes]) -> Bytes {
    let value = Value::Array(args.iter().cloned().map(Value::Bulk).collect());
    value.to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_simple_string() {
        assert_eq!(Value::ok().to_bytes(), Bytes::from_static(b"+OK\r\n"));
    }

    #[test]
    fn encodes_error() {
        assert_eq!(
            Value::error("ERR boom").to_bytes(),
            Bytes::from_static(b"-ERR boom\r\n")
        );
    }

    #[test]
    fn encodes_bulk_and_null_bulk() {
        assert_eq!(
            Value::bulk(Bytes::from_static(b"hi")).to_bytes(),
            Bytes::from_static(b"$2\r\nhi\r\n")
        );
        assert_eq!(Value::NullBulk.to_bytes(), Bytes::from_static(b"$-1\r\n"));
    }

    #[test]
    fn encodes_command_array() {
        let args = vec![Bytes::from_static(b"SET"), Bytes::from_static(b"k"), Bytes::from_static(b"v")];
        assert_eq!(
            encode_command(&args),
            Bytes::from_static(b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n")
        );
    }
}

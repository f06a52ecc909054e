//! Command frames: the decoded, ordered argument vector plus the raw bytes
//! they were decoded from.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::decode::decode_value;
use crate::value::Value;
use crate::WireError;

/// An ordered sequence of byte-string arguments decoded from one RESP
/// array-of-bulk-strings. Argument 0 is the command name.
///
/// `raw` is the exact span of input bytes the frame was decoded from; it is
/// what gets handed to the proposer unless a validation wrapper rebuilds it
/// with namespace-stripped keys (see [`crate::value::encode_command`]).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandFrame {
    pub args: Vec<Bytes>,
    pub raw: Bytes,
}

impl CommandFrame {
    pub fn name(&self) -> &[u8] {
        &self.args[0]
    }

    /// The command name, lowercased, for registry lookup.
    pub fn name_lower(&self) -> Vec<u8> {
        self.args[0].to_ascii_lowercase()
    }

    pub fn arg(&self, index: usize) -> Option<&Bytes> {
        self.args.get(index)
    }

    /// Rebuilds this frame with a freshly encoded raw buffer, leaving the
    /// original frame (and its backing bytes) untouched. Used by write
    /// wrappers once key arguments have been namespace-stripped.
    pub fn with_args(&self, args: Vec<Bytes>) -> CommandFrame {
        let raw = crate::value::encode_command(&args);
        CommandFrame { args, raw }
    }
}

fn frame_from_value(value: Value, raw: Bytes) -> Result<CommandFrame, WireError> {
    let items = match value {
        Value::Array(items) => items,
        _ => return Err(WireError::Protocol("command frame must be an array")),
    };
    let args = items
        .into_iter()
        .map(|item| match item {
            Value::Bulk(bytes) => Ok(bytes),
            _ => Err(WireError::Protocol("command arguments must be bulk strings")),
        })
        .collect::<Result<Vec<Bytes>, WireError>>()?;
    if args.is_empty() {
        return Err(WireError::Protocol("command frame has no arguments"));
    }
    Ok(CommandFrame { args, raw })
}

/// A `tokio_util::codec::Decoder`/`Encoder` pair for the command-frame
/// request side and the `Value` reply side of one client connection.
#[derive(Debug, Default)]
pub struct RespCodec;

impl Decoder for RespCodec {
    type Item = CommandFrame;
    type Error = WireError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match decode_value(&src[..])? {
            None => Ok(None),
            Some((value, consumed)) => {
                let raw = src.split_to(consumed).freeze();
                Ok(Some(frame_from_value(value, raw)?))
            }
        }
    }
}

impl Encoder<Value> for RespCodec {
    type Error = WireError;

    fn encode(&mut self, item: Value, dst: &mut BytesMut) -> Result<(), Self::Error> {
        item.encode(dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_one_frame_at_a_time() {
        let mut codec = RespCodec;
        let mut buf = BytesMut::from(&b"*1\r\n$4\r\nPING\r\n*1\r\n$4\r\nPING\r\n"[..]);
        let first = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(first.args, vec![Bytes::from_static(b"PING")]);
        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(second.args, vec![Bytes::from_static(b"PING")]);
        assert!(buf.is_empty());
    }

    #[test]
    fn waits_for_more_bytes_on_partial_frame() {
        let mut codec = RespCodec;
        let mut buf = BytesMut::from(&b"*2\r\n$3\r\nGET\r\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn name_lower_normalizes_case() {
        let frame = CommandFrame {
            args: vec![Bytes::from_static(b"SeT"), Bytes::from_static(b"k")],
            raw: Bytes::from_static(b""),
        };
        assert_eq!(frame.name_lower(), b"set".to_vec());
    }

    #[test]
    fn with_args_rebuilds_raw_encoding() {
        let frame = CommandFrame {
            args: vec![Bytes::from_static(b"GET"), Bytes::from_static(b"ns:k")],
            raw: Bytes::from_static(b"*2\r\n$3\r\nGET\r\n$4\r\nns:k\r\n"),
        };
        let stripped = frame.with_args(vec![Bytes::from_static(b"GET"), Bytes::from_static(b"k")]);
        assert_eq!(stripped.raw, Bytes::from_static(b"*2\r\n$3\r\nGET\r\n$1\r\nk\r\n"));
    }
}

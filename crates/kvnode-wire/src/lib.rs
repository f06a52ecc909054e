//! RESP value types, command framing, and the namespace codec.
//!
//! This crate is the wire-facing foundation the dispatch core is built on:
//! it knows how to turn bytes into a [`frame::CommandFrame`] and back, and
//! how to split a namespaced wire key into its namespace and key halves.
//! It knows nothing about command semantics, the registry, or the proposer.

mod decode;
mod error;
mod frame;
pub mod namespace;
mod value;

pub use error::WireError;
pub use frame::{CommandFrame, RespCodec};
pub use value::{encode_command, Value};

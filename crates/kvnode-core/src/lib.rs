//! The command-dispatch core: wire-independent, store-independent,
//! consensus-log-independent. Owns the command registry, the validation
//! wrapper family, the admission gate, the response rewriters, and the
//! dispatcher that strings them together. TTL handling (§4.7) has no
//! dedicated module here — it falls out of which `kvnode_store::Store`
//! method a command's handler calls.
//!
//! `kvnode-wire` decodes bytes into a [`kvnode_wire::CommandFrame`];
//! `kvnode-store` and `kvnode-proposer` supply the collaborators this
//! crate dispatches against; `kvnode-server` owns the process that wires
//! all of it up to a listening socket.

pub mod dispatch;
pub mod error;
pub mod gate;
mod handlers;
pub mod registry;
mod rewriters;
pub mod validate;

pub use dispatch::Dispatcher;
pub use error::{ArityPath, DispatchError};
pub use gate::AdmissionGate;
pub use registry::{CommandKind, Descriptor};
pub use validate::{Arity, Shape};

/// The default batch ceiling (§4.3) a [`Dispatcher`] enforces when the
/// caller doesn't override it, matching the covered design's default.
pub const DEFAULT_MAX_BATCH: usize = 1024;

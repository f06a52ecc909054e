//! The dispatcher: the one entry point that ties the registry,
//! validation, admission gate, proposer, and rewriters together into
//! "one [`kvnode_wire::frame::CommandFrame`] in, one
//! [`kvnode_wire::Value`] out" (§1 of the covered design).

use std::sync::Arc;

use kvnode_proposer::{ConsensusLog, ProposalMode, ProposerAdapter};
use kvnode_store::{Store, StoreValue};
use kvnode_wire::{CommandFrame, Value};

use crate::error::{ArityPath, DispatchError};
use crate::gate::AdmissionGate;
use crate::registry;

/// Owns everything a running node needs to answer one request: the
/// store, the proposer (parameterized over whichever consensus log the
/// caller wired up), the admission gate, and the configured batch limit.
/// Cheaply cloned (every field is an `Arc`), so one instance is shared
/// across all connections.
pub struct Dispatcher<L: ConsensusLog> {
    store: Arc<dyn Store>,
    proposer: Arc<ProposerAdapter<L>>,
    gate: Arc<AdmissionGate>,
    max_batch: usize,
}

impl<L: ConsensusLog> Clone for Dispatcher<L> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            proposer: self.proposer.clone(),
            gate: self.gate.clone(),
            max_batch: self.max_batch,
        }
    }
}

impl<L: ConsensusLog + 'static> Dispatcher<L> {
    pub fn new(
        store: Arc<dyn Store>,
        proposer: Arc<ProposerAdapter<L>>,
        gate: Arc<AdmissionGate>,
        max_batch: usize,
    ) -> Self {
        Self {
            store,
            proposer,
            gate,
            max_batch,
        }
    }

    /// Dispatches one decoded command frame to completion, producing the
    /// wire reply that should be encoded back to the client. Never
    /// panics on malformed or unknown input — every failure mode becomes
    /// a `Value::Error`.
    #[tracing::instrument(skip_all, fields(command = %String::from_utf8_lossy(frame.name())))]
    pub async fn dispatch(&self, frame: CommandFrame) -> Value {
        match self.dispatch_inner(frame).await {
            Ok(value) => value,
            Err(err) => Value::error(err.into_wire_message()),
        }
    }

    async fn dispatch_inner(&self, frame: CommandFrame) -> Result<Value, DispatchError> {
        let name_lower = frame.name_lower();
        let name = String::from_utf8_lossy(&name_lower).into_owned();

        let Some((descriptor, is_write)) = registry::lookup(&name) else {
            return Err(DispatchError::UnknownCommand { command: name });
        };

        let path = if is_write {
            ArityPath::Write
        } else {
            ArityPath::Read
        };

        let stripped = descriptor
            .shape
            .validate_and_strip(&name, &frame.args, self.max_batch, path)?;

        if let Some(validate_args) = descriptor.validate_args {
            validate_args(&stripped)?;
        }

        let value = if is_write {
            self.dispatch_write(&frame, descriptor, stripped.clone()).await?
        } else {
            (descriptor.handler)(self.store.as_ref(), &stripped).await?
        };

        (descriptor.rewriter)(&stripped, value)
    }

    async fn dispatch_write(
        &self,
        frame: &CommandFrame,
        descriptor: &'static registry::Descriptor,
        stripped: Vec<bytes::Bytes>,
    ) -> Result<StoreValue, DispatchError> {
        if self.gate.get() {
            return Err(DispatchError::SyncerOnly);
        }

        let key_count = descriptor.shape.key_count(frame.args.len());
        self.proposer.mode().check_key_count(key_count)?;

        let raw = frame.with_args(stripped.clone()).raw;
        let store = self.store.clone();
        let handler = descriptor.handler;

        let future = self
            .proposer
            .propose(raw, move || async move {
                handler(store.as_ref(), &stripped)
                    .await
                    .map_err(|err| kvnode_proposer::ProposerError::ApplyFailed(err.to_string()))
            })
            .await?;

        Ok(future.await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use kvnode_proposer::InMemoryLog;
    use kvnode_store::InMemoryStore;

    fn frame(parts: &[&str]) -> CommandFrame {
        let args: Vec<Bytes> = parts.iter().map(|s| Bytes::copy_from_slice(s.as_bytes())).collect();
        CommandFrame {
            raw: kvnode_wire::encode_command(&args),
            args,
        }
    }

    fn dispatcher(mode: ProposalMode) -> Dispatcher<InMemoryLog> {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::default());
        let proposer = Arc::new(ProposerAdapter::new(Arc::new(InMemoryLog::new()), mode));
        Dispatcher::new(store, proposer, Arc::new(AdmissionGate::default()), 1024)
    }

    #[tokio::test]
    async fn unknown_command_is_an_error() {
        let d = dispatcher(ProposalMode::V2);
        let reply = d.dispatch(frame(&["NOPE", "ns:k"])).await;
        assert!(matches!(reply, Value::Error(_)));
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let d = dispatcher(ProposalMode::V2);
        let set_reply = d.dispatch(frame(&["SET", "ns:k", "v"])).await;
        assert_eq!(set_reply, Value::ok());

        let get_reply = d.dispatch(frame(&["GET", "ns:k"])).await;
        assert_eq!(get_reply, Value::Bulk(Bytes::from_static(b"v")));
    }

    #[tokio::test]
    async fn missing_key_get_is_null_bulk() {
        let d = dispatcher(ProposalMode::V2);
        let reply = d.dispatch(frame(&["GET", "ns:missing"])).await;
        assert_eq!(reply, Value::NullBulk);
    }

    #[tokio::test]
    async fn syncer_only_gate_rejects_writes() {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::default());
        let proposer = Arc::new(ProposerAdapter::new(Arc::new(InMemoryLog::new()), ProposalMode::V2));
        let d = Dispatcher::new(store, proposer, Arc::new(AdmissionGate::new(true)), 1024);

        let reply = d.dispatch(frame(&["SET", "ns:k", "v"])).await;
        assert_eq!(reply, Value::error("The cluster is only allowing syncer write"));
    }

    #[tokio::test]
    async fn v1_mode_rejects_multi_key_write() {
        let d = dispatcher(ProposalMode::V1);
        let reply = d.dispatch(frame(&["DEL", "ns:a", "ns:b"])).await;
        assert!(matches!(reply, Value::Error(_)));
    }

    #[tokio::test]
    async fn negative_setbit_offset_is_rejected_before_propose() {
        let d = dispatcher(ProposalMode::V2);
        let reply = d.dispatch(frame(&["SETBIT", "ns:k", "-1", "1"])).await;
        assert!(matches!(reply, Value::Error(_)));
    }

    #[tokio::test]
    async fn wrong_arity_is_an_error() {
        let d = dispatcher(ProposalMode::V2);
        let reply = d.dispatch(frame(&["GET"])).await;
        assert!(matches!(reply, Value::Error(_)));
    }
}

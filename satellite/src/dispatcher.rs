//! Message dispatcher: registers typed processors and routes inbound
//! messages to them by kind; sends outbound messages through an opaque
//! transport collaborator.
//!
//! Framing and payload serialization are handled below this layer (out of
//! scope per the purpose statement); the dispatcher only classifies an
//! already-decoded [`Message`] and forwards it, or hands one to the
//! transport collaborator to carry to a peer.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use satellite_shared::{Address, Message, MessageKind, SatelliteError, SatelliteResult};

/// Outbound transport collaborator. Real implementations carry a `Message`
/// across the opaque framed channel described in the external interfaces;
/// fakes in tests just record what was sent.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, to: &Address, msg: Message) -> SatelliteResult<()>;
}

type Processor = Box<dyn Fn(Address, Message) -> SatelliteResult<()> + Send + Sync>;

/// Registers one processor per [`MessageKind`] and dispatches inbound
/// messages to it; forwards outbound messages through a [`Transport`].
pub struct MessageDispatcher {
    transport: Box<dyn Transport>,
    processors: RwLock<HashMap<MessageKind, Processor>>,
}

impl MessageDispatcher {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            processors: RwLock::new(HashMap::new()),
        }
    }

    /// Register the processor invoked for every inbound message of `kind`.
    /// Registering a second processor for the same kind replaces the first.
    pub fn register_processor<F>(&self, kind: MessageKind, processor: F) -> SatelliteResult<()>
    where
        F: Fn(Address, Message) -> SatelliteResult<()> + Send + Sync + 'static,
    {
        let mut processors = self
            .processors
            .write()
            .map_err(|e| SatelliteError::Internal(format!("dispatcher lock poisoned: {e}")))?;
        processors.insert(kind, Box::new(processor));
        Ok(())
    }

    /// Deliver an inbound message from `from` to its registered processor.
    ///
    /// A message type with no registered processor is dropped and logged;
    /// this is not an `Internal` error since unregistered-but-received
    /// traffic is an environment condition, not a local bug.
    pub fn dispatch(&self, from: Address, msg: Message) -> SatelliteResult<()> {
        let kind = msg.kind();
        let processors = self
            .processors
            .read()
            .map_err(|e| SatelliteError::Internal(format!("dispatcher lock poisoned: {e}")))?;
        match processors.get(&kind) {
            Some(processor) => processor(from, msg),
            None => {
                tracing::warn!(from = %from, kind = ?kind, "no processor registered for message kind");
                Ok(())
            }
        }
    }

    /// Send an outbound message to `to` via the transport collaborator.
    pub async fn send(&self, to: &Address, msg: Message) -> SatelliteResult<()> {
        self.transport.send(to, msg).await
    }
}

//! Fleet-unique address issuance against the master node.
//!
//! Maintains a strict FIFO of outstanding `ID_REQUEST`s: popping the
//! pending-request list from the back instead of the front scrambles
//! which caller receives which address under concurrent requests. This
//! implementation uses a `VecDeque` popped from the front so it cannot
//! regress to that behavior.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::oneshot;

use satellite_shared::{Address, SatelliteError, SatelliteResult};

/// Collaborator seam for the wire-level `ID_REQUEST` / `ID_DELETE` sends,
/// so FIFO ordering and cancellation can be tested without a real link.
#[async_trait]
pub trait MasterLink: Send + Sync {
    async fn send_id_request(&self) -> SatelliteResult<()>;
    async fn send_id_delete(&self, address: &Address) -> SatelliteResult<()>;
}

type PendingSlot = oneshot::Sender<SatelliteResult<Address>>;

/// FIFO address-issuance client.
pub struct MasterClient {
    link: Box<dyn MasterLink>,
    pending: Mutex<VecDeque<PendingSlot>>,
}

impl MasterClient {
    pub fn new(link: Box<dyn MasterLink>) -> Self {
        Self {
            link,
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// Enqueue a slot, send `ID_REQUEST`, and return a receiver that
    /// resolves once the oldest outstanding request is answered.
    pub async fn request_new_address(&self) -> oneshot::Receiver<SatelliteResult<Address>> {
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().expect("master client lock poisoned");
            pending.push_back(tx);
        }
        // Best-effort: if the send fails we still leave the slot queued;
        // a subsequent `fail_all_pending` (link-down) will resolve it.
        let _ = self.link.send_id_request().await;
        rx
    }

    /// Complete the *oldest* pending slot with the address the master
    /// returned in `ID_RESPONSE`, preserving strict FIFO order.
    pub fn on_id_response(&self, address: Address) -> SatelliteResult<()> {
        let slot = {
            let mut pending = self.pending.lock().expect("master client lock poisoned");
            pending.pop_front()
        };
        match slot {
            Some(tx) => {
                let _ = tx.send(Ok(address));
                Ok(())
            }
            None => Err(SatelliteError::Internal(
                "received ID_RESPONSE with no pending request".to_string(),
            )),
        }
    }

    /// Fire-and-forget release of a satellite-unique address back to the
    /// master; failure is silently tolerated, matching `ID_DELETE`'s
    /// no-acknowledgment contract.
    pub async fn release_address(&self, address: &Address) {
        let _ = self.link.send_id_delete(address).await;
    }

    /// Fail every currently pending slot with `MasterUnavailable`, e.g.
    /// because the master link dropped.
    pub fn fail_all_pending(&self) {
        let mut pending = self.pending.lock().expect("master client lock poisoned");
        for tx in pending.drain(..) {
            let _ = tx.send(Err(SatelliteError::MasterUnavailable(
                "master link is down".to_string(),
            )));
        }
    }
}

//! In-memory record of one running container.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use satellite_shared::{Address, SatelliteError, SatelliteResult};

use super::state::{ContainerState, ContainerStatus};

/// Non-owning capability invoked when a record's connection state changes
/// in a way that should trigger a routing-view re-announcement.
///
/// The manager owns the record; this callback must never hold a strong
/// reference back to the manager (see "Back-reference from ContainerRecord
/// to manager" in the design notes) — it is invalidated at teardown.
pub type RoutingTrigger = Arc<dyn Fn() + Send + Sync>;

/// One running container: owner, address, connection state, loaded nodes.
pub struct ContainerRecord {
    pub address: Address,
    pub owner_robot: String,
    pub home_dir: PathBuf,
    pub connected: bool,
    nodes: HashSet<String>,
    state: ContainerState,
    routing_trigger: Option<RoutingTrigger>,
}

impl ContainerRecord {
    pub fn new(address: Address, owner_robot: impl Into<String>, home_dir: PathBuf) -> Self {
        Self {
            address,
            owner_robot: owner_robot.into(),
            home_dir,
            connected: false,
            nodes: HashSet::new(),
            state: ContainerState::new(),
            routing_trigger: None,
        }
    }

    pub fn status(&self) -> ContainerStatus {
        self.state.status
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    /// Install the routing-change capability. Called once by the manager
    /// right after construction.
    pub fn set_routing_trigger(&mut self, trigger: RoutingTrigger) {
        self.routing_trigger = Some(trigger);
    }

    /// Drop the routing-change capability. Called by the manager at
    /// teardown so the record cannot fire stale re-announcements.
    pub fn invalidate_routing_trigger(&mut self) {
        self.routing_trigger = None;
    }

    /// `true` iff `robot_id` is the owner recorded at creation.
    pub fn check_owner(&self, robot_id: &str) -> bool {
        self.owner_robot == robot_id
    }

    pub fn transition_to(&mut self, target: ContainerStatus) -> SatelliteResult<()> {
        self.state.transition_to(target)
    }

    /// Set the `connected` flag and drive `WaitingHandshake -> Ready` when
    /// it becomes `true`. Firing the routing trigger is the caller's (the
    /// record's) responsibility exactly once, on the transition into `Ready`.
    pub fn set_connected(&mut self, flag: bool) -> SatelliteResult<()> {
        self.connected = flag;
        if flag && self.state.status == ContainerStatus::WaitingHandshake {
            self.state.transition_to(ContainerStatus::Ready)?;
            if let Some(trigger) = &self.routing_trigger {
                trigger();
            }
        }
        Ok(())
    }

    fn require_ready(&self) -> SatelliteResult<()> {
        if self.state.status.is_ready() {
            Ok(())
        } else {
            Err(SatelliteError::NotReady(format!(
                "container {} is {}, not ready",
                self.address, self.state.status
            )))
        }
    }

    pub fn add_node(&mut self, node_id: impl Into<String>) -> SatelliteResult<()> {
        self.require_ready()?;
        self.nodes.insert(node_id.into());
        Ok(())
    }

    pub fn remove_node(&mut self, node_id: &str) -> SatelliteResult<()> {
        self.require_ready()?;
        self.nodes.remove(node_id);
        Ok(())
    }

    /// Payload forwarding is gated on `Ready`, same as node mutation.
    pub fn send(&self) -> SatelliteResult<()> {
        self.require_ready()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record() -> ContainerRecord {
        ContainerRecord::new(
            Address::new_unchecked("SATL0042"),
            "robot-A",
            PathBuf::from("/home/ros/A"),
        )
    }

    #[test]
    fn check_owner_matches_only_creator() {
        let rec = record();
        assert!(rec.check_owner("robot-A"));
        assert!(!rec.check_owner("robot-B"));
    }

    #[test]
    fn add_node_fails_before_ready() {
        let mut rec = record();
        let err = rec.add_node("node-1").unwrap_err();
        assert!(matches!(err, SatelliteError::NotReady(_)));
    }

    #[test]
    fn set_connected_true_drives_waiting_handshake_to_ready_and_fires_trigger() {
        let mut rec = record();
        rec.transition_to(ContainerStatus::Starting).unwrap();
        rec.transition_to(ContainerStatus::WaitingHandshake).unwrap();

        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = fired.clone();
        rec.set_routing_trigger(Arc::new(move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        }));

        rec.set_connected(true).unwrap();
        assert_eq!(rec.status(), ContainerStatus::Ready);
        assert!(rec.connected);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn add_and_remove_node_once_ready() {
        let mut rec = record();
        rec.transition_to(ContainerStatus::Starting).unwrap();
        rec.transition_to(ContainerStatus::WaitingHandshake).unwrap();
        rec.set_connected(true).unwrap();

        rec.add_node("node-1").unwrap();
        assert_eq!(rec.nodes().collect::<Vec<_>>(), vec!["node-1"]);

        rec.remove_node("node-1").unwrap();
        assert_eq!(rec.nodes().count(), 0);
    }

    #[test]
    fn invalidated_routing_trigger_does_not_fire() {
        let mut rec = record();
        rec.transition_to(ContainerStatus::Starting).unwrap();
        rec.transition_to(ContainerStatus::WaitingHandshake).unwrap();

        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = fired.clone();
        rec.set_routing_trigger(Arc::new(move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        }));
        rec.invalidate_routing_trigger();

        rec.set_connected(true).unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}

//! Container lifecycle status and state machine.

use satellite_shared::{SatelliteError, SatelliteResult};

/// Lifecycle status of a container record.
///
/// ```text
/// Allocating -> Starting -> WaitingHandshake -> Ready -> Stopping -> Stopped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerStatus {
    /// An address has been reserved; no filesystem artifacts exist yet.
    Allocating,
    /// The runtime adapter has been asked to start; files are being written.
    Starting,
    /// `lxc-start` has returned; the record is live but unauthenticated.
    WaitingHandshake,
    /// The inner framework authenticated and the routing trigger fired.
    Ready,
    /// Explicit teardown or satellite shutdown is in progress.
    Stopping,
    /// Runtime stop and cleanup completed; the record is about to be removed.
    Stopped,
}

impl ContainerStatus {
    /// Only `Ready` permits `addNode` / `removeNode` / `send`.
    pub fn is_ready(&self) -> bool {
        matches!(self, ContainerStatus::Ready)
    }

    /// Whether a transition from `self` to `target` is permitted.
    pub fn can_transition_to(&self, target: ContainerStatus) -> bool {
        use ContainerStatus::*;
        matches!(
            (self, target),
            (Allocating, Starting)
                | (Starting, WaitingHandshake)
                | (WaitingHandshake, Ready)
                | (Allocating, Stopping)
                | (Starting, Stopping)
                | (WaitingHandshake, Stopping)
                | (Ready, Stopping)
                | (Stopping, Stopped)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerStatus::Allocating => "allocating",
            ContainerStatus::Starting => "starting",
            ContainerStatus::WaitingHandshake => "waiting_handshake",
            ContainerStatus::Ready => "ready",
            ContainerStatus::Stopping => "stopping",
            ContainerStatus::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mutable lifecycle state held by a `ContainerRecord`, with transition
/// validation split out from the record's other fields.
#[derive(Debug, Clone)]
pub struct ContainerState {
    pub status: ContainerStatus,
}

impl ContainerState {
    pub fn new() -> Self {
        Self {
            status: ContainerStatus::Allocating,
        }
    }

    /// Attempt a validated transition, failing with [`SatelliteError::NotReady`]
    /// if it isn't legal from the current status.
    pub fn transition_to(&mut self, target: ContainerStatus) -> SatelliteResult<()> {
        if !self.status.can_transition_to(target) {
            return Err(SatelliteError::NotReady(format!(
                "cannot transition from {} to {target}",
                self.status
            )));
        }
        self.status = target;
        Ok(())
    }
}

impl Default for ContainerState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ContainerStatus::*;

    #[test]
    fn full_happy_path_transitions() {
        let mut state = ContainerState::new();
        assert_eq!(state.status, Allocating);
        state.transition_to(Starting).unwrap();
        state.transition_to(WaitingHandshake).unwrap();
        state.transition_to(Ready).unwrap();
        state.transition_to(Stopping).unwrap();
        state.transition_to(Stopped).unwrap();
        assert_eq!(state.status, Stopped);
    }

    #[test]
    fn any_state_can_go_to_stopping_except_stopped() {
        for start in [Allocating, Starting, WaitingHandshake, Ready] {
            assert!(start.can_transition_to(Stopping), "{start:?}");
        }
        assert!(!Stopped.can_transition_to(Stopping));
    }

    #[test]
    fn cannot_skip_states() {
        assert!(!Allocating.can_transition_to(WaitingHandshake));
        assert!(!Allocating.can_transition_to(Ready));
        assert!(!Starting.can_transition_to(Ready));
        assert!(!WaitingHandshake.can_transition_to(Stopped));
    }

    #[test]
    fn invalid_transition_is_not_ready_and_leaves_status_unchanged() {
        let mut state = ContainerState::new();
        let err = state.transition_to(Ready).unwrap_err();
        assert!(matches!(err, SatelliteError::NotReady(_)));
        assert_eq!(state.status, Allocating);
    }

    #[test]
    fn only_ready_reports_is_ready() {
        assert!(!Allocating.is_ready());
        assert!(!Starting.is_ready());
        assert!(!WaitingHandshake.is_ready());
        assert!(Ready.is_ready());
        assert!(!Stopping.is_ready());
        assert!(!Stopped.is_ready());
    }
}

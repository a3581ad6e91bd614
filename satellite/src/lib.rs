//! Satellite manager and container lifecycle manager.
//!
//! A satellite runs on each worker node, holding a fleet-unique address
//! issued by the master and a set of LXC-backed containers it owns. This
//! crate implements the orchestration logic: requesting addresses,
//! creating and destroying containers, wiring ROS nodes into them,
//! maintaining the peer-satellite mesh, and routing messages between
//! robots and their containers.
//!
//! Collaborators that perform real I/O (the wire transport, the master
//! link, the metadata service, the LXC runtime, peer dialing) are
//! injected as trait objects; this crate owns only the orchestration
//! state machine, not the I/O itself.

pub mod config;
pub mod container;
pub mod dispatcher;
pub mod logging;
pub mod manager;
pub mod master_client;
pub mod metadata_client;
pub mod node;
pub mod routing;
pub mod runtime_adapter;

pub use config::SatelliteConfig;
pub use container::{ContainerRecord, ContainerState, ContainerStatus};
pub use dispatcher::{MessageDispatcher, Transport};
pub use logging::init_tracing;
pub use manager::{PeerConnector, RobotLink, SatelliteManager, PEER_APPROVED_MESSAGE_KINDS};
pub use master_client::{MasterClient, MasterLink};
pub use metadata_client::MetadataClient;
pub use node::{NodeDefinition, ParameterKind, ParameterSpec};
pub use routing::PeerRegistry;
pub use runtime_adapter::{LxcRuntimeAdapter, RuntimeAdapter};

pub use satellite_shared::{
    Address, AddressConfig, Message, MessageKind, ParamValue, PeerSatellite, SatelliteError,
    SatelliteResult,
};

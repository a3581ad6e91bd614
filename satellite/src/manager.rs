//! Satellite manager: the top-level orchestrator.
//!
//! Mediates every robot-initiated operation, creates and destroys
//! containers, establishes peer-satellite links, and maintains the routing
//! view. This is the one logical owner of the `ContainerRecord` map, the
//! pending-address-request queue (held inside [`MasterClient`]), and the
//! set of connected peers; every mutation of that state happens from a
//! method on this type, so there is a single writer for all of it.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use satellite_shared::{
    Address, Message, MessageKind, ParamValue, PeerSatellite, SatelliteError, SatelliteResult,
};

use crate::config::SatelliteConfig;
use crate::container::{ContainerRecord, ContainerStatus};
use crate::dispatcher::MessageDispatcher;
use crate::master_client::MasterClient;
use crate::metadata_client::MetadataClient;
use crate::routing::{route_info_message, PeerRegistry};
use crate::runtime_adapter::RuntimeAdapter;

/// The inbound message kinds a peer-satellite connection accepts once
/// opened: routing announcements and relayed ROS payloads. No other
/// message kind may arrive on a peer link.
pub const PEER_APPROVED_MESSAGE_KINDS: &[MessageKind] = &[MessageKind::RouteInfo, MessageKind::RosMsg];

/// Collaborator seam for opening an outbound connection to a peer
/// satellite and completing its handshake. Real implementations dial the
/// peer over the satellite-to-satellite transport, restricting the
/// connection's accepted inbound message types to `approved_kinds`; fakes
/// in tests just record what was dialed and with which restriction.
#[async_trait]
pub trait PeerConnector: Send + Sync {
    async fn connect(&self, address: &Address, ip: &str, approved_kinds: &[MessageKind]) -> SatelliteResult<()>;
}

/// Collaborator seam for handing a payload to the (out-of-scope)
/// robot-facing front-end, used by `sendROSMsgToRobot`.
#[async_trait]
pub trait RobotLink: Send + Sync {
    async fn forward(&self, robot_id: &str, interface: &str, payload: &[u8]) -> SatelliteResult<()>;
}

type ContainerHandle = Arc<Mutex<ContainerRecord>>;

struct Inner {
    config: Arc<SatelliteConfig>,
    containers: Mutex<HashMap<Address, ContainerHandle>>,
    master_client: MasterClient,
    metadata_client: Box<dyn MetadataClient>,
    runtime_adapter: Box<dyn RuntimeAdapter>,
    peer_connector: Box<dyn PeerConnector>,
    robot_link: Box<dyn RobotLink>,
    dispatcher: Arc<MessageDispatcher>,
    peers: PeerRegistry,
    routing_tx: mpsc::UnboundedSender<()>,
    shutdown_token: CancellationToken,
}

/// The satellite manager. Cheap to clone: internally a single `Arc`, so a
/// clone can be handed to the dispatcher's processor closures and to
/// background tasks without duplicating state.
#[derive(Clone)]
pub struct SatelliteManager(Arc<Inner>);

impl SatelliteManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<SatelliteConfig>,
        metadata_client: Box<dyn MetadataClient>,
        master_client: MasterClient,
        runtime_adapter: Box<dyn RuntimeAdapter>,
        peer_connector: Box<dyn PeerConnector>,
        robot_link: Box<dyn RobotLink>,
        dispatcher: Arc<MessageDispatcher>,
    ) -> Self {
        let (routing_tx, routing_rx) = mpsc::unbounded_channel();
        let inner = Arc::new(Inner {
            config,
            containers: Mutex::new(HashMap::new()),
            master_client,
            metadata_client,
            runtime_adapter,
            peer_connector,
            robot_link,
            dispatcher,
            peers: PeerRegistry::new(),
            routing_tx,
            shutdown_token: CancellationToken::new(),
        });

        tokio::spawn(routing_announce_loop(Arc::downgrade(&inner), routing_rx));

        let manager = Self(inner);
        manager.register_processors();
        manager
    }

    /// Wire the dispatcher hooks that deliver `ID_RESPONSE` and
    /// `CONNECT_DIRECTIVE` traffic to this manager. Called once, from
    /// `new`. Processors hold only a [`Weak`] reference to the manager's
    /// inner state so the dispatcher never keeps the manager alive past
    /// its last strong handle.
    fn register_processors(&self) {
        let weak = Arc::downgrade(&self.0);
        let dispatcher = self.0.dispatcher.clone();

        let id_response_weak = weak.clone();
        let _ = dispatcher.register_processor(MessageKind::IdResponse, move |_from, msg| {
            if let (Some(inner), Message::IdResponse { address }) = (id_response_weak.upgrade(), msg) {
                inner.master_client.on_id_response(address)?;
            }
            Ok(())
        });

        let connect_weak = weak.clone();
        let _ = dispatcher.register_processor(MessageKind::ConnectDirective, move |_from, msg| {
            if let Message::ConnectDirective { peers } = msg {
                if let Some(inner) = connect_weak.upgrade() {
                    tokio::spawn(async move {
                        Self(inner).connect_to_satellites(peers).await;
                    });
                }
            }
            Ok(())
        });
    }

    // ---------------------------------------------------------------
    // Container lifecycle: creation
    // ---------------------------------------------------------------

    /// Resolve a robot's home directory and a new fleet-unique address in
    /// parallel, then construct and start a container for it.
    pub async fn create_container(&self, robot_id: impl Into<String>) -> SatelliteResult<Address> {
        let robot_id = robot_id.into();
        let span = tracing::info_span!("create_container", robot_id = %robot_id);
        let _enter = span.enter();

        let home_dir_fut = self.cancellable(self.0.metadata_client.get_robot_specs(&robot_id));
        let address_rx = self.0.master_client.request_new_address().await;

        let (home_dir, address) = tokio::join!(home_dir_fut, async {
            address_rx
                .await
                .map_err(|_| SatelliteError::Internal("master client dropped pending slot".to_string()))?
        });

        let home_dir = home_dir.map_err(|err| {
            tracing::warn!(error = %err, "could not resolve robot home directory");
            err
        })?;
        let address = address.map_err(|err| {
            tracing::warn!(error = %err, "could not obtain a new fleet-unique address");
            err
        })?;

        let address = self.0.config.address.validate(address.as_str()).ok_or_else(|| {
            tracing::warn!(address = %address, "master returned an address that does not validate");
            SatelliteError::InvalidRequest(format!("address {address} does not parse"))
        })?;

        if self.0.containers.lock().await.contains_key(&address) {
            tracing::warn!(address = %address, "there is already a container with this address");
            self.0.master_client.release_address(&address).await;
            return Err(SatelliteError::InvalidRequest(format!(
                "container {address} already exists"
            )));
        }

        if !tokio_is_dir(&home_dir).await {
            tracing::warn!(home_dir = %home_dir.display(), "home directory is not a valid directory");
            self.0.master_client.release_address(&address).await;
            return Err(SatelliteError::InvalidRequest(format!(
                "home directory {} is not a directory",
                home_dir.display()
            )));
        }

        let record = ContainerRecord::new(address.clone(), robot_id.clone(), home_dir.clone());
        let handle: ContainerHandle = Arc::new(Mutex::new(record));
        {
            let routing_tx = self.0.routing_tx.clone();
            let mut guard = handle.lock().await;
            guard.set_routing_trigger(Arc::new(move || {
                let _ = routing_tx.send(());
            }));
        }
        self.0
            .containers
            .lock()
            .await
            .insert(address.clone(), handle.clone());
        self.announce_routing_change().await;

        {
            let mut guard = handle.lock().await;
            guard.transition_to(ContainerStatus::Starting)?;
        }

        let start_result = self.0.runtime_adapter.start(&address, &home_dir).await;
        if let Err(err) = start_result {
            tracing::warn!(address = %address, error = %err, "container start failed; releasing address");
            self.0.containers.lock().await.remove(&address);
            self.0.master_client.release_address(&address).await;
            self.announce_routing_change().await;
            return Err(err);
        }

        {
            let mut guard = handle.lock().await;
            guard.transition_to(ContainerStatus::WaitingHandshake)?;
        }

        tracing::info!(address = %address, "container started, awaiting handshake");
        Ok(address)
    }

    // ---------------------------------------------------------------
    // Container handshake
    // ---------------------------------------------------------------

    pub async fn authenticate_container_connection(&self, address: &Address) -> bool {
        let Some(handle) = self.lookup(address).await else {
            return false;
        };
        handle.lock().await.status() == ContainerStatus::WaitingHandshake
    }

    pub async fn set_connected_flag_container(&self, address: &Address, flag: bool) -> SatelliteResult<()> {
        let Some(handle) = self.lookup(address).await else {
            return if flag {
                Err(SatelliteError::InvalidRequest(format!(
                    "no container registered for {address}"
                )))
            } else {
                Ok(())
            };
        };
        handle.lock().await.set_connected(flag)
    }

    // ---------------------------------------------------------------
    // Container lifecycle: destruction
    // ---------------------------------------------------------------

    pub async fn destroy_container(&self, robot_id: &str, container_id: &Address) -> SatelliteResult<()> {
        let handle = self
            .lookup_owned(robot_id, container_id)
            .await?;

        {
            let mut guard = handle.lock().await;
            guard.transition_to(ContainerStatus::Stopping)?;
        }

        self.0.runtime_adapter.stop(container_id).await?;

        {
            let mut guard = handle.lock().await;
            guard.transition_to(ContainerStatus::Stopped)?;
            guard.invalidate_routing_trigger();
        }

        self.0.containers.lock().await.remove(container_id);
        self.announce_routing_change().await;
        tracing::info!(address = %container_id, robot_id = %robot_id, "container destroyed");
        Ok(())
    }

    // ---------------------------------------------------------------
    // ROS node wiring
    // ---------------------------------------------------------------

    pub async fn add_node(
        &self,
        robot_id: &str,
        container_id: &Address,
        node_id: impl Into<String>,
        config: &HashMap<String, Value>,
    ) -> SatelliteResult<()> {
        let node_id = node_id.into();
        let handle = self.lookup_owned(robot_id, container_id).await?;

        let node_def = self
            .cancellable(self.0.metadata_client.get_node_specs(&node_id))
            .await?;
        let params = node_def.resolve_parameters(config)?;

        {
            let mut guard = handle.lock().await;
            guard.add_node(node_id.clone())?;
        }

        self.0
            .dispatcher
            .send(
                container_id,
                Message::RosAdd {
                    node_id,
                    package: node_def.package,
                    executable: node_def.executable,
                    params,
                },
            )
            .await
    }

    pub async fn remove_node(
        &self,
        robot_id: &str,
        container_id: &Address,
        node_id: impl Into<String>,
    ) -> SatelliteResult<()> {
        let node_id = node_id.into();
        let handle = self.lookup_owned(robot_id, container_id).await?;
        {
            let mut guard = handle.lock().await;
            guard.remove_node(&node_id)?;
        }
        self.0
            .dispatcher
            .send(container_id, Message::RosRemove { node_id })
            .await
    }

    // ---------------------------------------------------------------
    // ROS message relay
    // ---------------------------------------------------------------

    pub async fn send_ros_msg_to_container(
        &self,
        robot_id: &str,
        container_id: &Address,
        interface: impl Into<String>,
        payload: Vec<u8>,
    ) -> SatelliteResult<()> {
        let handle = self.lookup_owned(robot_id, container_id).await?;
        handle.lock().await.send()?;
        self.0
            .dispatcher
            .send(
                container_id,
                Message::RosMsg {
                    interface: interface.into(),
                    payload,
                },
            )
            .await
    }

    pub async fn send_ros_msg_to_robot(
        &self,
        robot_id: &str,
        container_id: &Address,
        interface: impl Into<String>,
        payload: Vec<u8>,
    ) -> SatelliteResult<()> {
        let handle = self.lookup_owned(robot_id, container_id).await?;
        handle.lock().await.send()?;
        let interface = interface.into();
        self.0.robot_link.forward(robot_id, &interface, &payload).await
    }

    // ---------------------------------------------------------------
    // Peer mesh and routing
    // ---------------------------------------------------------------

    /// Open a connection to every peer named in a `CONNECT_DIRECTIVE` that
    /// isn't already connected, then announce the current routing view to
    /// each newly-connected peer.
    pub async fn connect_to_satellites(&self, peers: Vec<PeerSatellite>) {
        for peer in peers {
            match self.0.peers.is_connected(&peer.address) {
                Ok(true) => continue,
                Ok(false) => {}
                Err(err) => {
                    tracing::error!(error = %err, "peer registry lock poisoned");
                    continue;
                }
            }

            match self
                .0
                .peer_connector
                .connect(&peer.address, &peer.ip, PEER_APPROVED_MESSAGE_KINDS)
                .await
            {
                Ok(()) => {
                    if let Err(err) = self.0.peers.insert(peer.address.clone(), peer.ip.clone()) {
                        tracing::error!(error = %err, "failed to record peer connection");
                        continue;
                    }
                    let addresses = self.local_addresses().await;
                    let _ = self
                        .0
                        .dispatcher
                        .send(&peer.address, route_info_message(addresses))
                        .await;
                }
                Err(err) => {
                    tracing::warn!(address = %peer.address, ip = %peer.ip, error = %err, "failed to connect to peer satellite");
                }
            }
        }
    }

    /// `getSatelliteRouting`: the set of local container addresses
    /// currently in the map, regardless of `connected` flag.
    pub async fn get_satellite_routing(&self) -> Vec<Address> {
        self.local_addresses().await
    }

    async fn local_addresses(&self) -> Vec<Address> {
        self.0.containers.lock().await.keys().cloned().collect()
    }

    /// Re-send the routing view to every connected peer. Called directly
    /// whenever the container set changes (create/destroy), and indirectly
    /// (via the routing-announce channel) whenever a record's routing
    /// trigger fires.
    async fn announce_routing_change(&self) {
        let addresses = self.local_addresses().await;
        let peers = match self.0.peers.connected_addresses() {
            Ok(peers) => peers,
            Err(err) => {
                tracing::error!(error = %err, "peer registry lock poisoned");
                return;
            }
        };
        for peer in peers {
            let _ = self
                .0
                .dispatcher
                .send(&peer, route_info_message(addresses.clone()))
                .await;
        }
    }

    // ---------------------------------------------------------------
    // Shutdown
    // ---------------------------------------------------------------

    /// Cancel every in-flight asynchronous operation and drive every live
    /// container through `Stopping -> Stopped` in parallel. Blocks until
    /// all of them reach `Stopped`: a single join at this one entry point,
    /// rather than a synchronous wait mixed with event-loop callbacks that
    /// can return before every container has actually stopped.
    pub async fn shutdown(&self) {
        self.0.shutdown_token.cancel();
        self.0.master_client.fail_all_pending();

        let handles: Vec<(Address, ContainerHandle)> = {
            let containers = self.0.containers.lock().await;
            containers.iter().map(|(a, h)| (a.clone(), h.clone())).collect()
        };

        let stops = handles.into_iter().map(|(address, handle)| {
            let runtime_adapter = &self.0.runtime_adapter;
            async move {
                {
                    let mut guard = handle.lock().await;
                    let _ = guard.transition_to(ContainerStatus::Stopping);
                }
                let _ = runtime_adapter.stop(&address).await;
                {
                    let mut guard = handle.lock().await;
                    let _ = guard.transition_to(ContainerStatus::Stopped);
                    guard.invalidate_routing_trigger();
                }
                address
            }
        });

        let stopped = futures::future::join_all(stops).await;
        let mut containers = self.0.containers.lock().await;
        for address in stopped {
            containers.remove(&address);
        }
        tracing::info!("satellite shutdown complete");
    }

    // ---------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------

    async fn lookup(&self, address: &Address) -> Option<ContainerHandle> {
        self.0.containers.lock().await.get(address).cloned()
    }

    /// Resolve `container_id` and check ownership: an unknown container
    /// and an ownership mismatch both surface as `InvalidRequest` with no
    /// state change.
    async fn lookup_owned(&self, robot_id: &str, container_id: &Address) -> SatelliteResult<ContainerHandle> {
        let handle = self.lookup(container_id).await.ok_or_else(|| {
            SatelliteError::InvalidRequest(format!("container {container_id} does not exist"))
        })?;
        let owner_ok = handle.lock().await.check_owner(robot_id);
        if !owner_ok {
            return Err(SatelliteError::InvalidRequest(
                "robot is not the owner of the container".to_string(),
            ));
        }
        Ok(handle)
    }

    /// Race a collaborator future against satellite shutdown, surfacing
    /// `Cancelled` if shutdown wins.
    async fn cancellable<T>(&self, fut: impl std::future::Future<Output = SatelliteResult<T>>) -> SatelliteResult<T> {
        tokio::select! {
            result = fut => result,
            _ = self.0.shutdown_token.cancelled() => Err(SatelliteError::Cancelled("satellite is shutting down".to_string())),
        }
    }
}

async fn tokio_is_dir(path: &std::path::Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

/// Background task draining the routing-announce channel. A
/// `ContainerRecord`'s routing trigger is a synchronous, non-owning
/// closure (see `RoutingTrigger`); it cannot itself perform the async
/// peer-broadcast, so it only signals this loop, which holds a `Weak`
/// reference and exits once the manager is dropped.
async fn routing_announce_loop(weak: Weak<Inner>, mut rx: mpsc::UnboundedReceiver<()>) {
    while rx.recv().await.is_some() {
        let Some(inner) = weak.upgrade() else {
            break;
        };
        SatelliteManager(inner).announce_routing_change().await;
    }
}

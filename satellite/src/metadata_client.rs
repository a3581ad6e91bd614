//! Asynchronous lookups against the external robot/node metadata database.
//!
//! Transport is opaque and out of scope; this module only defines the
//! collaborator seam the manager calls through.

use std::path::PathBuf;

use async_trait::async_trait;
use satellite_shared::SatelliteResult;

use crate::node::NodeDefinition;

#[async_trait]
pub trait MetadataClient: Send + Sync {
    /// Resolve a robot's home directory.
    async fn get_robot_specs(&self, robot_id: &str) -> SatelliteResult<PathBuf>;

    /// Resolve a node's package, executable and parameter schema.
    async fn get_node_specs(&self, node_id: &str) -> SatelliteResult<NodeDefinition>;
}

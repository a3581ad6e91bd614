//! Container runtime adapter: materializes on-disk configuration and
//! drives the external `lxc-start` / `lxc-stop` commands.

pub mod files;
pub mod layout;
pub mod process;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use satellite_shared::{Address, SatelliteResult};

use crate::config::SatelliteConfig;
use layout::Layout;

/// Collaborator seam for starting/stopping containers, so the manager can
/// be exercised against an in-memory fake in tests without invoking real
/// subprocesses.
#[async_trait]
pub trait RuntimeAdapter: Send + Sync {
    /// Write `config`/`fstab`/`upstart` and invoke `lxc-start`.
    async fn start(&self, address: &Address, home_dir: &Path) -> SatelliteResult<()>;

    /// Invoke `lxc-stop` and recursively delete the container's
    /// configuration directory once it exits.
    async fn stop(&self, address: &Address) -> SatelliteResult<()>;
}

/// The real adapter, backed by `lxc-start`/`lxc-stop` and the filesystem.
pub struct LxcRuntimeAdapter {
    config: Arc<SatelliteConfig>,
    layout: Layout,
}

impl LxcRuntimeAdapter {
    pub fn new(config: Arc<SatelliteConfig>) -> Self {
        let layout = Layout::new(config.conf_dir.clone());
        Self { config, layout }
    }
}

#[async_trait]
impl RuntimeAdapter for LxcRuntimeAdapter {
    async fn start(&self, address: &Address, home_dir: &Path) -> SatelliteResult<()> {
        files::write_container_files(&self.config, &self.layout, address, home_dir)?;
        process::start_container(&self.layout, address).await
    }

    async fn stop(&self, address: &Address) -> SatelliteResult<()> {
        process::stop_container(&self.layout, address).await
    }
}

//! Process-wide configuration, validated once at construction.
//!
//! The values a deployment would otherwise read from module-level
//! constants or environment globals are instead fields of a single
//! immutable value, injected into the manager at construction.

use std::path::{Path, PathBuf};

use satellite_shared::{AddressConfig, SatelliteError, SatelliteResult};

/// Process-wide configuration for one satellite instance.
///
/// Constructed once at startup via [`SatelliteConfig::new`], which validates
/// every absolute-path requirement up front. There is no mutation after
/// construction; the manager holds an `Arc<SatelliteConfig>`.
#[derive(Clone, Debug)]
pub struct SatelliteConfig {
    /// Base directory under which `<confDir>/<address>/{config,fstab,upstart}`
    /// are written.
    pub conf_dir: PathBuf,
    /// Container root filesystem template, bind-mounted read-only.
    pub rootfs: PathBuf,
    /// Framework install tree, bind-mounted read-only into every container.
    pub src_root: PathBuf,
    /// TCP port used for satellite-to-satellite peer connections.
    pub port_satellite_satellite: u16,
    /// Address format and the reserved master address constant.
    pub address: AddressConfig,
}

impl SatelliteConfig {
    /// Build and validate a configuration value.
    ///
    /// Fails with [`SatelliteError::ConfigError`] if any of `conf_dir`,
    /// `rootfs`, `src_root` is not an absolute path.
    pub fn new(
        conf_dir: impl Into<PathBuf>,
        rootfs: impl Into<PathBuf>,
        src_root: impl Into<PathBuf>,
        port_satellite_satellite: u16,
        address: AddressConfig,
    ) -> SatelliteResult<Self> {
        let conf_dir = conf_dir.into();
        let rootfs = rootfs.into();
        let src_root = src_root.into();

        require_absolute(&conf_dir, "confDir")?;
        require_absolute(&rootfs, "rootfs")?;
        require_absolute(&src_root, "srcRoot")?;

        Ok(Self {
            conf_dir,
            rootfs,
            src_root,
            port_satellite_satellite,
            address,
        })
    }
}

fn require_absolute(path: &Path, name: &str) -> SatelliteResult<()> {
    if path.is_absolute() {
        Ok(())
    } else {
        Err(SatelliteError::ConfigError(format!(
            "{name} is not an absolute path: {}",
            path.display()
        )))
    }
}

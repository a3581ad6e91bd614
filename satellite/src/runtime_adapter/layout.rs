//! Path layout for a container's on-disk configuration directory.

use std::path::PathBuf;

use satellite_shared::Address;

/// Builds the `<confDir>/<address>/...` paths a runtime adapter reads and
/// writes. Exists so the layout rules live in one place rather than being
/// re-derived at each call site.
#[derive(Clone, Debug)]
pub struct Layout {
    conf_dir: PathBuf,
}

impl Layout {
    pub fn new(conf_dir: PathBuf) -> Self {
        Self { conf_dir }
    }

    pub fn container_dir(&self, address: &Address) -> PathBuf {
        self.conf_dir.join(address.as_str())
    }

    pub fn config_path(&self, address: &Address) -> PathBuf {
        self.container_dir(address).join("config")
    }

    pub fn fstab_path(&self, address: &Address) -> PathBuf {
        self.container_dir(address).join("fstab")
    }

    pub fn upstart_path(&self, address: &Address) -> PathBuf {
        self.container_dir(address).join("upstart")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_expected_paths() {
        let layout = Layout::new(PathBuf::from("/etc/sat/conf"));
        let addr = Address::new_unchecked("SATL0042");
        assert_eq!(
            layout.container_dir(&addr),
            PathBuf::from("/etc/sat/conf/SATL0042")
        );
        assert_eq!(
            layout.config_path(&addr),
            PathBuf::from("/etc/sat/conf/SATL0042/config")
        );
        assert_eq!(
            layout.fstab_path(&addr),
            PathBuf::from("/etc/sat/conf/SATL0042/fstab")
        );
        assert_eq!(
            layout.upstart_path(&addr),
            PathBuf::from("/etc/sat/conf/SATL0042/upstart")
        );
    }
}

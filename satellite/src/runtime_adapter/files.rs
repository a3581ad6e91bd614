//! Deterministic, byte-for-byte generation of the three per-container files
//! the external container runtime reads: `config`, `fstab`, `upstart`.

use std::path::Path;

use satellite_shared::{Address, SatelliteError, SatelliteResult};

use super::layout::Layout;
use crate::config::SatelliteConfig;

/// Render `config`: UTS name, tty/pts counts, rootfs, fstab reference,
/// veth network stanza, and the device cgroup whitelist.
pub fn render_config(cfg: &SatelliteConfig, layout: &Layout, address: &Address) -> String {
    let fstab = layout.fstab_path(address);
    let lines: [String; 24] = [
        "lxc.utsname = ros".to_string(),
        String::new(),
        "lxc.tty = 4".to_string(),
        "lxc.pts = 1024".to_string(),
        format!("lxc.rootfs = {}", cfg.rootfs.display()),
        format!("lxc.mount = {}", fstab.display()),
        String::new(),
        "lxc.network.type = veth".to_string(),
        "lxc.network.flags = up".to_string(),
        "lxc.network.name = eth0".to_string(),
        "lxc.network.link = br0".to_string(),
        "lxc.network.ipv4 = 0.0.0.0".to_string(),
        String::new(),
        "lxc.cgroup.devices.deny = a".to_string(),
        "# /dev/null and zero".to_string(),
        "lxc.cgroup.devices.allow = c 1:3 rwm".to_string(),
        "lxc.cgroup.devices.allow = c 1:5 rwm".to_string(),
        "# consoles".to_string(),
        "lxc.cgroup.devices.allow = c 5:1 rwm".to_string(),
        "lxc.cgroup.devices.allow = c 5:0 rwm".to_string(),
        "lxc.cgroup.devices.allow = c 4:0 rwm".to_string(),
        "lxc.cgroup.devices.allow = c 4:1 rwm".to_string(),
        "# /dev/{,u}random".to_string(),
        "lxc.cgroup.devices.allow = c 1:9 rwm".to_string(),
    ];
    let tail = [
        "lxc.cgroup.devices.allow = c 1:8 rwm".to_string(),
        "lxc.cgroup.devices.allow = c 136:* rwm".to_string(),
        "lxc.cgroup.devices.allow = c 5:2 rwm".to_string(),
        "# rtc".to_string(),
        "lxc.cgroup.devices.allow = c 254:0 rwm".to_string(),
    ];
    let mut content = lines.join("\n");
    content.push('\n');
    content.push_str(&tail.join("\n"));
    content.push('\n');
    content
}

/// Render `fstab`: proc/devpts/sysfs binds, the robot home directory, the
/// read-only framework source tree, and the read-only upstart script.
///
/// Fails with [`SatelliteError::ConfigError`] unless `home_dir` is absolute;
/// `cfg.rootfs`/`cfg.src_root`/`confDir` are already guaranteed absolute by
/// [`SatelliteConfig::new`].
pub fn render_fstab(
    cfg: &SatelliteConfig,
    layout: &Layout,
    address: &Address,
    home_dir: &Path,
) -> SatelliteResult<String> {
    if !home_dir.is_absolute() {
        return Err(SatelliteError::ConfigError(format!(
            "home directory is not an absolute path: {}",
            home_dir.display()
        )));
    }

    let rootfs = &cfg.rootfs;
    let lines = [
        format!(
            "proc     {}      proc     nodev,noexec,nosuid 0 0",
            rootfs.join("proc").display()
        ),
        format!(
            "devpts   {}   devpts   defaults            0 0",
            rootfs.join("dev/pts").display()
        ),
        format!(
            "sysfs    {}       sysfs    defaults            0 0",
            rootfs.join("sys").display()
        ),
        format!(
            "{}   {}   none   bind 0 0",
            home_dir.display(),
            rootfs.join("home/ros").display()
        ),
        format!(
            "{}   {}   none   bind,ro 0 0",
            cfg.src_root.display(),
            rootfs.join("opt/reappengine").display()
        ),
        format!(
            "{}   {}   none   bind,ro 0 0",
            layout.upstart_path(address).display(),
            rootfs.join("etc/init/reappengine.conf").display()
        ),
    ];
    let mut content = lines.join("\n");
    content.push('\n');
    Ok(content)
}

/// Render `upstart`: starts the inner framework entry point as `ros`,
/// passing this container's own satellite-scoped address as its argument.
pub fn render_upstart(address: &Address) -> String {
    let lines = [
        "# description".to_string(),
        "author \"satellite control plane\"".to_string(),
        "description \"reappengine - ROS framework for managing and using ROS nodes\""
            .to_string(),
        String::new(),
        "# start/stop conditions".to_string(),
        "start on runlevel [2345]".to_string(),
        "stop on runlevel [016])".to_string(),
        String::new(),
        "# timeout before the process is killed; generous as a lot of processes have".to_string(),
        "# to be terminated by the reappengine".to_string(),
        "kill timeout 30".to_string(),
        String::new(),
        "script".to_string(),
        "\t# setup environment".to_string(),
        "\t. /etc/environment".to_string(),
        "\t".to_string(),
        "\t# start environment node".to_string(),
        format!(
            "\tstart-stop-daemon -c ros:ros -d /home/ros --retry 5 --exec python -- /home/ros/lib/framework/Administration/src/Environment.py {address}"
        ),
        "end script".to_string(),
    ];
    let mut content = lines.join("\n");
    content.push('\n');
    content
}

/// Create `<confDir>/<address>/` and write all three files.
///
/// Fails with [`SatelliteError::AlreadyStarted`] if the directory already
/// exists; the caller (the runtime adapter) is responsible for releasing
/// the reserved address back to the master in that case.
pub fn write_container_files(
    cfg: &SatelliteConfig,
    layout: &Layout,
    address: &Address,
    home_dir: &Path,
) -> SatelliteResult<()> {
    let dir = layout.container_dir(address);
    if dir.exists() {
        return Err(SatelliteError::AlreadyStarted(format!(
            "configuration directory already exists for {address}"
        )));
    }

    // Validate fstab content before touching the filesystem.
    let fstab = render_fstab(cfg, layout, address, home_dir)?;
    let config = render_config(cfg, layout, address);
    let upstart = render_upstart(address);

    std::fs::create_dir_all(&dir)?;
    std::fs::write(layout.config_path(address), config)?;
    std::fs::write(layout.fstab_path(address), fstab)?;
    std::fs::write(layout.upstart_path(address), upstart)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use satellite_shared::{Address, AddressConfig};
    use tempfile::tempdir;

    fn test_config(conf_dir: &Path) -> SatelliteConfig {
        SatelliteConfig::new(
            conf_dir,
            "/var/lib/rootfs",
            "/opt/reappengine-src",
            11411,
            AddressConfig {
                total_length: 8,
                prefix_length: 4,
                alphabet: AddressConfig::default_alphabet,
                master_address: Address::new_unchecked("MSTR0000"),
            },
        )
        .unwrap()
    }

    #[test]
    fn config_contains_required_lines() {
        let dir = tempdir().unwrap();
        let cfg = test_config(dir.path());
        let layout = Layout::new(dir.path().to_path_buf());
        let addr = Address::new_unchecked("SATL0042");

        let content = render_config(&cfg, &layout, &addr);
        assert!(content.contains("lxc.utsname = ros"));
        assert!(content.contains("lxc.tty = 4"));
        assert!(content.contains("lxc.pts = 1024"));
        assert!(content.contains("lxc.rootfs = /var/lib/rootfs"));
        assert!(content.contains(&format!(
            "lxc.mount = {}",
            layout.fstab_path(&addr).display()
        )));
        assert!(content.contains("lxc.network.type = veth"));
        assert!(content.contains("lxc.cgroup.devices.deny = a"));
        assert!(content.contains("lxc.cgroup.devices.allow = c 254:0 rwm"));
    }

    #[test]
    fn config_is_deterministic() {
        let dir = tempdir().unwrap();
        let cfg = test_config(dir.path());
        let layout = Layout::new(dir.path().to_path_buf());
        let addr = Address::new_unchecked("SATL0042");

        let a = render_config(&cfg, &layout, &addr);
        let b = render_config(&cfg, &layout, &addr);
        assert_eq!(a, b);
    }

    #[test]
    fn fstab_rejects_relative_home_dir() {
        let dir = tempdir().unwrap();
        let cfg = test_config(dir.path());
        let layout = Layout::new(dir.path().to_path_buf());
        let addr = Address::new_unchecked("SATL0042");

        let err = render_fstab(&cfg, &layout, &addr, Path::new("relative/home")).unwrap_err();
        assert!(matches!(err, SatelliteError::ConfigError(_)));
    }

    #[test]
    fn fstab_binds_home_dir_and_src_root() {
        let dir = tempdir().unwrap();
        let cfg = test_config(dir.path());
        let layout = Layout::new(dir.path().to_path_buf());
        let addr = Address::new_unchecked("SATL0042");

        let content = render_fstab(&cfg, &layout, &addr, Path::new("/home/ros/A")).unwrap();
        assert!(content.contains("/home/ros/A"));
        assert!(content.contains("/opt/reappengine-src"));
        assert!(content.contains("bind,ro 0 0"));
        assert!(content.contains(&layout.upstart_path(&addr).display().to_string()));
    }

    #[test]
    fn upstart_passes_address_as_final_argument() {
        let addr = Address::new_unchecked("SATL0042");
        let content = render_upstart(&addr);
        assert!(content.trim_end().ends_with("SATL0042"));
        assert!(content.contains("start-stop-daemon"));
    }

    #[test]
    fn write_container_files_fails_if_directory_exists() {
        let dir = tempdir().unwrap();
        let cfg = test_config(dir.path());
        let layout = Layout::new(dir.path().to_path_buf());
        let addr = Address::new_unchecked("SATL0099");

        std::fs::create_dir_all(layout.container_dir(&addr)).unwrap();
        let err = write_container_files(&cfg, &layout, &addr, Path::new("/home/ros/A")).unwrap_err();
        assert!(matches!(err, SatelliteError::AlreadyStarted(_)));
    }

    #[test]
    fn write_container_files_creates_all_three_files() {
        let dir = tempdir().unwrap();
        let cfg = test_config(dir.path());
        let layout = Layout::new(dir.path().to_path_buf());
        let addr = Address::new_unchecked("SATL0001");

        write_container_files(&cfg, &layout, &addr, Path::new("/home/ros/A")).unwrap();
        assert!(layout.config_path(&addr).is_file());
        assert!(layout.fstab_path(&addr).is_file());
        assert!(layout.upstart_path(&addr).is_file());
    }
}

//! Invocation of the external `lxc-start` / `lxc-stop` commands.

use tokio::process::Command;

use satellite_shared::{Address, SatelliteResult};

use super::layout::Layout;

/// Spawn `lxc-start -n <address> -f <config> -d` and wait for it to exit.
///
/// A non-zero exit code is logged but does not fail the call: the caller
/// observes the container as `connected=false` and may choose to stop it.
pub async fn start_container(layout: &Layout, address: &Address) -> SatelliteResult<()> {
    let config_path = layout.config_path(address);
    let mut cmd = Command::new("lxc-start");
    cmd.arg("-n")
        .arg(address.as_str())
        .arg("-f")
        .arg(&config_path)
        .arg("-d");

    tracing::info!(address = %address, config = %config_path.display(), "starting container");

    let status = cmd.status().await?;
    if !status.success() {
        tracing::warn!(address = %address, status = ?status.code(), "lxc-start exited non-zero");
    }
    Ok(())
}

/// Spawn `lxc-stop -n <address>`, wait for it regardless of exit code, then
/// recursively delete `<confDir>/<address>`.
pub async fn stop_container(layout: &Layout, address: &Address) -> SatelliteResult<()> {
    let dir = layout.container_dir(address);
    if !dir.exists() {
        // Stopping a never-started address is a no-op.
        return Ok(());
    }

    let mut cmd = Command::new("lxc-stop");
    cmd.arg("-n").arg(address.as_str());

    tracing::info!(address = %address, "stopping container");
    let status = cmd.status().await?;
    if !status.success() {
        tracing::warn!(address = %address, status = ?status.code(), "lxc-stop exited non-zero");
    }

    tokio::task::spawn_blocking({
        let dir = dir.clone();
        move || std::fs::remove_dir_all(&dir)
    })
    .await
    .map_err(|e| satellite_shared::SatelliteError::Internal(format!("cleanup task panicked: {e}")))??;

    Ok(())
}

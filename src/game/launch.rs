use anyhow::Context;
use std::{path::Path, process::Stdio};
use tokio::process::Command;

/// Starts `exe` without waiting for it. Returns the OS pid when known.
pub fn spawn_detached(exe: &Path) -> anyhow::Result<Option<u32>> {
    let mut cmd = Command::new(exe);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(false);
    #[cfg(target_os = "windows")]
    cmd.creation_flags(0x00000008); // DETACHED_PROCESS

    let child = cmd
        .spawn()
        .with_context(|| format!("spawn {}", exe.display()))?;
    Ok(child.id())
}

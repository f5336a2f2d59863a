//! Finds locally installed game clients.

use serde::Serialize;
use std::path::PathBuf;

/// A client the launcher knows how to start.
#[derive(Debug, Clone, Copy)]
pub struct KnownClient {
    pub id: &'static str,
    pub name: &'static str,
    /// Executable names searched for on `PATH`.
    binaries: &'static [&'static str],
}

pub const KNOWN_CLIENTS: &[KnownClient] = &[
    KnownClient {
        id: "roblox",
        name: "Roblox",
        binaries: &["RobloxPlayerBeta", "roblox-player"],
    },
    KnownClient {
        id: "minecraft",
        name: "Minecraft",
        binaries: &["minecraft-launcher", "MinecraftLauncher"],
    },
    KnownClient {
        id: "steam",
        name: "Steam",
        binaries: &["steam"],
    },
];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedClient {
    pub id: &'static str,
    pub name: &'static str,
    pub installed: bool,
    pub path: Option<String>,
}

pub fn known(id: &str) -> Option<&'static KnownClient> {
    KNOWN_CLIENTS.iter().find(|c| c.id.eq_ignore_ascii_case(id.trim()))
}

/// One entry per known client, installed or not.
pub fn detect_all() -> Vec<DetectedClient> {
    KNOWN_CLIENTS.iter().map(detect).collect()
}

pub fn detect(client: &KnownClient) -> DetectedClient {
    let path = install_locations(client.id)
        .into_iter()
        .find(|p| p.is_file())
        .or_else(|| {
            let search = std::env::var_os("PATH").unwrap_or_default();
            client
                .binaries
                .iter()
                .find_map(|b| find_in_dirs(b, std::env::split_paths(&search)))
        });

    DetectedClient {
        id: client.id,
        name: client.name,
        installed: path.is_some(),
        path: path.map(|p| p.to_string_lossy().to_string()),
    }
}

/// First directory in `dirs` containing an executable file called `binary`.
pub fn find_in_dirs<I>(binary: &str, dirs: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    let file_name = if cfg!(target_os = "windows") {
        format!("{binary}.exe")
    } else {
        binary.to_string()
    };
    dirs.into_iter()
        .map(|d| d.join(&file_name))
        .find(|p| p.is_file())
}

#[cfg(target_os = "windows")]
fn install_locations(id: &str) -> Vec<PathBuf> {
    let program_files = PathBuf::from(r"C:\Program Files (x86)");
    match id {
        "roblox" => dirs::data_local_dir()
            .map(|d| {
                let versions = d.join("Roblox").join("Versions");
                newest_version_exe(&versions, "RobloxPlayerBeta.exe")
            })
            .unwrap_or_default(),
        "minecraft" => vec![
            program_files.join("Minecraft Launcher").join("MinecraftLauncher.exe"),
            PathBuf::from(r"C:\XboxGames\Minecraft Launcher\Content\Minecraft.exe"),
        ],
        "steam" => vec![program_files.join("Steam").join("steam.exe")],
        _ => Vec::new(),
    }
}

#[cfg(target_os = "macos")]
fn install_locations(id: &str) -> Vec<PathBuf> {
    let apps = |bundle: &str, exe: &str| {
        let mut roots = vec![PathBuf::from("/Applications")];
        roots.extend(dirs::home_dir().map(|h| h.join("Applications")));
        roots
            .into_iter()
            .map(|r| r.join(bundle).join("Contents/MacOS").join(exe))
            .collect::<Vec<_>>()
    };
    match id {
        "roblox" => apps("Roblox.app", "RobloxPlayer"),
        "minecraft" => apps("Minecraft.app", "launcher"),
        "steam" => apps("Steam.app", "steam_osx"),
        _ => Vec::new(),
    }
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn install_locations(id: &str) -> Vec<PathBuf> {
    let Some(home) = dirs::home_dir() else {
        return Vec::new();
    };
    match id {
        "minecraft" => vec![home.join(".local/bin/minecraft-launcher")],
        "steam" => vec![home.join(".steam/steam/steam.sh")],
        // No native Linux player
        _ => Vec::new(),
    }
}

/// Roblox keeps each build in its own `version-*` directory.
#[cfg(target_os = "windows")]
fn newest_version_exe(versions: &std::path::Path, exe: &str) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(versions) else {
        return Vec::new();
    };
    let mut found: Vec<(std::time::SystemTime, PathBuf)> = entries
        .flatten()
        .map(|e| e.path().join(exe))
        .filter(|p| p.is_file())
        .filter_map(|p| {
            let modified = p.metadata().and_then(|m| m.modified()).ok()?;
            Some((modified, p))
        })
        .collect();
    found.sort_by(|a, b| b.0.cmp(&a.0));
    found.into_iter().map(|(_, p)| p).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_client_is_reported() {
        let detected = detect_all();
        assert_eq!(detected.len(), KNOWN_CLIENTS.len());
        for d in &detected {
            assert_eq!(d.installed, d.path.is_some());
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(known("Steam").map(|c| c.id), Some("steam"));
        assert!(known("origin").is_none());
    }

    #[test]
    fn finds_binary_in_search_dirs() {
        let dir = std::env::temp_dir().join(format!("scripthub-detect-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let name = if cfg!(target_os = "windows") { "steam.exe" } else { "steam" };
        std::fs::write(dir.join(name), b"").unwrap();

        let found = find_in_dirs("steam", vec![PathBuf::from("/nonexistent"), dir.clone()]);
        assert_eq!(found, Some(dir.join(name)));
        assert!(find_in_dirs("minecraft-launcher", vec![dir.clone()]).is_none());

        std::fs::remove_dir_all(dir).unwrap();
    }
}

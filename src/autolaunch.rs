/*!
 * Launch at login
 *
 * On Linux this manages an XDG autostart entry under
 * `$XDG_CONFIG_HOME/autostart`. Other platforms are not supported.
 */

use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{PresenceError, Result};

pub const AUTOSTART_FILE: &str = "cosmos-presence.desktop";

/// Enable or disable launching `cosmos-presence run` at login
pub fn set_auto_launch(enabled: bool) -> Result<()> {
    let dir = autostart_dir()?;
    let exe = std::env::current_exe()?;
    set_auto_launch_in(&dir, &exe, enabled)
}

pub fn is_auto_launch_enabled() -> Result<bool> {
    Ok(autostart_dir()?.join(AUTOSTART_FILE).is_file())
}

#[cfg(target_os = "linux")]
fn autostart_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("autostart"))
        .ok_or_else(|| PresenceError::Config("no user config directory".to_string()))
}

#[cfg(not(target_os = "linux"))]
fn autostart_dir() -> Result<PathBuf> {
    Err(PresenceError::Unsupported("launch at login"))
}

/// Write or remove the entry in `dir`. Removing a missing entry is not an error.
pub fn set_auto_launch_in(dir: &Path, exe: &Path, enabled: bool) -> Result<()> {
    let path = dir.join(AUTOSTART_FILE);

    if enabled {
        fs::create_dir_all(dir)?;
        fs::write(&path, desktop_entry(exe))?;
        info!("Launch at login enabled: {}", path.display());
        return Ok(());
    }

    match fs::remove_file(&path) {
        Ok(()) => {
            info!("Launch at login disabled");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn desktop_entry(exe: &Path) -> String {
    format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name=Cosmos Presence\n\
         Comment=Astronomy rich presence for Discord\n\
         Exec=\"{}\" run\n\
         Terminal=false\n\
         X-GNOME-Autostart-enabled=true\n",
        exe.display()
    )
}

//! Session persistence.
//!
//! Keeps the client session and the refresh token between invocations in
//! `~/.recipebox/session.json`.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use recipebox_core::client::ClientSession;
use serde::{Deserialize, Serialize};

/// Everything the CLI remembers between runs.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct StoredSession {
    #[serde(flatten)]
    pub client: ClientSession,
    /// Refresh token captured from the server's `jwt` cookie.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl StoredSession {
    /// Path to the session file: `~/.recipebox/session.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".recipebox").join("session.json"))
    }

    /// Load from disk. Returns a fresh session if the file is missing or invalid.
    pub fn load(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save to disk, readable only by the current user on unix. The mode is
    /// set before any token is written.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path)?;

        // `mode` only applies on creation; tighten a file that already existed.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

impl std::fmt::Debug for StoredSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredSession")
            .field("guest_mode", &self.client.guest_mode)
            .field("current_recipe_id", &self.client.current_recipe_id)
            .field("username", &self.client.username)
            .field("signed_in", &self.client.is_signed_in())
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}

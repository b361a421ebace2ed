//! Persists the logged-in profile between runs as a small JSON file.
//!
//! Only [`PersistedSession`] goes to disk; every other cache is rebuilt
//! after login or restore.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::Context;
use log::{debug, info, warn};

use crate::client::models::user_store::PersistedSession;

pub fn save_session(path: &Path, session: &PersistedSession) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(session)?;
    // atomic replace
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    debug!("[SESSION_STORE] Saved session to {}", path.display());
    Ok(())
}

/// Loads the saved session. A missing, empty or unreadable file yields
/// `None`; a corrupt one is logged and ignored.
pub fn load_session(path: &Path) -> Option<PersistedSession> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("[SESSION_STORE] Cannot read {}: {}", path.display(), e);
            return None;
        }
    };
    if text.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(&text) {
        Ok(session) => Some(session),
        Err(e) => {
            warn!("[SESSION_STORE] Ignoring corrupt session file {}: {}", path.display(), e);
            None
        }
    }
}

pub fn clear_session(path: &Path) -> anyhow::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            info!("[SESSION_STORE] Cleared {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("removing {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::models::User;

    #[test]
    fn save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        assert!(load_session(&path).is_none());

        let session = PersistedSession {
            user_info: Some(User { id: 3, username: "amy".into(), ..User::default() }),
            is_logged_in: true,
        };
        save_session(&path, &session).unwrap();
        assert_eq!(load_session(&path), Some(session));

        clear_session(&path).unwrap();
        assert!(load_session(&path).is_none());
        clear_session(&path).unwrap();
    }

    #[test]
    fn corrupt_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{ nope").unwrap();
        assert!(load_session(&path).is_none());
    }
}

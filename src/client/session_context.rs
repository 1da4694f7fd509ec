//! Client-side session: the auth token and the active profile snapshot.
//!
//! Both values are caches of server state. They are hydrated from a JSON
//! file on load, written back on every change and cleared together on
//! teardown.

use crate::profile::Profile;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Screens of a companion front end. Only profile management changes how
/// profile selection behaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppView {
    Home,
    Search,
    Library,
    Playlist,
    ProfileManagement,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub token: Option<String>,
    pub active_profile: Option<Profile>,
}

pub struct SessionContext {
    path: Option<PathBuf>,
    state: Mutex<SessionSnapshot>,
}

impl SessionContext {
    /// A session that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(SessionSnapshot::default()),
        }
    }

    /// Hydrates the session from `path`. A missing file is an empty session,
    /// an unreadable one is discarded with a warning.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let snapshot = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<SessionSnapshot>(&content) {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    warn!("Discarding unreadable session file {:?}: {}", path, err);
                    SessionSnapshot::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => SessionSnapshot::default(),
            Err(err) => {
                warn!("Could not read session file {:?}: {}", path, err);
                SessionSnapshot::default()
            }
        };
        Self {
            path: Some(path),
            state: Mutex::new(snapshot),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.lock().unwrap().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state.lock().unwrap().token.clone()
    }

    pub fn active_profile(&self) -> Option<Profile> {
        self.state.lock().unwrap().active_profile.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.lock().unwrap().token.is_some()
    }

    pub fn set_token(&self, token: String) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.token = Some(token);
        self.persist(&state)
    }

    /// Makes `profile` the active one, unless the user is on the profile
    /// management view, where selecting clears the active profile instead.
    pub fn set_active_profile(&self, profile: Profile, current_view: AppView) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if current_view == AppView::ProfileManagement {
            debug!("Profile selected from profile management, clearing active profile");
            state.active_profile = None;
        } else {
            state.active_profile = Some(profile);
        }
        self.persist(&state)
    }

    pub fn clear_active_profile(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.active_profile = None;
        self.persist(&state)
    }

    /// Forgets both the token and the active profile in a single write.
    pub fn teardown(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        *state = SessionSnapshot::default();
        self.persist(&state)
    }

    fn persist(&self, state: &SessionSnapshot) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let content = serde_json::to_string(state)?;
        let tmp_path = path.with_extension("tmp");
        std::fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write session file {:?}", tmp_path))?;
        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to replace session file {:?}", path))?;
        Ok(())
    }
}

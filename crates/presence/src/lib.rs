//! Persisted set of players currently present on the server.
//!
//! The set is loaded once at startup and rewritten in full after every
//! mutation. The on-disk record is one player name per line; a missing
//! record is an empty set. Rewrites go through a temp file + rename so a
//! crash mid-write cannot leave a torn record behind.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

/// Errors from presence record operations.
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The set of currently-present players, mirrored to a record on disk.
///
/// The watch loop mutates it and the health reporter reads it. The internal
/// mutex also covers the on-disk rewrite, so a snapshot can never observe a
/// rewrite in progress.
pub struct PresenceStore {
    path: PathBuf,
    players: Mutex<BTreeSet<String>>,
}

impl PresenceStore {
    /// Loads the presence record at `path`.
    ///
    /// A missing record is an empty set, not an error.
    pub fn load(path: PathBuf) -> Result<Self, PresenceError> {
        let players: BTreeSet<String> = match std::fs::read_to_string(&path) {
            Ok(content) => content
                .lines()
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), count = players.len(), "presence record loaded");

        Ok(Self {
            path,
            players: Mutex::new(players),
        })
    }

    /// Applies a join or leave and rewrites the record.
    ///
    /// Joining an already-present player and removing an unknown one both
    /// leave the set unchanged.
    pub async fn apply(&self, name: &str, joined: bool) -> Result<(), PresenceError> {
        let mut players = self.players.lock().await;
        if joined {
            players.insert(name.to_string());
        } else {
            players.remove(name);
        }
        persist(&self.path, &players)
    }

    /// Returns the current player names, sorted.
    pub async fn snapshot(&self) -> Vec<String> {
        self.players.lock().await.iter().cloned().collect()
    }
}

/// Rewrites the full record: write a temp file, then rename it over the
/// previous record. The parent directory is created on demand.
fn persist(path: &Path, players: &BTreeSet<String>) -> Result<(), PresenceError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut content = String::new();
    for name in players {
        content.push_str(name);
        content.push('\n');
    }

    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;

    tracing::debug!(count = players.len(), "presence record rewritten");
    Ok(())
}

/// Returns the default record location,
/// `<data dir>/joinwatch/active_players.txt`.
pub fn default_store_path() -> PathBuf {
    data_base_dir().join("joinwatch").join("active_players.txt")
}

/// Returns the platform-specific data directory.
fn data_base_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
                PathBuf::from(home).join(".local").join("share")
            })
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata)
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home).join(".local").join("share")
    }
}

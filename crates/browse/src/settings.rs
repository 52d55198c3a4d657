use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::warn;

/// Process-wide UI preferences. One flag today; the file format leaves room
/// for more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub dark_mode: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self { dark_mode: true }
    }
}

/// Preference store: initialized once from its JSON file, persisted on
/// every change, with change notifications for subscribers.
#[derive(Clone)]
pub struct SettingsStore {
    path: PathBuf,
    tx: watch::Sender<Preferences>,
}

impl SettingsStore {
    /// Read the settings file, falling back to defaults when it is missing
    /// or unreadable as JSON.
    pub fn load(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let prefs = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "settings file unreadable, using defaults");
                Preferences::default()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Preferences::default(),
            Err(e) => return Err(e),
        };

        let (tx, _) = watch::channel(prefs);
        Ok(Self { path, tx })
    }

    pub fn preferences(&self) -> Preferences {
        *self.tx.borrow()
    }

    pub fn set_dark_mode(&self, dark_mode: bool) -> io::Result<Preferences> {
        let prefs = Preferences { dark_mode };
        fs::write(&self.path, serde_json::to_string_pretty(&prefs)?)?;
        self.tx.send_replace(prefs);
        Ok(prefs)
    }

    pub fn subscribe(&self) -> watch::Receiver<Preferences> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "cartelera_settings_{}_{name}.json",
            std::process::id()
        ))
    }

    #[test]
    fn defaults_to_dark_when_no_file_exists() {
        let path = scratch_path("missing");
        let _ = fs::remove_file(&path);

        let store = SettingsStore::load(&path).unwrap();
        assert!(store.preferences().dark_mode);
    }

    #[test]
    fn set_persists_across_reloads() {
        let path = scratch_path("persist");
        let _ = fs::remove_file(&path);

        let store = SettingsStore::load(&path).unwrap();
        store.set_dark_mode(false).unwrap();

        let reloaded = SettingsStore::load(&path).unwrap();
        assert!(!reloaded.preferences().dark_mode);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let path = scratch_path("corrupt");
        fs::write(&path, "not json").unwrap();

        let store = SettingsStore::load(&path).unwrap();
        assert!(store.preferences().dark_mode);

        let _ = fs::remove_file(&path);
    }

    #[tokio::test]
    async fn subscribers_are_notified_of_changes() {
        let path = scratch_path("subscribe");
        let _ = fs::remove_file(&path);

        let store = SettingsStore::load(&path).unwrap();
        let mut rx = store.subscribe();

        store.set_dark_mode(false).unwrap();
        rx.changed().await.unwrap();
        assert!(!rx.borrow().dark_mode);

        let _ = fs::remove_file(&path);
    }
}

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{
    resolve_display_mode, DisplayMode, PreferenceError, PreferenceStorage, DISPLAY_MODE_KEY,
};

/// Display-mode preference with synchronous persistence.
///
/// Mode changes are published on a [`watch`] channel; subscribers apply the
/// visual effect. Environment changes are followed only until the user picks
/// a mode explicitly.
pub struct PreferenceStore {
    storage: Box<dyn PreferenceStorage>,
    mode: watch::Sender<DisplayMode>,
}

impl PreferenceStore {
    /// Resolve the initial mode from `storage`, then `environment`, then the
    /// fallback.
    pub fn new(storage: Box<dyn PreferenceStorage>, environment: Option<DisplayMode>) -> Self {
        let stored = read_stored(storage.as_ref());
        let mode = resolve_display_mode(stored, environment);
        info!(
            "Display mode '{}' (stored: {:?}, environment: {:?})",
            mode, stored, environment
        );
        let (sender, _) = watch::channel(mode);
        Self {
            storage,
            mode: sender,
        }
    }

    pub fn mode(&self) -> DisplayMode {
        *self.mode.borrow()
    }

    pub fn is_dark(&self) -> bool {
        self.mode() == DisplayMode::Dark
    }

    pub fn is_light(&self) -> bool {
        self.mode() == DisplayMode::Light
    }

    /// Receive every applied mode.
    pub fn subscribe(&self) -> watch::Receiver<DisplayMode> {
        self.mode.subscribe()
    }

    /// Whether the user has stored a mode explicitly.
    pub fn has_explicit_value(&self) -> bool {
        read_stored(self.storage.as_ref()).is_some()
    }

    /// Switch between light and dark. Returns the new mode.
    pub fn toggle(&self) -> Result<DisplayMode, PreferenceError> {
        let mode = self.mode().toggled();
        self.set(mode)?;
        Ok(mode)
    }

    /// Apply `mode` and persist it.
    pub fn set(&self, mode: DisplayMode) -> Result<(), PreferenceError> {
        self.apply(mode);
        self.storage.set(DISPLAY_MODE_KEY, mode.as_str())
    }

    /// Forget the stored mode and go back to following the environment.
    /// Applies `environment` (or the fallback) right away.
    pub fn reset(&self, environment: Option<DisplayMode>) -> Result<DisplayMode, PreferenceError> {
        self.storage.remove(DISPLAY_MODE_KEY)?;
        let mode = resolve_display_mode(None, environment);
        self.apply(mode);
        info!("Display mode preference cleared, now '{}'", mode);
        Ok(mode)
    }

    /// Follow an environment change unless a mode was stored explicitly.
    /// Returns whether the change was applied.
    pub fn on_environment_change(&self, environment: DisplayMode) -> bool {
        if self.has_explicit_value() {
            debug!("Ignoring environment display mode '{}'", environment);
            return false;
        }
        self.apply(environment);
        true
    }

    /// Spawn a task that feeds every value of `environment` into
    /// [`on_environment_change`](Self::on_environment_change). The task ends
    /// when the sender side is dropped.
    pub fn watch_environment(
        self: std::sync::Arc<Self>,
        mut environment: watch::Receiver<DisplayMode>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while environment.changed().await.is_ok() {
                let mode = *environment.borrow_and_update();
                self.on_environment_change(mode);
            }
        })
    }

    fn apply(&self, mode: DisplayMode) {
        let previous = self.mode.send_replace(mode);
        if previous != mode {
            debug!("Display mode changed: {} -> {}", previous, mode);
        }
    }
}

/// Stored mode, if any. Unreadable or unknown values count as absent.
fn read_stored(storage: &dyn PreferenceStorage) -> Option<DisplayMode> {
    match storage.get(DISPLAY_MODE_KEY) {
        Ok(Some(value)) => match value.parse() {
            Ok(mode) => Some(mode),
            Err(e) => {
                warn!("Ignoring stored display mode: {}", e);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!("Could not read stored display mode: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::{JsonFileStorage, MemoryStorage};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_stored_value_beats_environment() {
        let store = PreferenceStore::new(
            Box::new(MemoryStorage::with_value(DISPLAY_MODE_KEY, "light")),
            Some(DisplayMode::Dark),
        );
        assert!(store.is_light());
    }

    #[test]
    fn test_environment_used_without_stored_value() {
        let store = PreferenceStore::new(Box::new(MemoryStorage::new()), Some(DisplayMode::Dark));
        assert!(store.is_dark());
        assert!(!store.has_explicit_value());
    }

    #[test]
    fn test_fallback_is_light() {
        let store = PreferenceStore::new(Box::new(MemoryStorage::new()), None);
        assert_eq!(store.mode(), DisplayMode::Light);
    }

    #[test]
    fn test_invalid_stored_value_is_ignored() {
        let store = PreferenceStore::new(
            Box::new(MemoryStorage::with_value(DISPLAY_MODE_KEY, "sepia")),
            Some(DisplayMode::Dark),
        );
        assert!(store.is_dark());
    }

    #[test]
    fn test_toggle_applies_and_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");
        let store = PreferenceStore::new(Box::new(JsonFileStorage::new(&path)), None);
        let receiver = store.subscribe();

        assert_eq!(store.toggle().unwrap(), DisplayMode::Dark);

        assert_eq!(*receiver.borrow(), DisplayMode::Dark);
        assert_eq!(
            JsonFileStorage::new(&path).get(DISPLAY_MODE_KEY).unwrap().as_deref(),
            Some("dark")
        );

        let reopened = PreferenceStore::new(Box::new(JsonFileStorage::new(&path)), None);
        assert!(reopened.is_dark());
    }

    #[test]
    fn test_environment_followed_until_explicit_set() {
        let store = PreferenceStore::new(Box::new(MemoryStorage::new()), None);

        assert!(store.on_environment_change(DisplayMode::Dark));
        assert!(store.is_dark());

        store.set(DisplayMode::Light).unwrap();
        assert!(!store.on_environment_change(DisplayMode::Dark));
        assert!(store.is_light());
    }

    #[tokio::test]
    async fn test_watch_environment_applies_changes() {
        let store = Arc::new(PreferenceStore::new(Box::new(MemoryStorage::new()), None));
        let mut modes = store.subscribe();
        let (environment, receiver) = watch::channel(DisplayMode::Light);
        let handle = Arc::clone(&store).watch_environment(receiver);

        environment.send(DisplayMode::Dark).unwrap();
        tokio::time::timeout(Duration::from_secs(1), modes.changed())
            .await
            .unwrap()
            .unwrap();
        assert!(store.is_dark());

        drop(environment);
        handle.await.unwrap();
    }

    #[test]
    fn test_reset_resumes_following_environment() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");
        let store = PreferenceStore::new(Box::new(JsonFileStorage::new(&path)), None);
        store.set(DisplayMode::Dark).unwrap();
        assert!(!store.on_environment_change(DisplayMode::Light));

        assert_eq!(store.reset(None).unwrap(), DisplayMode::Light);

        assert!(!store.has_explicit_value());
        assert_eq!(JsonFileStorage::new(&path).get(DISPLAY_MODE_KEY).unwrap(), None);
        assert!(store.on_environment_change(DisplayMode::Dark));
        assert!(store.is_dark());
    }

    #[test]
    fn test_reset_applies_environment_mode() {
        let store = PreferenceStore::new(
            Box::new(MemoryStorage::with_value(DISPLAY_MODE_KEY, "light")),
            None,
        );

        assert_eq!(store.reset(Some(DisplayMode::Dark)).unwrap(), DisplayMode::Dark);
        assert!(store.is_dark());
    }
}

//! Module `registry`
//!
//! Provides a thread-safe registry of change watchers. Membership changes are
//! serialized behind a mutex; dispatch clones a snapshot of the live set under
//! that mutex and releases it before any watcher runs, so a slow or failing
//! watcher never blocks registration, removal, or delivery to the others.

use log::{debug, warn};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::event::FileSystemChangeEvent;

/// Error type watchers may return. It is logged and discarded by the registry.
pub type WatcherError = Box<dyn std::error::Error + Send + Sync>;

/// An observer of storage mutations.
pub trait FileSystemWatcher: Send + Sync {
    /// Called once per event while the watcher is registered.
    fn on_change(&self, event: &FileSystemChangeEvent) -> Result<(), WatcherError>;

    /// Called once when the watcher is removed from the registry.
    fn cleanup(&self) -> Result<(), WatcherError> {
        Ok(())
    }
}

type WatcherId = u64;

struct WatcherEntry {
    id: WatcherId,
    watcher: Arc<dyn FileSystemWatcher>,
}

#[derive(Default)]
struct RegistryState {
    next_id: WatcherId,
    entries: Vec<WatcherEntry>,
}

/// Shared set of watchers notified by storage operations.
///
/// Cloning yields another handle to the same live set.
#[derive(Clone, Default)]
pub struct WatcherRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl WatcherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a watcher. The returned registration removes it when released
    /// or dropped.
    pub fn add_watcher(&self, watcher: Arc<dyn FileSystemWatcher>) -> WatcherRegistration {
        let mut state = lock(&self.state);
        let id = state.next_id;
        state.next_id += 1;
        state.entries.push(WatcherEntry { id, watcher });
        debug!("Watcher {id} registered ({} live)", state.entries.len());

        WatcherRegistration {
            registry: Arc::downgrade(&self.state),
            id: Some(id),
        }
    }

    /// Remove a watcher by identity and run its cleanup hook.
    ///
    /// Returns `false` if the watcher was not registered.
    pub fn remove_watcher<W: FileSystemWatcher + ?Sized>(&self, watcher: &Arc<W>) -> bool {
        let target = Arc::as_ptr(watcher);
        remove_where(&self.state, |entry| {
            std::ptr::addr_eq(Arc::as_ptr(&entry.watcher), target)
        })
    }

    /// Deliver an event to every watcher in a point-in-time snapshot.
    ///
    /// Errors and panics raised by a watcher are logged and discarded.
    pub fn notify(&self, event: &FileSystemChangeEvent) {
        let snapshot: Vec<(WatcherId, Arc<dyn FileSystemWatcher>)> = {
            let state = lock(&self.state);
            state
                .entries
                .iter()
                .map(|entry| (entry.id, Arc::clone(&entry.watcher)))
                .collect()
        };

        for (id, watcher) in snapshot {
            match panic::catch_unwind(AssertUnwindSafe(|| watcher.on_change(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Watcher {id} failed on {event}: {e}"),
                Err(_) => warn!("Watcher {id} panicked on {event}"),
            }
        }
    }

    /// Number of live watchers
    pub fn len(&self) -> usize {
        lock(&self.state).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Removal capability returned by [`WatcherRegistry::add_watcher`].
///
/// Releasing it removes the watcher synchronously. Releasing again, or after
/// the registry itself is gone, does nothing.
#[must_use = "dropping the registration removes the watcher immediately"]
pub struct WatcherRegistration {
    registry: Weak<Mutex<RegistryState>>,
    id: Option<WatcherId>,
}

impl WatcherRegistration {
    /// Remove the watcher now.
    pub fn release(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        if let Some(state) = self.registry.upgrade() {
            remove_where(&state, |entry| entry.id == id);
        }
    }

    /// Give up the capability, leaving the watcher registered until it is
    /// removed through [`WatcherRegistry::remove_watcher`].
    pub fn keep(mut self) {
        self.id = None;
    }

    pub fn is_active(&self) -> bool {
        self.id.is_some()
    }
}

impl Drop for WatcherRegistration {
    fn drop(&mut self) {
        self.release();
    }
}

fn lock(state: &Mutex<RegistryState>) -> MutexGuard<'_, RegistryState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Remove the first matching entry, then run its cleanup hook outside the lock.
fn remove_where(
    state: &Mutex<RegistryState>,
    predicate: impl Fn(&WatcherEntry) -> bool,
) -> bool {
    let removed = {
        let mut state = lock(state);
        let index = state.entries.iter().position(predicate);
        index.map(|index| state.entries.remove(index))
    };

    let Some(entry) = removed else {
        return false;
    };
    debug!("Watcher {} removed", entry.id);

    match panic::catch_unwind(AssertUnwindSafe(|| entry.watcher.cleanup())) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Cleanup of watcher {} failed: {e}", entry.id),
        Err(_) => warn!("Cleanup of watcher {} panicked", entry.id),
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::thread;

    #[derive(Default)]
    struct RecordingWatcher {
        events: Mutex<Vec<FileSystemChangeEvent>>,
        cleanups: AtomicUsize,
    }

    impl RecordingWatcher {
        fn events(&self) -> Vec<FileSystemChangeEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl FileSystemWatcher for RecordingWatcher {
        fn on_change(&self, event: &FileSystemChangeEvent) -> Result<(), WatcherError> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }

        fn cleanup(&self) -> Result<(), WatcherError> {
            self.cleanups.fetch_add(1, Ordering::SeqCst);
            Err("cleanup always fails".into())
        }
    }

    struct FailingWatcher;

    impl FileSystemWatcher for FailingWatcher {
        fn on_change(&self, _event: &FileSystemChangeEvent) -> Result<(), WatcherError> {
            Err("nope".into())
        }
    }

    struct PanickingWatcher;

    impl FileSystemWatcher for PanickingWatcher {
        fn on_change(&self, _event: &FileSystemChangeEvent) -> Result<(), WatcherError> {
            panic!("watcher exploded");
        }
    }

    fn event() -> FileSystemChangeEvent {
        FileSystemChangeEvent::file_added("x.txt")
    }

    #[test]
    fn test_notify_reaches_all_watchers() {
        let registry = WatcherRegistry::new();
        let a = Arc::new(RecordingWatcher::default());
        let b = Arc::new(RecordingWatcher::default());
        let _ra = registry.add_watcher(a.clone());
        let _rb = registry.add_watcher(b.clone());

        registry.notify(&event());

        assert_eq!(a.events(), vec![event()]);
        assert_eq!(b.events(), vec![event()]);
    }

    #[test]
    fn test_failures_do_not_stop_delivery() {
        let registry = WatcherRegistry::new();
        let _r1 = registry.add_watcher(Arc::new(FailingWatcher));
        let _r2 = registry.add_watcher(Arc::new(PanickingWatcher));
        let recorder = Arc::new(RecordingWatcher::default());
        let _r3 = registry.add_watcher(recorder.clone());

        registry.notify(&event());
        registry.notify(&event());

        assert_eq!(recorder.events().len(), 2);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_remove_watcher_runs_cleanup_and_swallows_error() {
        let registry = WatcherRegistry::new();
        let recorder = Arc::new(RecordingWatcher::default());
        let registration = registry.add_watcher(recorder.clone());
        registration.keep();

        assert!(registry.remove_watcher(&recorder));
        assert_eq!(recorder.cleanups.load(Ordering::SeqCst), 1);
        assert!(!registry.remove_watcher(&recorder));
        assert!(registry.is_empty());

        registry.notify(&event());
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn test_release_is_idempotent() {
        let registry = WatcherRegistry::new();
        let recorder = Arc::new(RecordingWatcher::default());
        let mut registration = registry.add_watcher(recorder.clone());
        assert!(registration.is_active());

        registration.release();
        registration.release();
        drop(registration);

        assert!(registry.is_empty());
        assert_eq!(recorder.cleanups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_removes_watcher() {
        let registry = WatcherRegistry::new();
        let recorder = Arc::new(RecordingWatcher::default());
        {
            let _registration = registry.add_watcher(recorder.clone());
            assert_eq!(registry.len(), 1);
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_release_after_registry_dropped() {
        let registry = WatcherRegistry::new();
        let mut registration = registry.add_watcher(Arc::new(FailingWatcher));
        drop(registry);
        registration.release();
        assert!(!registration.is_active());
    }

    #[test]
    fn test_same_watcher_registered_twice_is_delivered_twice() {
        let registry = WatcherRegistry::new();
        let recorder = Arc::new(RecordingWatcher::default());
        let _r1 = registry.add_watcher(recorder.clone());
        let _r2 = registry.add_watcher(recorder.clone());

        registry.notify(&event());
        assert_eq!(recorder.events().len(), 2);
    }

    struct RegisteringWatcher {
        registry: WatcherRegistry,
        late: Arc<RecordingWatcher>,
        registrations: Mutex<Vec<WatcherRegistration>>,
    }

    impl FileSystemWatcher for RegisteringWatcher {
        fn on_change(&self, _event: &FileSystemChangeEvent) -> Result<(), WatcherError> {
            let registration = self.registry.add_watcher(self.late.clone());
            self.registrations.lock().unwrap().push(registration);
            Ok(())
        }
    }

    #[test]
    fn test_watcher_added_mid_dispatch_sees_later_events() {
        let registry = WatcherRegistry::new();
        let late = Arc::new(RecordingWatcher::default());
        let registering = Arc::new(RegisteringWatcher {
            registry: registry.clone(),
            late: late.clone(),
            registrations: Mutex::new(Vec::new()),
        });
        let mut registration = registry.add_watcher(registering.clone());

        registry.notify(&event());
        registration.release();
        assert!(late.events().is_empty());

        registry.notify(&FileSystemChangeEvent::file_deleted("x.txt"));
        assert_eq!(
            late.events(),
            vec![FileSystemChangeEvent::file_deleted("x.txt")]
        );
    }

    struct BlockingWatcher {
        entered: mpsc::SyncSender<()>,
        proceed: Mutex<mpsc::Receiver<()>>,
    }

    impl FileSystemWatcher for BlockingWatcher {
        fn on_change(&self, _event: &FileSystemChangeEvent) -> Result<(), WatcherError> {
            self.entered.send(()).unwrap();
            self.proceed.lock().unwrap().recv().unwrap();
            Ok(())
        }
    }

    #[test]
    fn test_slow_watcher_does_not_block_membership_changes() {
        let registry = WatcherRegistry::new();
        let (entered_tx, entered_rx) = mpsc::sync_channel(1);
        let (proceed_tx, proceed_rx) = mpsc::channel();
        let _blocking = registry.add_watcher(Arc::new(BlockingWatcher {
            entered: entered_tx,
            proceed: Mutex::new(proceed_rx),
        }));

        let dispatcher = {
            let registry = registry.clone();
            thread::spawn(move || registry.notify(&event()))
        };

        entered_rx.recv().unwrap();

        // Dispatch is parked inside the watcher; the lock must be free.
        let recorder = Arc::new(RecordingWatcher::default());
        let mut registration = registry.add_watcher(recorder.clone());
        assert_eq!(registry.len(), 2);
        registration.release();
        assert_eq!(registry.len(), 1);

        proceed_tx.send(()).unwrap();
        dispatcher.join().unwrap();
        assert!(recorder.events().is_empty());
    }
}

//! Ordered listener collections with crash-isolated fan-out.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(Uuid);

impl ListenerId {
    /// Create a new unique listener ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registration token returned when a listener is added.
///
/// The handle can be cloned into the listener itself, or into another
/// listener, and used to unregister while a dispatch is running.
#[derive(Debug, Clone)]
pub struct ListenerHandle {
    id: ListenerId,
    active: Arc<AtomicBool>,
}

impl ListenerHandle {
    fn new() -> Self {
        Self {
            id: ListenerId::new(),
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    /// A handle that was never registered anywhere.
    pub(crate) fn inert() -> Self {
        Self {
            id: ListenerId::new(),
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Identifier of the registration.
    #[must_use]
    pub const fn id(&self) -> ListenerId {
        self.id
    }

    /// Whether the listener is still registered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Unregister. Returns `false` if it was already removed.
    pub fn remove(&self) -> bool {
        self.active.swap(false, Ordering::AcqRel)
    }
}

struct Entry<F: ?Sized> {
    handle: ListenerHandle,
    callback: Arc<F>,
}

/// Listeners notified in registration order.
pub struct ListenerList<F: ?Sized> {
    entries: Vec<Entry<F>>,
}

impl<F: ?Sized> ListenerList<F> {
    /// Create an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a listener.
    pub fn add(&mut self, callback: Arc<F>) -> ListenerHandle {
        let handle = ListenerHandle::new();
        self.entries.push(Entry {
            handle: handle.clone(),
            callback,
        });
        handle
    }

    /// Remove a listener. Returns `false` if it was not registered here.
    pub fn remove(&mut self, handle: &ListenerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| {
            if e.handle.id == handle.id {
                e.handle.remove();
                false
            } else {
                true
            }
        });
        let removed = before != self.entries.len();
        if removed {
            tracing::trace!(listener = %handle.id, "Listener removed");
        }
        removed
    }

    /// Number of active listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.handle.is_active()).count()
    }

    /// Whether no active listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every listener.
    pub fn clear(&mut self) {
        for entry in &self.entries {
            entry.handle.remove();
        }
        self.entries.clear();
    }

    /// Invoke every active listener in registration order.
    ///
    /// The set is snapshotted first, so listeners added during the dispatch
    /// wait for the next event. A listener removed during the dispatch is
    /// skipped if it has not run yet. A panicking listener is logged and
    /// the remaining listeners still run. Returns how many listeners ran to
    /// completion.
    pub fn dispatch(&mut self, event: &str, mut invoke: impl FnMut(&F)) -> usize {
        self.prune();
        let snapshot: Vec<(ListenerHandle, Arc<F>)> = self
            .entries
            .iter()
            .map(|e| (e.handle.clone(), Arc::clone(&e.callback)))
            .collect();

        let mut delivered = 0;
        for (handle, callback) in snapshot {
            if !handle.is_active() {
                continue;
            }
            if invoke_isolated(event, || invoke(&callback)) {
                delivered += 1;
            }
        }
        self.prune();
        delivered
    }

    fn prune(&mut self) {
        self.entries.retain(|e| e.handle.is_active());
    }
}

impl<F: ?Sized> Default for ListenerList<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> fmt::Debug for ListenerList<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerList")
            .field("len", &self.len())
            .finish()
    }
}

/// Run a callback, containing any panic.
///
/// Returns `false` if the callback panicked.
pub fn invoke_isolated(event: &str, callback: impl FnOnce()) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(callback)) {
        Ok(()) => true,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!("Listener for {event} panicked: {reason}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    type Callback = dyn Fn(&Mutex<Vec<&'static str>>) + Send + Sync;

    #[test]
    fn test_dispatch_in_registration_order() {
        let log = Mutex::new(Vec::new());
        let mut list: ListenerList<Callback> = ListenerList::new();
        list.add(Arc::new(|log: &Mutex<Vec<_>>| log.lock().expect("lock").push("a")));
        list.add(Arc::new(|log: &Mutex<Vec<_>>| log.lock().expect("lock").push("b")));

        let delivered = list.dispatch("test", |f| f(&log));
        assert_eq!(delivered, 2);
        assert_eq!(*log.lock().expect("lock"), vec!["a", "b"]);
    }

    #[test]
    fn test_panicking_listener_does_not_block_others() {
        let log = Mutex::new(Vec::new());
        let mut list: ListenerList<Callback> = ListenerList::new();
        list.add(Arc::new(|_: &Mutex<Vec<_>>| panic!("listener failure")));
        list.add(Arc::new(|log: &Mutex<Vec<_>>| log.lock().expect("lock").push("survivor")));

        let delivered = list.dispatch("test", |f| f(&log));
        assert_eq!(delivered, 1);
        assert_eq!(*log.lock().expect("lock"), vec!["survivor"]);
    }

    #[test]
    fn test_removal_during_dispatch_skips_pending_listener() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut list: ListenerList<dyn Fn() + Send + Sync> = ListenerList::new();

        let victim_slot: Arc<Mutex<Option<ListenerHandle>>> = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&victim_slot);
        let first_log = Arc::clone(&log);
        list.add(Arc::new(move || {
            first_log.lock().expect("lock").push("remover");
            if let Some(handle) = slot.lock().expect("lock").as_ref() {
                handle.remove();
            }
        }));
        let victim_log = Arc::clone(&log);
        let victim = list.add(Arc::new(move || victim_log.lock().expect("lock").push("victim")));
        let tail_log = Arc::clone(&log);
        list.add(Arc::new(move || tail_log.lock().expect("lock").push("tail")));
        *victim_slot.lock().expect("lock") = Some(victim.clone());

        list.dispatch("test", |f| f());
        assert_eq!(*log.lock().expect("lock"), vec!["remover", "tail"]);
        assert!(!victim.is_active());
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_remove_unknown_handle() {
        let mut a: ListenerList<dyn Fn() + Send + Sync> = ListenerList::new();
        let mut b: ListenerList<dyn Fn() + Send + Sync> = ListenerList::new();
        let handle = a.add(Arc::new(|| {}));
        assert!(!b.remove(&handle));
        assert!(a.remove(&handle));
        assert!(a.is_empty());
    }

    #[test]
    fn test_listener_id_displays_as_uuid() {
        let id = ListenerId::new();
        let text = id.to_string();
        assert_eq!(Uuid::parse_str(&text).expect("uuid"), id.0);
        assert_ne!(text, ListenerId::new().to_string());
    }
}

// ── UI event manager ──
//
// A single-slot, acknowledge-to-clear channel for one-shot view effects
// (toasts, closing a dialog). The newest event replaces any unacknowledged
// one; acknowledging a superseded event is a no-op.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use crate::stream::Subscription;

/// Identity of an emitted event, unique and increasing per manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct UiEvent<E> {
    pub id: EventId,
    pub payload: E,
}

/// Subscription to a manager's event slot. New subscribers see the
/// pending event, if any, immediately.
pub type EventStream<E> = Subscription<Option<Arc<UiEvent<E>>>>;

pub struct UiEventManager<E> {
    next_id: AtomicU64,
    slot: watch::Sender<Option<Arc<UiEvent<E>>>>,
}

impl<E: Send + Sync + 'static> UiEventManager<E> {
    pub fn new() -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            next_id: AtomicU64::new(1),
            slot,
        }
    }

    /// Replace the pending event with `payload`.
    pub fn emit_event(&self, payload: E) -> EventId {
        let id = EventId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.slot.send_replace(Some(Arc::new(UiEvent { id, payload })));
        id
    }

    pub fn event(&self) -> EventStream<E> {
        Subscription::new(self.slot.subscribe())
    }

    pub fn current(&self) -> Option<Arc<UiEvent<E>>> {
        self.slot.borrow().clone()
    }

    /// Acknowledge event `id`. Returns `false` when `id` is no longer the
    /// pending event.
    pub fn clear_event(&self, id: EventId) -> bool {
        self.slot.send_if_modified(|slot| {
            if slot.as_ref().is_some_and(|event| event.id == id) {
                *slot = None;
                true
            } else {
                false
            }
        })
    }
}

impl<E: Send + Sync + 'static> Default for UiEventManager<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ids_increase() {
        let events = UiEventManager::new();
        let first = events.emit_event("a");
        let second = events.emit_event("b");
        assert!(second > first);
    }

    #[test]
    fn last_write_wins_and_stale_clear_is_noop() {
        let events = UiEventManager::new();
        let e1 = events.emit_event("saved");
        let e2 = events.emit_event("deleted");

        assert!(!events.clear_event(e1));
        let pending = events.current().unwrap();
        assert_eq!(pending.id, e2);
        assert_eq!(pending.payload, "deleted");

        assert!(events.clear_event(e2));
        assert!(events.current().is_none());
        assert!(!events.clear_event(e2));
    }

    #[tokio::test]
    async fn subscriber_sees_pending_event_then_clear() {
        let events = UiEventManager::new();
        let id = events.emit_event(7_u32);

        let mut stream = events.event();
        assert_eq!(stream.current().as_ref().map(|e| e.id), Some(id));

        events.clear_event(id);
        assert_eq!(stream.changed().await, Some(None));
    }
}

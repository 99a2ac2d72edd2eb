// ── List-screen view-model ──
//
// Everything one entity table needs: a pager bound to the current filter,
// row selection, the open dialog, busy flags and one-shot events. Views
// observe the watch-backed pieces and call the operations below.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use tokio::sync::watch;

use crate::error::{CoreError, ErrorKind};
use crate::event::{EventId, EventStream, UiEventManager};
use crate::loading::{ObservableLoadingCounter, with_loader};
use crate::model::{Entity, EntityId, FilterOf};
use crate::paging::{Pager, PagerConfig, PagingStream};
use crate::repository::Repository;
use crate::stream::Subscription;

/// One-shot outcomes a list view reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    Saved,
    Deleted { count: usize },
    Message(String),
}

/// Dialog shown over a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableDialog<E> {
    /// Create (`None`) or edit (`Some`) a record.
    Manage(Option<E>),
    ConfirmDeletion { count: usize },
}

pub struct TableViewModel<E: Entity> {
    repository: Arc<Repository<E>>,
    config: PagerConfig,
    filter: Mutex<FilterOf<E>>,
    pager: ArcSwap<Pager<E>>,
    selection: watch::Sender<BTreeSet<EntityId>>,
    loading: ObservableLoadingCounter,
    deleting: ObservableLoadingCounter,
    events: UiEventManager<TableEvent>,
    dialog: watch::Sender<Option<TableDialog<E>>>,
}

impl<E: Entity> TableViewModel<E> {
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn new(repository: Arc<Repository<E>>, config: PagerConfig) -> Self {
        let filter = <FilterOf<E> as Default>::default();
        let pager = repository.pager(config, filter.clone());
        let (selection, _) = watch::channel(BTreeSet::new());
        let (dialog, _) = watch::channel(None);

        Self {
            repository,
            config,
            filter: Mutex::new(filter),
            pager: ArcSwap::from_pointee(pager),
            selection,
            loading: ObservableLoadingCounter::new(),
            deleting: ObservableLoadingCounter::new(),
            events: UiEventManager::new(),
            dialog,
        }
    }

    // ── Paging ───────────────────────────────────────────────────────

    pub fn pager(&self) -> Arc<Pager<E>> {
        self.pager.load_full()
    }

    pub fn observe(&self) -> PagingStream<E> {
        self.pager().observe()
    }

    pub fn filter(&self) -> FilterOf<E> {
        self.filter.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Rebuild the pager for `filter`. The previous pager is dropped once
    /// no observer holds it, cancelling its fetches.
    pub fn set_filter(&self, filter: FilterOf<E>) {
        let pager = self.repository.pager(self.config, filter.clone());
        *self.filter.lock().unwrap_or_else(PoisonError::into_inner) = filter;
        self.pager.store(Arc::new(pager));
        self.clear_selection();
    }

    pub fn refresh(&self) {
        self.pager().refresh();
        self.clear_selection();
    }

    /// Report a failed page load to the view. Invalidation is internal
    /// and produces no message.
    pub fn handle_paging_error(&self, kind: ErrorKind) -> Option<EventId> {
        if kind == ErrorKind::SourceInvalidated {
            return None;
        }
        Some(self.events.emit_event(TableEvent::Message(kind.user_message().to_owned())))
    }

    // ── Selection ────────────────────────────────────────────────────

    pub fn set_row_selection(&self, id: EntityId, selected: bool) {
        self.selection.send_if_modified(|rows| {
            if selected {
                rows.insert(id)
            } else {
                rows.remove(&id)
            }
        });
    }

    pub fn selection(&self) -> BTreeSet<EntityId> {
        self.selection.borrow().clone()
    }

    pub fn observe_selection(&self) -> Subscription<BTreeSet<EntityId>> {
        Subscription::new(self.selection.subscribe())
    }

    pub fn clear_selection(&self) {
        self.selection.send_if_modified(|rows| {
            let changed = !rows.is_empty();
            rows.clear();
            changed
        });
    }

    // ── Dialogs ──────────────────────────────────────────────────────

    pub fn dialog(&self) -> Option<TableDialog<E>> {
        self.dialog.borrow().clone()
    }

    pub fn observe_dialog(&self) -> Subscription<Option<TableDialog<E>>> {
        Subscription::new(self.dialog.subscribe())
    }

    pub fn open_dialog(&self, dialog: TableDialog<E>) {
        self.dialog.send_replace(Some(dialog));
    }

    pub fn close_dialog(&self) {
        self.dialog.send_if_modified(|slot| slot.take().is_some());
    }

    // ── Busy flags and events ────────────────────────────────────────

    /// Busy while a save is running.
    pub fn loading(&self) -> &ObservableLoadingCounter {
        &self.loading
    }

    /// Busy while a delete is running.
    pub fn deleting(&self) -> &ObservableLoadingCounter {
        &self.deleting
    }

    pub fn events(&self) -> EventStream<TableEvent> {
        self.events.event()
    }

    pub fn clear_event(&self, id: EventId) -> bool {
        self.events.clear_event(id)
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Save `entity`. On success the dialog closes and the list reloads;
    /// on failure a message is emitted and the dialog stays open.
    pub async fn save(&self, entity: &E) -> Result<(), CoreError> {
        let result = with_loader(&self.loading, self.repository.save(entity)).await;
        self.finish_save(result)
    }

    /// Save several records under one busy flag. Success closes the dialog
    /// and emits a single [`TableEvent::Saved`].
    pub async fn save_all(&self, entities: &[E]) -> Result<(), CoreError> {
        let result = with_loader(&self.loading, self.repository.save_all(entities)).await;
        self.finish_save(result)
    }

    fn finish_save(&self, result: Result<(), CoreError>) -> Result<(), CoreError> {
        match &result {
            Ok(()) => {
                self.close_dialog();
                self.events.emit_event(TableEvent::Saved);
            }
            Err(e) => {
                self.events.emit_event(TableEvent::Message(e.user_message()));
            }
        }
        result
    }

    /// Delete every selected row. Returns how many were deleted; an empty
    /// selection is a no-op.
    pub async fn delete_selected(&self) -> Result<usize, CoreError> {
        let ids: Vec<EntityId> = self.selection().into_iter().collect();
        if ids.is_empty() {
            return Ok(0);
        }

        let result = with_loader(&self.deleting, self.repository.delete(&ids)).await;
        match result {
            Ok(()) => {
                let count = ids.len();
                self.clear_selection();
                self.close_dialog();
                self.events.emit_event(TableEvent::Deleted { count });
                Ok(count)
            }
            Err(e) => {
                self.events.emit_event(TableEvent::Message(e.user_message()));
                Err(e)
            }
        }
    }
}

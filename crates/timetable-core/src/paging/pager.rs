// ── Pager ──
//
// Orchestrates paging sources and owns the published snapshot.
//
// State lives behind a short std mutex that is never held across an
// await, while a user fetcher runs, or while invalidation callbacks run.
// Each direction (refresh, append) has one in-flight slot guarded by a
// generation counter; a result is applied only if its slot generation
// and source id are still current, otherwise it is dropped. The two slots
// run independently: an append may start while a refresh is pending, and
// a landed refresh supersedes it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use indexmap::IndexMap;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::ErrorKind;

use super::{
    Cursor, Identified, LoadState, LoadStatus, Page, PageFetcher, PageRequest, PageResult,
    PagerConfig, PagingSnapshot, PagingSource, PagingState, PagingStream, RefreshPolicy, SourceId,
};

type SourceFactory<T> = Box<dyn Fn() -> Arc<PagingSource<T>> + Send + Sync>;

/// Paginated view over a sequence of paging sources.
///
/// Created per list. Loading starts on the first [`observe`](Self::observe)
/// or [`request_item`](Self::request_item). Dropping the pager cancels its
/// in-flight fetches.
pub struct Pager<T: Identified + Send + Sync + 'static> {
    shared: Arc<Shared<T>>,
}

struct Shared<T: Identified> {
    config: PagerConfig,
    factory: SourceFactory<T>,
    machine: Mutex<Machine<T>>,
    state_tx: watch::Sender<PagingState<T>>,
    runtime: Handle,
    cancel: CancellationToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshReason {
    Initial,
    Explicit,
    Retry,
    Invalidated(SourceId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Refresh,
    Append,
}

/// A fetch decided under the lock, launched after it is released.
struct Launch<T> {
    source: Arc<PagingSource<T>>,
    request: PageRequest,
    direction: Direction,
    generation: u64,
}

struct Machine<T: Identified> {
    started: bool,
    source: Option<Arc<PagingSource<T>>>,

    refresh_generation: u64,
    append_generation: u64,
    refresh_in_flight: bool,
    append_in_flight: bool,

    items: IndexMap<T::Key, Arc<T>>,
    /// Published copy of `items`, rebuilt only when they change.
    published: Arc<[Arc<T>]>,
    /// Request cursor of the last accepted page.
    tail_start: Cursor,
    next_cursor: Option<Cursor>,
    end_reached: bool,

    load_state: LoadState,
}

impl<T: Identified + Send + Sync + 'static> Pager<T> {
    /// Build a pager that asks `factory` for a fresh source on every
    /// refresh and invalidation.
    ///
    /// The factory runs while the pager's state is locked and must not
    /// call back into this pager.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn new<F>(config: PagerConfig, factory: F) -> Self
    where
        F: Fn() -> Arc<PagingSource<T>> + Send + Sync + 'static,
    {
        let (state_tx, _) = watch::channel(PagingState::default());
        Self {
            shared: Arc::new(Shared {
                config,
                factory: Box::new(factory),
                machine: Mutex::new(Machine::new()),
                state_tx,
                runtime: Handle::current(),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Build a pager from a fetcher factory; each refresh wraps a new
    /// fetcher in a new source.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn from_fetcher<F, P>(config: PagerConfig, fetcher_factory: F) -> Self
    where
        F: Fn() -> P + Send + Sync + 'static,
        P: PageFetcher<T>,
    {
        Self::new(config, move || Arc::new(PagingSource::new(fetcher_factory())))
    }

    pub fn config(&self) -> &PagerConfig {
        &self.shared.config
    }

    /// Subscribe to `(snapshot, load state)` pairs, starting the initial
    /// load if nothing has started it yet.
    pub fn observe(&self) -> PagingStream<T> {
        self.shared.begin_refresh(RefreshReason::Initial);
        PagingStream::new(self.shared.state_tx.subscribe())
    }

    /// Latest published state.
    pub fn state(&self) -> PagingState<T> {
        self.shared.state_tx.borrow().clone()
    }

    /// The source currently feeding this pager, if loading has started.
    pub fn source(&self) -> Option<Arc<PagingSource<T>>> {
        self.shared.lock().source.clone()
    }

    /// Item at `index`, if loaded.
    ///
    /// Starts loading if nothing has yet, and fetches the next page when
    /// `index` comes within `prefetch_distance` of the loaded end. A failed
    /// append is re-issued by this call.
    pub fn request_item(&self, index: usize) -> Option<Arc<T>> {
        self.shared.begin_refresh(RefreshReason::Initial);

        let (item, launch) = {
            let mut machine = self.shared.lock();
            let item = machine.items.get_index(index).map(|(_, item)| Arc::clone(item));
            let launch = if machine.wants_append(index, self.shared.config.prefetch_distance) {
                machine.start_append(self.shared.config.page_size)
            } else {
                None
            };
            if launch.is_some() {
                self.shared.publish(&machine);
            }
            (item, launch)
        };

        if let Some(launch) = launch {
            self.shared.spawn(launch);
        }
        item
    }

    /// Reload from the first page with a fresh source.
    ///
    /// The current snapshot stays visible until the new page lands.
    pub fn refresh(&self) {
        self.shared.begin_refresh(RefreshReason::Explicit);
    }

    /// Re-issue whichever direction is in an error state. Does nothing
    /// when neither is.
    pub fn retry(&self) {
        let launch = {
            let mut machine = self.shared.lock();
            if machine.load_state.refresh.error().is_some() {
                None
            } else if machine.load_state.append.error().is_some() {
                let Some(launch) = machine.start_append(self.shared.config.page_size) else {
                    return;
                };
                self.shared.publish(&machine);
                Some(launch)
            } else {
                return;
            }
        };

        match launch {
            Some(launch) => self.shared.spawn(launch),
            None => self.shared.begin_refresh(RefreshReason::Retry),
        }
    }
}

impl<T: Identified + Send + Sync + 'static> Drop for Pager<T> {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
    }
}

impl<T: Identified + Send + Sync + 'static> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, Machine<T>> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, machine: &Machine<T>) {
        self.state_tx.send_replace(machine.state());
    }

    /// Start a refresh. Explicit refreshes and invalidations swap in a new
    /// source; a retry reuses the current one.
    fn begin_refresh(self: &Arc<Self>, reason: RefreshReason) {
        let (launch, fresh, retired) = {
            let mut machine = self.lock();
            let current = machine.source.as_ref().map(|source| source.id());

            match reason {
                RefreshReason::Initial if machine.started => return,
                RefreshReason::Invalidated(id) if current != Some(id) => {
                    debug!(source = %id, "ignoring invalidation of a retired source");
                    return;
                }
                _ => {}
            }
            machine.started = true;

            let (source, retired) = match (reason, machine.source.clone()) {
                (RefreshReason::Retry, Some(source)) if !source.is_invalidated() => (source, None),
                _ => {
                    let source = (self.factory)();
                    let retired = machine.source.replace(Arc::clone(&source));
                    (source, retired)
                }
            };
            let fresh = retired.is_some() || current.is_none();

            let reset = matches!(reason, RefreshReason::Invalidated(_))
                && self.config.refresh_policy == RefreshPolicy::ResetThenLoad;
            if reset {
                machine.clear();
            }

            let launch = machine.start_refresh(source, self.config.page_size, fresh);
            self.publish(&machine);
            (launch, fresh, retired)
        };

        if fresh {
            self.watch_source(&launch.source);
        }
        if let Some(retired) = retired {
            retired.invalidate();
        }
        self.spawn(launch);
    }

    fn watch_source(self: &Arc<Self>, source: &Arc<PagingSource<T>>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let id = source.id();
        source.on_invalidated(move || {
            if let Some(shared) = weak.upgrade() {
                shared.begin_refresh(RefreshReason::Invalidated(id));
            }
        });
    }

    fn spawn(self: &Arc<Self>, launch: Launch<T>) {
        let Launch {
            source,
            request,
            direction,
            generation,
        } = launch;
        let source_id = source.id();
        debug!(source = %source_id, ?direction, cursor = ?request.cursor, "loading page");

        let fetch = source.fetch(request);
        let weak = Arc::downgrade(self);
        let cancel = self.cancel.clone();

        self.runtime.spawn(async move {
            let result = tokio::select! {
                () = cancel.cancelled() => return,
                result = fetch => result,
            };
            if let Some(shared) = weak.upgrade() {
                match direction {
                    Direction::Refresh => shared.finish_refresh(source_id, generation, result),
                    Direction::Append => {
                        shared.finish_append(source_id, generation, request, result);
                    }
                }
            }
        });
    }

    fn finish_refresh(&self, source_id: SourceId, generation: u64, result: PageResult<T>) {
        let mut machine = self.lock();
        if !machine.is_current(source_id, generation, machine.refresh_generation) {
            debug!(source = %source_id, "discarding superseded refresh");
            return;
        }

        match result {
            Ok(page) => {
                debug!(source = %source_id, items = page.items.len(), "refresh landed");
                machine.replace_with(page);
            }
            // The invalidation callback is about to start a new refresh.
            Err(ErrorKind::SourceInvalidated) if machine.source_invalidated() => return,
            Err(kind) => {
                warn!(source = %source_id, error = %kind, "refresh failed");
                machine.refresh_in_flight = false;
                machine.load_state.refresh = LoadStatus::Error(kind);
            }
        }
        self.publish(&machine);
    }

    fn finish_append(
        &self,
        source_id: SourceId,
        generation: u64,
        request: PageRequest,
        result: PageResult<T>,
    ) {
        let mut machine = self.lock();
        if !machine.is_current(source_id, generation, machine.append_generation) {
            debug!(source = %source_id, cursor = ?request.cursor, "discarding superseded append");
            return;
        }
        machine.append_in_flight = false;

        match result {
            Ok(page) => {
                if machine.accepts(request, &page) {
                    debug!(source = %source_id, cursor = ?request.cursor, items = page.items.len(), "append landed");
                    machine.extend_with(request, page);
                } else {
                    warn!(
                        source = %source_id,
                        cursor = ?request.cursor,
                        prev = ?page.prev_cursor,
                        tail = machine.tail_start,
                        "rejecting out-of-order page"
                    );
                    machine.load_state.append = LoadStatus::Idle;
                }
            }
            Err(ErrorKind::SourceInvalidated) if machine.source_invalidated() => {
                machine.load_state.append = LoadStatus::Idle;
            }
            Err(kind) => {
                warn!(source = %source_id, cursor = ?request.cursor, error = %kind, "append failed");
                machine.load_state.append = LoadStatus::Error(kind);
            }
        }
        self.publish(&machine);
    }
}

impl<T: Identified> Machine<T> {
    fn new() -> Self {
        Self {
            started: false,
            source: None,
            refresh_generation: 0,
            append_generation: 0,
            refresh_in_flight: false,
            append_in_flight: false,
            items: IndexMap::new(),
            published: Arc::from(Vec::new()),
            tail_start: 0,
            next_cursor: None,
            end_reached: false,
            load_state: LoadState::default(),
        }
    }

    fn state(&self) -> PagingState<T> {
        PagingState {
            snapshot: PagingSnapshot::new(Arc::clone(&self.published), self.end_reached),
            load_state: self.load_state,
        }
    }

    fn is_current(&self, source_id: SourceId, generation: u64, slot_generation: u64) -> bool {
        generation == slot_generation && self.source.as_ref().map(|s| s.id()) == Some(source_id)
    }

    fn source_invalidated(&self) -> bool {
        self.source.as_ref().is_some_and(|source| source.is_invalidated())
    }

    fn clear(&mut self) {
        self.items.clear();
        self.republish_items();
        self.tail_start = 0;
        self.next_cursor = None;
        self.end_reached = false;
    }

    fn republish_items(&mut self) {
        self.published = self.items.values().cloned().collect();
    }

    /// Claim the refresh slot. An in-flight append is dropped only when
    /// the source changes; otherwise it lives until the refresh lands.
    fn start_refresh(
        &mut self,
        source: Arc<PagingSource<T>>,
        page_size: usize,
        source_changed: bool,
    ) -> Launch<T> {
        self.refresh_generation += 1;
        self.refresh_in_flight = true;
        self.load_state.refresh = LoadStatus::Loading;

        if source_changed {
            self.append_generation += 1;
            self.append_in_flight = false;
            self.load_state.append = LoadStatus::Idle;
        }

        Launch {
            source,
            request: PageRequest::initial(page_size),
            direction: Direction::Refresh,
            generation: self.refresh_generation,
        }
    }

    fn wants_append(&self, index: usize, prefetch_distance: usize) -> bool {
        self.started
            && !self.append_in_flight
            && !self.end_reached
            && self.next_cursor.is_some()
            && index.saturating_add(prefetch_distance) >= self.items.len()
    }

    fn start_append(&mut self, page_size: usize) -> Option<Launch<T>> {
        let cursor = self.next_cursor?;
        let source = self.source.clone()?;

        self.append_generation += 1;
        self.append_in_flight = true;
        self.load_state.append = LoadStatus::Loading;

        Some(Launch {
            source,
            request: PageRequest::after(cursor, page_size),
            direction: Direction::Append,
            generation: self.append_generation,
        })
    }

    /// A page may extend the snapshot only if it was requested at the
    /// current end and, when it names a predecessor, that predecessor is
    /// the current tail page.
    fn accepts(&self, request: PageRequest, page: &Page<T>) -> bool {
        request.cursor.is_some()
            && request.cursor == self.next_cursor
            && page.prev_cursor.is_none_or(|prev| prev == self.tail_start)
    }

    fn replace_with(&mut self, page: Page<T>) {
        self.items.clear();
        self.insert_all(page.items);
        self.republish_items();

        self.tail_start = 0;
        self.next_cursor = page.next_cursor;
        self.end_reached = page.next_cursor.is_none();

        self.refresh_in_flight = false;
        self.append_in_flight = false;
        self.append_generation += 1;
        self.load_state = LoadState::default();
    }

    fn extend_with(&mut self, request: PageRequest, page: Page<T>) {
        self.insert_all(page.items);
        self.republish_items();

        self.tail_start = request.offset();
        self.next_cursor = page.next_cursor;
        self.end_reached = page.next_cursor.is_none();
        self.load_state.append = LoadStatus::Idle;
    }

    /// First occurrence of an identity wins.
    fn insert_all(&mut self, items: Vec<T>) {
        for item in items {
            self.items.entry(item.identity()).or_insert_with(|| Arc::new(item));
        }
    }
}

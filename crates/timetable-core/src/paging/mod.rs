// ── Paging engine ──
//
// Generic cursor-based pagination over any async page fetcher.
//
//   PageFetcher ──► PagingSource ──► Pager ──► PagingStream
//                   (invalidate)     (snapshot + load state)
//
// Cursors are backend offsets. Snapshots are immutable and replaced
// wholesale on every change, so readers never see a half-applied page.

mod fetcher;
mod pager;
mod source;

use std::hash::Hash;
use std::sync::Arc;

use strum::{Display, EnumString};

use crate::error::ErrorKind;
use crate::stream::Subscription;

pub use fetcher::{PageFetcher, ResourceFetcher};
pub use pager::Pager;
pub use source::{PagingSource, SourceId};

/// Position in a backend collection (an offset).
pub type Cursor = u64;

/// Outcome of one page load.
pub type PageResult<T> = Result<Page<T>, ErrorKind>;

/// Subscription to a pager's `(snapshot, load state)` pairs.
pub type PagingStream<T> = Subscription<PagingState<T>>;

/// Anything the pager can deduplicate by identity.
pub trait Identified {
    type Key: Eq + Hash + Clone + Send + Sync + 'static;

    fn identity(&self) -> Self::Key;
}

// ── Requests and pages ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// `None` for the first page of a refresh.
    pub cursor: Option<Cursor>,
    pub load_size: usize,
}

impl PageRequest {
    pub fn initial(load_size: usize) -> Self {
        Self {
            cursor: None,
            load_size: load_size.max(1),
        }
    }

    pub fn after(cursor: Cursor, load_size: usize) -> Self {
        Self {
            cursor: Some(cursor),
            load_size: load_size.max(1),
        }
    }

    /// Offset to send to the backend.
    pub fn offset(&self) -> Cursor {
        self.cursor.unwrap_or(0)
    }
}

/// One loaded page.
///
/// `next_cursor` is `None` exactly when fewer items than requested came
/// back, which is how the end of the collection is detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub prev_cursor: Option<Cursor>,
    pub next_cursor: Option<Cursor>,
}

impl<T> Page<T> {
    /// Build an offset-paged page for `request`, truncating an over-long
    /// response to `load_size`.
    pub fn from_offset(mut items: Vec<T>, request: PageRequest) -> Self {
        items.truncate(request.load_size);
        let offset = request.offset();
        let load_size = u64::try_from(request.load_size).unwrap_or(u64::MAX);
        let len = u64::try_from(items.len()).unwrap_or(u64::MAX);

        let prev_cursor = (offset > 0).then(|| offset.saturating_sub(load_size));
        let next_cursor = (items.len() >= request.load_size).then(|| offset.saturating_add(len));

        Self {
            items,
            prev_cursor,
            next_cursor,
        }
    }
}

// ── Load state ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Error(ErrorKind),
}

impl LoadStatus {
    pub fn is_loading(self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn error(self) -> Option<ErrorKind> {
        match self {
            Self::Error(kind) => Some(kind),
            _ => None,
        }
    }
}

/// Refresh and append progress, tracked independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadState {
    pub refresh: LoadStatus,
    pub append: LoadStatus,
}

/// Coarse pager phase derived from a [`PagingState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PagerPhase {
    Empty,
    Refreshing,
    Loaded,
    Appending,
    RefreshError,
    AppendError,
}

// ── Snapshots ───────────────────────────────────────────────────────

/// Immutable view of the loaded items, ordered and unique by identity.
#[derive(Debug)]
pub struct PagingSnapshot<T> {
    items: Arc<[Arc<T>]>,
    end_reached: bool,
}

impl<T> PagingSnapshot<T> {
    pub(crate) fn new(items: Arc<[Arc<T>]>, end_reached: bool) -> Self {
        Self { items, end_reached }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<T>> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.items.iter()
    }

    pub fn items(&self) -> &Arc<[Arc<T>]> {
        &self.items
    }

    /// `true` once a page came back shorter than requested.
    pub fn end_reached(&self) -> bool {
        self.end_reached
    }
}

impl<T> Clone for PagingSnapshot<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            end_reached: self.end_reached,
        }
    }
}

impl<T> Default for PagingSnapshot<T> {
    fn default() -> Self {
        Self {
            items: Arc::from(Vec::new()),
            end_reached: false,
        }
    }
}

/// One pager emission.
#[derive(Debug)]
pub struct PagingState<T> {
    pub snapshot: PagingSnapshot<T>,
    pub load_state: LoadState,
}

impl<T> PagingState<T> {
    pub fn phase(&self) -> PagerPhase {
        match (self.load_state.refresh, self.load_state.append) {
            (LoadStatus::Loading, _) => PagerPhase::Refreshing,
            (LoadStatus::Error(_), _) => PagerPhase::RefreshError,
            (_, LoadStatus::Loading) => PagerPhase::Appending,
            (_, LoadStatus::Error(_)) => PagerPhase::AppendError,
            _ if self.snapshot.is_empty() && !self.snapshot.end_reached() => PagerPhase::Empty,
            _ => PagerPhase::Loaded,
        }
    }
}

impl<T> Clone for PagingState<T> {
    fn clone(&self) -> Self {
        Self {
            snapshot: self.snapshot.clone(),
            load_state: self.load_state,
        }
    }
}

impl<T> Default for PagingState<T> {
    fn default() -> Self {
        Self {
            snapshot: PagingSnapshot::default(),
            load_state: LoadState::default(),
        }
    }
}

// ── Configuration ───────────────────────────────────────────────────

/// What happens to the visible snapshot when the active source is
/// invalidated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
pub enum RefreshPolicy {
    /// Clear immediately, then load the first page.
    #[default]
    #[strum(serialize = "reset")]
    ResetThenLoad,
    /// Keep the stale items until the new first page lands.
    #[strum(serialize = "keep")]
    KeepUntilLoaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagerConfig {
    /// Items per page. Zero is treated as one.
    pub page_size: usize,
    /// How close to the end of the loaded items a `request_item` must
    /// land before the next page is fetched.
    pub prefetch_distance: usize,
    pub refresh_policy: RefreshPolicy,
}

impl PagerConfig {
    pub fn new(page_size: usize, prefetch_distance: usize) -> Self {
        Self {
            page_size,
            prefetch_distance,
            refresh_policy: RefreshPolicy::default(),
        }
    }

    pub fn with_refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.refresh_policy = policy;
        self
    }
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self::new(10, 20)
    }
}

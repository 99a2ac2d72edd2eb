// A paging source: one fetcher plus a one-shot invalidation latch.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::{self, BoxFuture};
use tracing::debug;

use crate::error::ErrorKind;

use super::{PageFetcher, PageRequest, PageResult};

static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`PagingSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(u64);

impl SourceId {
    fn next() -> Self {
        Self(NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type InvalidationCallback = Box<dyn FnOnce() + Send>;

/// Binds a [`PageFetcher`] to an invalidation lifecycle.
///
/// Once invalidated a source never fetches again; the owning pager swaps
/// in a fresh one. Invalidation callbacks run exactly once, on the thread
/// that calls [`invalidate`](Self::invalidate).
pub struct PagingSource<T> {
    id: SourceId,
    invalidated: AtomicBool,
    fetcher: Arc<dyn PageFetcher<T>>,
    callbacks: Mutex<Vec<InvalidationCallback>>,
}

impl<T: Send + 'static> PagingSource<T> {
    pub fn new(fetcher: impl PageFetcher<T>) -> Self {
        Self::from_shared(Arc::new(fetcher))
    }

    /// Wrap a fetcher that is shared with other sources.
    pub fn from_shared(fetcher: Arc<dyn PageFetcher<T>>) -> Self {
        Self {
            id: SourceId::next(),
            invalidated: AtomicBool::new(false),
            fetcher,
            callbacks: Mutex::new(Vec::new()),
        }
    }

    /// Load one page, or fail with [`ErrorKind::SourceInvalidated`]
    /// without touching the fetcher once this source is invalidated.
    pub fn fetch(&self, request: PageRequest) -> BoxFuture<'static, PageResult<T>> {
        if self.is_invalidated() {
            return Box::pin(future::ready(Err(ErrorKind::SourceInvalidated)));
        }
        self.fetcher.fetch(request)
    }
}

// Lifecycle queries carry no item bounds so pager bookkeeping can use them
// for any `T`.
impl<T> PagingSource<T> {
    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated.load(Ordering::Acquire)
    }

    /// Mark this source stale. Idempotent.
    pub fn invalidate(&self) {
        if self.invalidated.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!(source = %self.id, "paging source invalidated");

        let callbacks = std::mem::take(&mut *self.lock_callbacks());
        for callback in callbacks {
            callback();
        }
    }

    /// Run `callback` when this source is invalidated, or right away if it
    /// already is.
    pub fn on_invalidated(&self, callback: impl FnOnce() + Send + 'static) {
        {
            let mut callbacks = self.lock_callbacks();
            if !self.is_invalidated() {
                callbacks.push(Box::new(callback));
                return;
            }
        }
        callback();
    }

    fn lock_callbacks(&self) -> std::sync::MutexGuard<'_, Vec<InvalidationCallback>> {
        self.callbacks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> fmt::Debug for PagingSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagingSource")
            .field("id", &self.id)
            .field("invalidated", &self.invalidated.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

// ── Observable loading counter ──
//
// Counts overlapping operations and publishes a single "busy" flag.
// The flag only changes on 0 <-> positive transitions, so a screen
// running save and delete at once sees one spinner, not flicker.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::debug;

use crate::stream::Subscription;

/// Subscription to a counter's busy flag.
pub type LoadingStream = Subscription<bool>;

/// Shared counter of in-progress operations. Clones share one count.
#[derive(Clone)]
pub struct ObservableLoadingCounter {
    inner: Arc<Inner>,
}

struct Inner {
    count: Mutex<usize>,
    loading_tx: watch::Sender<bool>,
}

impl ObservableLoadingCounter {
    pub fn new() -> Self {
        let (loading_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                count: Mutex::new(0),
                loading_tx,
            }),
        }
    }

    pub fn add_loader(&self) {
        let mut count = self.lock();
        *count += 1;
        if *count == 1 {
            self.inner.loading_tx.send_replace(true);
        }
    }

    /// Release one loader. Extra releases are ignored.
    pub fn remove_loader(&self) {
        let mut count = self.lock();
        if *count == 0 {
            debug!("remove_loader called with no active loaders");
            return;
        }
        *count -= 1;
        if *count == 0 {
            self.inner.loading_tx.send_replace(false);
        }
    }

    pub fn count(&self) -> usize {
        *self.lock()
    }

    pub fn is_loading(&self) -> bool {
        self.count() > 0
    }

    pub fn observe(&self) -> LoadingStream {
        Subscription::new(self.inner.loading_tx.subscribe())
    }

    /// Hold a loader until the guard is dropped.
    pub fn guard(&self) -> LoaderGuard {
        self.add_loader();
        LoaderGuard {
            counter: self.clone(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, usize> {
        self.inner.count.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ObservableLoadingCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ObservableLoadingCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableLoadingCounter")
            .field("count", &self.count())
            .finish()
    }
}

/// RAII loader: removes itself from the counter on drop.
#[must_use = "the loader is released as soon as the guard is dropped"]
pub struct LoaderGuard {
    counter: ObservableLoadingCounter,
}

impl Drop for LoaderGuard {
    fn drop(&mut self) {
        self.counter.remove_loader();
    }
}

/// Run `future` with one loader held on `counter`.
///
/// The loader is released however the future ends: with a value, with an
/// error, by panicking, or by being dropped before completion.
pub async fn with_loader<F: Future>(counter: &ObservableLoadingCounter, future: F) -> F::Output {
    let _guard = counter.guard();
    future.await
}

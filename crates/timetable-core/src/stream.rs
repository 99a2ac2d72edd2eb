// ── Reactive subscriptions ──
//
// Every observable in this crate (pager state, loading flags, UI events)
// is a `tokio::sync::watch` channel. `Subscription` wraps the receiver
// with point-in-time access plus change notification, and converts into
// a `Stream` for use with `StreamExt` combinators.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// A subscription to a watched value.
pub struct Subscription<V: Clone + Send + Sync + 'static> {
    current: V,
    receiver: watch::Receiver<V>,
}

impl<V: Clone + Send + Sync + 'static> Subscription<V> {
    pub(crate) fn new(receiver: watch::Receiver<V>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Get the value captured at creation time (or at the last `changed()`).
    pub fn current(&self) -> &V {
        &self.current
    }

    /// Get the latest value (may have changed since creation).
    pub fn latest(&self) -> V {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new value.
    /// Returns `None` if the owner has been dropped.
    pub async fn changed(&mut self) -> Option<V> {
        self.receiver.changed().await.ok()?;
        let value = self.receiver.borrow_and_update().clone();
        self.current = value.clone();
        Some(value)
    }

    /// Wait until `predicate` holds for the latest value and return it.
    /// Returns `None` if the owner is dropped first.
    pub async fn wait_for(&mut self, mut predicate: impl FnMut(&V) -> bool) -> Option<V> {
        let value = self.receiver.wait_for(|v| predicate(v)).await.ok()?.clone();
        self.current = value.clone();
        Some(value)
    }

    /// Convert into a `Stream`. The first item is the value current at
    /// conversion time.
    pub fn into_stream(self) -> SubscriptionStream<V> {
        SubscriptionStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
pub struct SubscriptionStream<V: Clone + Send + Sync + 'static> {
    inner: WatchStream<V>,
}

impl<V: Clone + Send + Sync + 'static> Stream for SubscriptionStream<V> {
    type Item = V;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // WatchStream is Unpin: it only holds a boxed future.
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

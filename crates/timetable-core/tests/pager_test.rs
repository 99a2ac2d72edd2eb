// Behaviour tests for `Pager` driven by in-memory fetchers.
#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::sync::Notify;

use timetable_core::{
    Cursor, ErrorKind, Identified, LoadStatus, Page, PageFetcher, PageRequest, Pager, PagerConfig,
    PagerPhase, PagingState, PagingStream, RefreshPolicy,
};

// ── Helpers ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
struct Row(u64);

impl Identified for Row {
    type Key = u64;

    fn identity(&self) -> u64 {
        self.0
    }
}

/// Serves rows `0..total` and records every requested cursor.
#[derive(Clone, Default)]
struct Dataset {
    total: u64,
    delay: Duration,
    calls: Arc<Mutex<Vec<Option<Cursor>>>>,
}

impl Dataset {
    fn new(total: u64) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn fetcher(&self) -> impl PageFetcher<Row> + use<> {
        let dataset = self.clone();
        move |request: PageRequest| {
            dataset.calls.lock().unwrap().push(request.cursor);
            let total = dataset.total;
            let delay = dataset.delay;
            async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(page_of(total, request))
            }
        }
    }

    fn calls(&self) -> Vec<Option<Cursor>> {
        self.calls.lock().unwrap().clone()
    }

    fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

fn page_of(total: u64, request: PageRequest) -> Page<Row> {
    let start = request.offset();
    let end = (start + u64::try_from(request.load_size).unwrap()).min(total);
    Page::from_offset((start..end).map(Row).collect(), request)
}

fn ids(state: &PagingState<Row>) -> Vec<u64> {
    state.snapshot.iter().map(|row| row.0).collect()
}

fn is_settled(state: &PagingState<Row>) -> bool {
    !state.load_state.refresh.is_loading() && !state.load_state.append.is_loading()
}

async fn settle(stream: &mut PagingStream<Row>) -> PagingState<Row> {
    tokio::time::timeout(Duration::from_secs(5), stream.wait_for(is_settled))
        .await
        .expect("pager did not settle")
        .expect("pager dropped")
}

// ── Initial load and appends ────────────────────────────────────────

#[tokio::test]
async fn observe_starts_the_first_load() {
    let data = Dataset::new(25);
    let pager = Pager::from_fetcher(PagerConfig::new(10, 5), {
        let data = data.clone();
        move || data.fetcher()
    });
    assert_eq!(pager.state().phase(), PagerPhase::Empty);

    let mut stream = pager.observe();
    assert_eq!(stream.current().load_state.refresh, LoadStatus::Loading);

    let state = settle(&mut stream).await;
    assert_eq!(ids(&state), (0..10).collect::<Vec<_>>());
    assert_eq!(state.phase(), PagerPhase::Loaded);
    assert_eq!(data.calls(), vec![None]);
}

#[tokio::test]
async fn request_item_alone_starts_loading() {
    let data = Dataset::new(5);
    let pager = Pager::from_fetcher(PagerConfig::new(10, 5), {
        let data = data.clone();
        move || data.fetcher()
    });

    assert!(pager.request_item(0).is_none());
    let mut stream = pager.observe();
    let state = settle(&mut stream).await;

    assert_eq!(state.snapshot.len(), 5);
    assert!(state.snapshot.end_reached());
    assert_eq!(pager.request_item(0).map(|row| row.0), Some(0));
    assert_eq!(data.calls(), vec![None]);
}

#[tokio::test]
async fn end_to_end_append_until_end_of_data() {
    let data = Dataset::new(15);
    let pager = Pager::from_fetcher(PagerConfig::new(10, 5), {
        let data = data.clone();
        move || data.fetcher()
    });
    let mut stream = pager.observe();

    let first = settle(&mut stream).await;
    assert_eq!(first.snapshot.len(), 10);

    assert!(pager.request_item(15).is_none());
    assert_eq!(pager.state().load_state.append, LoadStatus::Loading);

    let last = settle(&mut stream).await;
    assert_eq!(ids(&last), (0..15).collect::<Vec<_>>());
    assert_eq!(last.load_state.append, LoadStatus::Idle);
    assert!(last.snapshot.end_reached());

    assert!(pager.request_item(20).is_none());
    assert_eq!(pager.state().load_state.append, LoadStatus::Idle);
    assert_eq!(data.calls(), vec![None, Some(10)]);
}

#[tokio::test(start_paused = true)]
async fn appends_are_serialized_in_cursor_order() {
    let data = Dataset::new(35).with_delay(Duration::from_millis(50));
    let pager = Pager::from_fetcher(PagerConfig::new(10, 2), {
        let data = data.clone();
        move || data.fetcher()
    });
    let mut stream = pager.observe();

    loop {
        let state = settle(&mut stream).await;
        if state.snapshot.end_reached() {
            assert_eq!(ids(&state), (0..35).collect::<Vec<_>>());
            break;
        }
        let last = state.snapshot.len() - 1;
        for _ in 0..3 {
            pager.request_item(last);
        }
    }

    assert_eq!(data.calls(), vec![None, Some(10), Some(20), Some(30)]);
}

#[tokio::test]
async fn far_from_the_end_does_not_prefetch() {
    let data = Dataset::new(100);
    let pager = Pager::from_fetcher(PagerConfig::new(10, 2), {
        let data = data.clone();
        move || data.fetcher()
    });
    let mut stream = pager.observe();
    settle(&mut stream).await;

    assert_eq!(pager.request_item(3).map(|row| row.0), Some(3));
    assert_eq!(pager.state().load_state.append, LoadStatus::Idle);
    assert_eq!(data.calls(), vec![None]);
}

// ── Invalidation and refresh ────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn late_refresh_from_invalidated_source_is_discarded() {
    let gate = Arc::new(Notify::new());
    let sources = Arc::new(AtomicUsize::new(0));

    let pager = Pager::from_fetcher(PagerConfig::new(10, 5), {
        let gate = Arc::clone(&gate);
        let sources = Arc::clone(&sources);
        move || {
            let generation = sources.fetch_add(1, Ordering::SeqCst);
            let gate = Arc::clone(&gate);
            move |request: PageRequest| {
                let gate = Arc::clone(&gate);
                async move {
                    if generation == 0 {
                        gate.notified().await;
                        Ok(Page::from_offset((100..110).map(Row).collect(), request))
                    } else {
                        Ok(page_of(10, request))
                    }
                }
            }
        }
    });

    let mut stream = pager.observe();
    let stale_source = pager.source().unwrap();
    stale_source.invalidate();

    let state = settle(&mut stream).await;
    assert_eq!(ids(&state), (0..10).collect::<Vec<_>>());

    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(ids(&pager.state()), (0..10).collect::<Vec<_>>());
    assert_eq!(sources.load(Ordering::SeqCst), 2);
    assert_ne!(pager.source().unwrap().id(), stale_source.id());
}

#[tokio::test]
async fn invalidation_reloads_from_offset_zero() {
    let data = Dataset::new(30);
    let pager = Pager::from_fetcher(PagerConfig::new(10, 5), {
        let data = data.clone();
        move || data.fetcher()
    });
    let mut stream = pager.observe();
    settle(&mut stream).await;
    pager.request_item(9);
    assert_eq!(settle(&mut stream).await.snapshot.len(), 20);
    data.reset_calls();

    pager.source().unwrap().invalidate();

    let next = stream.changed().await.unwrap();
    assert_eq!(next.load_state.refresh, LoadStatus::Loading);
    assert!(next.snapshot.is_empty(), "reset policy clears stale rows");

    let reloaded = settle(&mut stream).await;
    assert_eq!(ids(&reloaded), (0..10).collect::<Vec<_>>());
    assert_eq!(data.calls(), vec![None]);
}

#[tokio::test]
async fn keep_policy_shows_stale_rows_until_reload() {
    let data = Dataset::new(30);
    let config = PagerConfig::new(10, 5).with_refresh_policy(RefreshPolicy::KeepUntilLoaded);
    let pager = Pager::from_fetcher(config, {
        let data = data.clone();
        move || data.fetcher()
    });
    let mut stream = pager.observe();
    settle(&mut stream).await;

    pager.source().unwrap().invalidate();

    let next = stream.changed().await.unwrap();
    assert_eq!(next.load_state.refresh, LoadStatus::Loading);
    assert_eq!(next.snapshot.len(), 10);
    assert_eq!(settle(&mut stream).await.snapshot.len(), 10);
}

#[tokio::test]
async fn explicit_refresh_swaps_source_and_keeps_rows() {
    let data = Dataset::new(30);
    let pager = Pager::from_fetcher(PagerConfig::new(10, 5), {
        let data = data.clone();
        move || data.fetcher()
    });
    let mut stream = pager.observe();
    settle(&mut stream).await;
    let before = pager.source().unwrap();

    pager.refresh();

    assert!(before.is_invalidated());
    let during = pager.state();
    assert_eq!(during.load_state.refresh, LoadStatus::Loading);
    assert_eq!(during.snapshot.len(), 10);

    settle(&mut stream).await;
    assert_ne!(pager.source().unwrap().id(), before.id());
    assert_eq!(data.calls(), vec![None, None]);
}

#[tokio::test(start_paused = true)]
async fn append_runs_while_refresh_is_pending() {
    let data = Dataset::new(30).with_delay(Duration::from_millis(50));
    let pager = Pager::from_fetcher(PagerConfig::new(10, 5), {
        let data = data.clone();
        move || data.fetcher()
    });
    let mut stream = pager.observe();
    settle(&mut stream).await;

    pager.refresh();
    assert_eq!(pager.request_item(9).map(|row| row.0), Some(9));

    let during = pager.state();
    assert_eq!(during.load_state.refresh, LoadStatus::Loading);
    assert_eq!(during.load_state.append, LoadStatus::Loading);
    assert_eq!(data.calls(), vec![None, None, Some(10)]);

    // Whichever lands first, the refreshed first page wins.
    let state = settle(&mut stream).await;
    assert_eq!(ids(&state), (0..10).collect::<Vec<_>>());
    assert!(!state.snapshot.end_reached());
}

// ── Errors and retry ────────────────────────────────────────────────

#[tokio::test]
async fn failed_append_keeps_rows_and_retry_resumes() {
    let failed_once = Arc::new(AtomicBool::new(false));
    let pager = Pager::from_fetcher(PagerConfig::new(10, 5), {
        let failed_once = Arc::clone(&failed_once);
        move || {
            let failed_once = Arc::clone(&failed_once);
            move |request: PageRequest| {
                let fail = request.cursor.is_some() && !failed_once.swap(true, Ordering::SeqCst);
                async move {
                    if fail {
                        Err(ErrorKind::NetworkFailure)
                    } else {
                        Ok(page_of(25, request))
                    }
                }
            }
        }
    });
    let mut stream = pager.observe();
    settle(&mut stream).await;

    pager.request_item(9);
    let failed = settle(&mut stream).await;
    assert_eq!(failed.load_state.append, LoadStatus::Error(ErrorKind::NetworkFailure));
    assert_eq!(failed.phase(), PagerPhase::AppendError);
    assert_eq!(failed.snapshot.len(), 10);

    pager.retry();
    let recovered = settle(&mut stream).await;
    assert_eq!(recovered.load_state.append, LoadStatus::Idle);
    assert_eq!(recovered.snapshot.len(), 20);
}

#[tokio::test]
async fn failed_refresh_surfaces_error_and_retry_reuses_source() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let pager = Pager::from_fetcher(PagerConfig::new(10, 5), {
        let attempts = Arc::clone(&attempts);
        move || {
            let attempts = Arc::clone(&attempts);
            move |request: PageRequest| {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 0 {
                        Err(ErrorKind::TimeoutFailure)
                    } else {
                        Ok(page_of(10, request))
                    }
                }
            }
        }
    });
    let mut stream = pager.observe();

    let failed = settle(&mut stream).await;
    assert_eq!(failed.load_state.refresh, LoadStatus::Error(ErrorKind::TimeoutFailure));
    assert_eq!(failed.phase(), PagerPhase::RefreshError);
    let source = pager.source().unwrap();

    pager.retry();
    let loaded = settle(&mut stream).await;
    assert_eq!(loaded.snapshot.len(), 10);
    assert_eq!(pager.source().unwrap().id(), source.id());
}

#[tokio::test]
async fn retry_without_error_does_nothing() {
    let data = Dataset::new(5);
    let pager = Pager::from_fetcher(PagerConfig::new(10, 5), {
        let data = data.clone();
        move || data.fetcher()
    });
    let mut stream = pager.observe();
    settle(&mut stream).await;

    pager.retry();
    assert!(is_settled(&pager.state()));
    assert_eq!(data.calls(), vec![None]);
}

// ── Lifecycle ───────────────────────────────────────────────────────

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[tokio::test(start_paused = true)]
async fn dropping_the_pager_cancels_in_flight_fetches() {
    let dropped = Arc::new(AtomicBool::new(false));
    let pager = Pager::from_fetcher(PagerConfig::new(10, 5), {
        let dropped = Arc::clone(&dropped);
        move || {
            let dropped = Arc::clone(&dropped);
            move |_request: PageRequest| {
                let flag = DropFlag(Arc::clone(&dropped));
                async move {
                    let _flag = flag;
                    std::future::pending::<()>().await;
                    Ok(Page::<Row> {
                        items: Vec::new(),
                        prev_cursor: None,
                        next_cursor: None,
                    })
                }
            }
        }
    });

    let _stream = pager.observe();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!dropped.load(Ordering::SeqCst));

    drop(pager);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(dropped.load(Ordering::SeqCst));
}

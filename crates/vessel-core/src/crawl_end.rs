//! Crawl-idle detection.
//!
//! Tracks the in-flight "initial crawl" request ids and fires a one-shot
//! callback once every registered id has settled and a 50ms quiescence
//! window has elapsed without a new registration. Modeled on the debounced
//! coalescing loop in `fastnode-daemon/src/watch/mod.rs`
//! (`COALESCE_WINDOW_MS` + `tokio::time::timeout`), generalized from a
//! single coalescing timer into a restartable per-wave debounce.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};

/// The quiescence window coalesces bursts of micro-imports that would
/// otherwise prematurely signal idleness between chained transforms.
pub const DEBOUNCE_MS: u64 = 50;

type Callback = Box<dyn FnOnce() + Send + 'static>;

/// How `waitForRequestsIdle` resolved. Rather than leaving a waiter
/// hanging forever on cancellation and relying on callers racing it with
/// a timeout, the outcome is tagged explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleOutcome {
    Fired,
    Cancelled,
}

struct State {
    registered: HashSet<String>,
    seen: HashSet<String>,
    cancelled: bool,
    called: bool,
    callbacks: Vec<Callback>,
    generation: u64,
}

pub struct CrawlEndFinder {
    state: Arc<Mutex<State>>,
    notify: Arc<Notify>,
}

impl Default for CrawlEndFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlEndFinder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                registered: HashSet::new(),
                seen: HashSet::new(),
                cancelled: false,
                called: false,
                callbacks: Vec::new(),
                generation: 0,
            })),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Append to the one-shot callback list; fires immediately if crawl end
    /// already happened.
    pub async fn on_crawl_end<F: FnOnce() + Send + 'static>(&self, cb: F) {
        let mut state = self.state.lock().await;
        if state.called {
            drop(state);
            cb();
            return;
        }
        state.callbacks.push(Box::new(cb));
    }

    /// Idempotent per id; runs `done_fn` to obtain the request's settling
    /// future and marks the id done regardless of outcome once it resolves.
    pub async fn register_request_processing<F, Fut>(&self, id: &str, done_fn: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        {
            let mut state = self.state.lock().await;
            if state.seen.contains(id) {
                return;
            }
            state.seen.insert(id.to_string());
            state.registered.insert(id.to_string());
        }

        let fut = done_fn();
        let state = self.state.clone();
        let notify = self.notify.clone();
        let id = id.to_string();
        tokio::spawn(async move {
            fut.await;
            Self::mark_id_as_done(&state, &notify, &id).await;
        });
    }

    /// If `ignored_id` is given, mark it seen/done first so a plugin
    /// waiting on idle doesn't deadlock on its own registration.
    pub async fn wait_for_requests_idle(&self, ignored_id: Option<&str>) -> IdleOutcome {
        if let Some(id) = ignored_id {
            {
                let mut state = self.state.lock().await;
                state.seen.insert(id.to_string());
            }
            Self::mark_id_as_done(&self.state, &self.notify, id).await;
        }

        loop {
            {
                let state = self.state.lock().await;
                if state.called {
                    return IdleOutcome::Fired;
                }
                if state.cancelled {
                    return IdleOutcome::Cancelled;
                }
            }
            self.notify.notified().await;
        }
    }

    async fn mark_id_as_done(state: &Arc<Mutex<State>>, notify: &Arc<Notify>, id: &str) {
        let mut guard = state.lock().await;
        if !guard.registered.remove(id) {
            return;
        }
        if guard.registered.is_empty() && !guard.cancelled {
            guard.generation += 1;
            let my_generation = guard.generation;
            drop(guard);

            let state = state.clone();
            let notify = notify.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(DEBOUNCE_MS)).await;
                let mut guard = state.lock().await;
                let still_idle = guard.generation == my_generation
                    && guard.registered.is_empty()
                    && !guard.cancelled
                    && !guard.called;
                if !still_idle {
                    return;
                }
                guard.called = true;
                let callbacks = std::mem::take(&mut guard.callbacks);
                drop(guard);
                for cb in callbacks {
                    cb();
                }
                notify.notify_waiters();
            });
        }
    }

    /// Suppress future fires; waiters observe [`IdleOutcome::Cancelled`]
    /// rather than hanging.
    pub async fn cancel(&self) {
        let mut state = self.state.lock().await;
        state.cancelled = true;
        drop(state);
        self.notify.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;

    #[tokio::test]
    async fn crawl_end_callback_fires_exactly_once() {
        let finder = Arc::new(CrawlEndFinder::new());
        let fire_count = Arc::new(AtomicUsize::new(0));

        let fc = fire_count.clone();
        finder.on_crawl_end(move || {
            fc.fetch_add(1, Ordering::SeqCst);
        }).await;

        finder
            .register_request_processing("a", || async {})
            .await;
        finder
            .register_request_processing("b", || async {})
            .await;

        let outcome = finder.wait_for_requests_idle(None).await;
        assert_eq!(outcome, IdleOutcome::Fired);
        assert_eq!(fire_count.load(Ordering::SeqCst), 1);

        finder
            .register_request_processing("c", || async {})
            .await;
        tokio::time::sleep(StdDuration::from_millis(70)).await;
        assert_eq!(fire_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn registering_the_same_id_twice_is_a_no_op() {
        let finder = CrawlEndFinder::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let c = calls.clone();
            finder
                .register_request_processing("a", move || {
                    c.fetch_add(1, Ordering::SeqCst);
                    async {}
                })
                .await;
        }

        finder.wait_for_requests_idle(None).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancel_releases_waiters_without_firing() {
        let finder = Arc::new(CrawlEndFinder::new());
        finder
            .register_request_processing("a", || async {
                tokio::time::sleep(StdDuration::from_secs(3600)).await;
            })
            .await;

        let waiter = {
            let finder = finder.clone();
            tokio::spawn(async move { finder.wait_for_requests_idle(None).await })
        };

        tokio::time::sleep(StdDuration::from_millis(10)).await;
        finder.cancel().await;

        let outcome = waiter.await.unwrap();
        assert_eq!(outcome, IdleOutcome::Cancelled);
    }
}

//! Scrape cancellation and the page loop that honors it.
//!
//! A `ScrapeCancel` is the receiving half of a `watch::channel(false)`.
//! Flipping the flag makes every pending or future `run()` resolve to
//! `FetchError::Cancelled`, dropping the in-flight provider call.

use std::future::Future;

use tokio::sync::watch;

use crate::error::{FetchError, FetchResult, SourceResult};
use crate::source::{BoxFuture, Page};

/// Sending half: owned by the orchestrator for one scrape cycle.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn new() -> (CancelHandle, ScrapeCancel) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, ScrapeCancel { rx })
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Receiving half: cloned into every region task.
#[derive(Debug, Clone)]
pub struct ScrapeCancel {
    rx: watch::Receiver<bool>,
}

impl ScrapeCancel {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        ScrapeCancel { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the cycle is cancelled. Pends forever if the handle is
    /// dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Drive `fut` unless the cycle is (or becomes) cancelled.
    pub async fn run<F: Future>(&self, fut: F) -> FetchResult<F::Output> {
        if self.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(FetchError::Cancelled),
            out = fut => Ok(out),
        }
    }
}

/// Fetch every page of a paginated query, checking for cancellation at
/// each page boundary.
pub async fn paginate<'a, T, F>(cancel: &ScrapeCancel, mut fetch_page: F) -> FetchResult<Vec<T>>
where
    F: FnMut(Option<String>) -> BoxFuture<'a, SourceResult<Page<T>>>,
{
    let mut items = Vec::new();
    let mut token: Option<String> = None;

    loop {
        let page = cancel.run(fetch_page(token.take())).await??;
        items.extend(page.items);
        match page.next_token {
            Some(next) if !next.is_empty() => token = Some(next),
            _ => break,
        }
    }

    Ok(items)
}

//! Exhaustive walks over Spotify listing endpoints.
//!
//! Both paginators are lazy and one-shot: each `next_page` call performs at
//! most one remote fetch, and once a listing is exhausted it stays
//! exhausted. Walking a listing again means building a new paginator.

use std::{future::Future, time::Duration};

use tokio::time::sleep;

use crate::{
    spotify::ApiError,
    types::{CursorPage, Page},
};

use super::{PACE, retry::RetryPolicy};

/// Walks an offset/limit listing.
///
/// The walk ends after a page shorter than `limit`, or once the offset
/// reaches a `total` reported by the API. A full page without a total is
/// always followed by one more fetch.
pub struct OffsetPaginator<F> {
    fetch: F,
    limit: u32,
    offset: u32,
    total: Option<u32>,
    pace: Duration,
    retry: RetryPolicy,
    exhausted: bool,
}

impl<F> OffsetPaginator<F> {
    /// Creates a paginator starting at offset 0.
    ///
    /// # Arguments
    ///
    /// * `limit` - Page size; clamped to at least 1
    /// * `fetch` - Called with `(offset, limit)` for every page
    ///
    /// # Example
    ///
    /// ```
    /// let tracks = OffsetPaginator::new(SAVED_TRACKS_PAGE, |offset, limit| {
    ///     client.saved_tracks(offset, limit)
    /// })
    /// .collect_all()
    /// .await?;
    /// ```
    pub fn new(limit: u32, fetch: F) -> Self {
        Self {
            fetch,
            limit: limit.max(1),
            offset: 0,
            total: None,
            pace: PACE,
            retry: RetryPolicy::default(),
            exhausted: false,
        }
    }

    /// Replaces the default [`RetryPolicy`].
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replaces the pause between pages ([`PACE`] by default).
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    /// Total item count as last reported by the API, if any.
    pub fn total(&self) -> Option<u32> {
        self.total
    }

    /// Fetches the next page, or `Ok(None)` once the listing is exhausted.
    ///
    /// Every page after the first waits for the pace interval first. Transient
    /// failures are retried; a permanent one is returned and the walk can be
    /// resumed by calling again.
    pub async fn next_page<T, Fut>(&mut self) -> Result<Option<Vec<T>>, ApiError>
    where
        F: FnMut(u32, u32) -> Fut,
        Fut: Future<Output = Result<Page<T>, ApiError>>,
    {
        if self.exhausted {
            return Ok(None);
        }
        if self.offset > 0 {
            sleep(self.pace).await;
        }

        let (offset, limit) = (self.offset, self.limit);
        let fetch = &mut self.fetch;
        let page = self.retry.run(|| fetch(offset, limit)).await?;

        self.offset += limit;
        if page.total.is_some() {
            self.total = page.total;
        }
        let short = (page.items.len() as u32) < limit;
        let reached_total = page.total.is_some_and(|total| self.offset >= total);
        if short || reached_total {
            self.exhausted = true;
        }

        Ok(Some(page.items))
    }

    /// Walks the whole listing and returns every item in order.
    pub async fn collect_all<T, Fut>(mut self) -> Result<Vec<T>, ApiError>
    where
        F: FnMut(u32, u32) -> Fut,
        Fut: Future<Output = Result<Page<T>, ApiError>>,
    {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await? {
            items.extend(page);
        }
        Ok(items)
    }
}

/// Walks a cursor listing (followed artists). Ends when the API hands back
/// no further cursor or an empty page.
pub struct CursorPaginator<F> {
    fetch: F,
    limit: u32,
    after: Option<String>,
    started: bool,
    pace: Duration,
    retry: RetryPolicy,
    exhausted: bool,
}

impl<F> CursorPaginator<F> {
    pub fn new(limit: u32, fetch: F) -> Self {
        Self {
            fetch,
            limit: limit.max(1),
            after: None,
            started: false,
            pace: PACE,
            retry: RetryPolicy::default(),
            exhausted: false,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    pub async fn next_page<T, Fut>(&mut self) -> Result<Option<Vec<T>>, ApiError>
    where
        F: FnMut(Option<String>, u32) -> Fut,
        Fut: Future<Output = Result<CursorPage<T>, ApiError>>,
    {
        if self.exhausted {
            return Ok(None);
        }
        if self.started {
            sleep(self.pace).await;
        }
        self.started = true;

        let (after, limit) = (self.after.clone(), self.limit);
        let fetch = &mut self.fetch;
        let page = self.retry.run(|| fetch(after.clone(), limit)).await?;

        match page.next {
            Some(cursor) if !page.items.is_empty() => self.after = Some(cursor),
            _ => self.exhausted = true,
        }

        Ok(Some(page.items))
    }

    /// Walks the whole listing and returns every item in order.
    pub async fn collect_all<T, Fut>(mut self) -> Result<Vec<T>, ApiError>
    where
        F: FnMut(Option<String>, u32) -> Fut,
        Fut: Future<Output = Result<CursorPage<T>, ApiError>>,
    {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await? {
            items.extend(page);
        }
        Ok(items)
    }
}

//! Pagination types and traits
//!
//! Defines the core pagination abstractions used by the walker.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque continuation token owned by the server
///
/// Never interpreted or altered; it is sent back verbatim on the next call.
/// An empty cursor means "start" on the way out and "exhausted" on the way
/// back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// The empty cursor
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Cursor {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Cursor {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One batch of items plus the cursor for the next batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items in server order
    pub items: Vec<T>,
    /// Cursor for the next page; empty when exhausted
    pub next_cursor: Cursor,
}

impl<T> Page<T> {
    /// Create a page
    pub fn new(items: Vec<T>, next_cursor: impl Into<Cursor>) -> Self {
        Self {
            items,
            next_cursor: next_cursor.into(),
        }
    }

    /// Create the final page of a walk
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: Cursor::empty(),
        }
    }

    /// Whether another page follows this one
    pub fn has_more(&self) -> bool {
        !self.next_cursor.is_empty()
    }
}

/// How a walk decides whether to keep going
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Continuation {
    /// Keep fetching while no error has occurred; an error ends the walk
    /// quietly (debug log only)
    #[default]
    UntilError,
    /// Keep fetching while the last page reported more data; an error is
    /// reported at error level before the walk returns
    WhileHasMore,
}

/// Tracks pagination state during a walk
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Pages fetched so far
    pub pages: usize,
    /// Items fetched so far
    pub total_fetched: u64,
    /// Cursor for the next call
    pub cursor: Cursor,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fetched page and move the cursor forward
    pub fn advance(&mut self, item_count: usize, next_cursor: Cursor) {
        self.pages += 1;
        self.total_fetched += item_count as u64;
        if next_cursor.is_empty() {
            self.done = true;
        }
        self.cursor = next_cursor;
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
    }

    /// Whether another fetch should happen
    pub fn has_more(&self) -> bool {
        !self.done
    }
}

/// Accumulated result of a walk
///
/// Always carries what was gathered, even when the walk ended early.
#[derive(Debug)]
pub struct Walk<U> {
    /// Extracted values in page-arrival order
    pub items: Vec<U>,
    /// Number of pages successfully fetched
    pub pages: usize,
    /// The fetch error that ended the walk, if any
    pub error: Option<Error>,
}

impl<U> Walk<U> {
    /// Whether the walk reached the last page
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Split into the partial items and the terminating error
    pub fn into_parts(self) -> (Vec<U>, Option<Error>) {
        (self.items, self.error)
    }

    /// Items if the walk completed, the error otherwise
    ///
    /// Discards partial items on error; use [`Walk::into_parts`] to keep them.
    pub fn into_result(self) -> Result<Vec<U>> {
        match self.error {
            None => Ok(self.items),
            Some(err) => Err(err),
        }
    }
}

/// Fetch capability bound to fixed per-call parameters
#[async_trait]
pub trait PageFetcher<T: Send>: Send + Sync {
    /// Fetch the page that starts at `cursor`
    async fn fetch(&self, cursor: &Cursor) -> Result<Page<T>>;
}

/// Side channel that sees every page as it arrives
pub trait PageObserver<T> {
    /// Called once per fetched page, before its values are extracted
    fn on_page(&mut self, items: &[T]);
}

impl<T, F> PageObserver<T> for F
where
    F: FnMut(&[T]),
{
    fn on_page(&mut self, items: &[T]) {
        self(items);
    }
}

//! The pagination walker
//!
//! Drives a [`PageFetcher`] from the empty cursor to the last page,
//! sequentially, on the caller's task. No timeout or retry is added here:
//! the fetcher's own call context decides those, and the first failed fetch
//! ends the walk.

use super::types::{Continuation, PageFetcher, PageObserver, PaginationState, Walk};
use crate::error::Error;
use tracing::{debug, error};

/// Walks a cursor-paginated collection
pub struct Walker<'o, T> {
    continuation: Continuation,
    label: String,
    observer: Option<&'o mut (dyn PageObserver<T> + Send)>,
}

impl<'o, T: Send> Walker<'o, T> {
    /// Create a walker with the given continuation rule
    pub fn new(continuation: Continuation) -> Self {
        Self {
            continuation,
            label: "collection".to_string(),
            observer: None,
        }
    }

    /// Name used in log lines
    #[must_use]
    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Hand every page to `observer` as it arrives
    #[must_use]
    pub fn observe(mut self, observer: &'o mut (dyn PageObserver<T> + Send)) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Walk every page, extracting one value per item
    pub async fn run<U, F, E>(self, fetcher: &F, extract: E) -> Walk<U>
    where
        F: PageFetcher<T> + ?Sized,
        E: FnMut(&T) -> U,
    {
        match self.continuation {
            Continuation::UntilError => self.until_error(fetcher, extract).await,
            Continuation::WhileHasMore => self.while_has_more(fetcher, extract).await,
        }
    }

    async fn until_error<U, F, E>(mut self, fetcher: &F, mut extract: E) -> Walk<U>
    where
        F: PageFetcher<T> + ?Sized,
        E: FnMut(&T) -> U,
    {
        let mut state = PaginationState::new();
        let mut items = Vec::new();
        let mut failure: Option<Error> = None;

        while failure.is_none() && state.has_more() {
            match fetcher.fetch(&state.cursor).await {
                Ok(page) => {
                    self.notify(&page.items);
                    items.extend(page.items.iter().map(&mut extract));
                    state.advance(page.items.len(), page.next_cursor);
                    debug!(
                        "{}: page {} ({} items so far)",
                        self.label, state.pages, state.total_fetched
                    );
                }
                Err(err) => {
                    debug!(
                        "{}: walk stopped after {} page(s): {err}",
                        self.label, state.pages
                    );
                    failure = Some(err);
                }
            }
        }

        Walk {
            items,
            pages: state.pages,
            error: failure,
        }
    }

    async fn while_has_more<U, F, E>(mut self, fetcher: &F, mut extract: E) -> Walk<U>
    where
        F: PageFetcher<T> + ?Sized,
        E: FnMut(&T) -> U,
    {
        let mut state = PaginationState::new();
        let mut items = Vec::new();
        let mut has_more = true;

        while has_more {
            let page = match fetcher.fetch(&state.cursor).await {
                Ok(page) => page,
                Err(err) => {
                    error!(
                        "{}: fetch failed after {} page(s): {err}",
                        self.label, state.pages
                    );
                    state.mark_done();
                    return Walk {
                        items,
                        pages: state.pages,
                        error: Some(err),
                    };
                }
            };

            self.notify(&page.items);
            items.extend(page.items.iter().map(&mut extract));
            has_more = page.has_more();
            state.advance(page.items.len(), page.next_cursor);
            debug!(
                "{}: page {} ({} items so far, has_more={has_more})",
                self.label, state.pages, state.total_fetched
            );
        }

        Walk {
            items,
            pages: state.pages,
            error: None,
        }
    }

    fn notify(&mut self, items: &[T]) {
        if let Some(observer) = self.observer.as_mut() {
            observer.on_page(items);
        }
    }
}

// SPDX-License-Identifier: GPL-3.0-or-later

use crate::lazy_list::{LazyList, Producer};
use async_trait::async_trait;
use std::future::Future;
use tracing::{debug, warn};

/// One page of a remote result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of pages the service reports for the whole query.
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_pages: u32) -> Self {
        Self { items, total_pages }
    }

    /// Map the items to a different type
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_pages: self.total_pages,
        }
    }
}

/// Walks pages 1, 2, ... of a paged query, one page per request.
///
/// The total page count reported by page 1 is final. A failed fetch does not
/// advance the page number, so the next request retries the same page.
pub struct Depaginator<F> {
    fetch: F,
    next_page: u32,
    total_pages: Option<u32>,
}

impl<F> Depaginator<F> {
    pub fn new(fetch: F) -> Self {
        Self {
            fetch,
            next_page: 1,
            total_pages: None,
        }
    }
}

#[async_trait]
impl<T, E, F, Fut> Producer<T, E> for Depaginator<F>
where
    T: Send + 'static,
    E: Send + 'static,
    F: FnMut(u32) -> Fut + Send,
    Fut: Future<Output = Result<Page<T>, E>> + Send + 'static,
{
    async fn produce(&mut self) -> Option<Result<Vec<T>, E>> {
        if let Some(total) = self.total_pages {
            if self.next_page > total {
                return None;
            }
        }

        let page = self.next_page;
        debug!(target: "pagination", page, total = ?self.total_pages, "fetching page");
        let fetched = match (self.fetch)(page).await {
            Ok(fetched) => fetched,
            Err(err) => return Some(Err(err)),
        };

        match self.total_pages {
            None => self.total_pages = Some(fetched.total_pages),
            Some(total) if total != fetched.total_pages => {
                warn!(
                    target: "pagination",
                    page,
                    expected = total,
                    reported = fetched.total_pages,
                    "page reported a different total, keeping the first"
                );
            }
            Some(_) => {}
        }

        self.next_page += 1;
        Some(Ok(fetched.items))
    }
}

/// Turn a single-page fetcher into a lazy list over every page.
///
/// Page `n + 1` is only requested once the elements of page `n` have been
/// consumed.
pub fn depaginate<T, E, F, Fut>(fetch: F) -> LazyList<T, E>
where
    T: Clone + Send + 'static,
    E: Send + 'static,
    F: FnMut(u32) -> Fut + Send + 'static,
    Fut: Future<Output = Result<Page<T>, E>> + Send + 'static,
{
    LazyList::new(Depaginator::new(fetch))
}

// SPDX-License-Identifier: GPL-3.0-or-later

use async_trait::async_trait;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::ops::Range;
use tracing::debug;

/// Source of elements for a [`LazyList`], delivered one chunk at a time.
///
/// A chunk is usually one page of a remote result set. `None` means the
/// source is exhausted.
#[async_trait]
pub trait Producer<T, E>: Send {
    async fn produce(&mut self) -> Option<Result<Vec<T>, E>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListState {
    NotStarted,
    Producing,
    Exhausted,
}

/// Sequence whose elements are fetched on demand.
///
/// Elements are kept once produced, so indexing an element already seen never
/// fetches again. [`LazyList::next`] walks the list once, front to back; a
/// new list has to be requested to enumerate the remote data again.
///
/// A list has a single consumer; every operation takes `&mut self`.
pub struct LazyList<T, E> {
    producer: Option<Box<dyn Producer<T, E>>>,
    buffer: Vec<T>,
    cursor: usize,
    state: ListState,
}

impl<T, E> LazyList<T, E>
where
    T: Clone + Send + 'static,
    E: Send + 'static,
{
    pub fn new(producer: impl Producer<T, E> + 'static) -> Self {
        Self {
            producer: Some(Box::new(producer)),
            buffer: Vec::new(),
            cursor: 0,
            state: ListState::NotStarted,
        }
    }

    /// List over values that are already known.
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            producer: None,
            buffer: items,
            cursor: 0,
            state: ListState::Exhausted,
        }
    }

    /// One element per input, each fetched by `fetch` when first needed.
    ///
    /// An input whose fetch fails stays at the front and is fetched again on
    /// the next read.
    pub fn from_each<I, F, Fut>(inputs: impl IntoIterator<Item = I>, fetch: F) -> Self
    where
        I: Clone + Send + 'static,
        F: FnMut(I) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::new(EachProducer {
            inputs: inputs.into_iter().collect(),
            fetch,
        })
    }

    pub fn state(&self) -> ListState {
        self.state
    }

    /// Elements produced so far, in order.
    pub fn consumed(&self) -> &[T] {
        &self.buffer
    }

    /// Next element of the single forward pass.
    pub async fn next(&mut self) -> Option<Result<T, E>> {
        match self.get(self.cursor).await {
            Ok(Some(item)) => {
                self.cursor += 1;
                Some(Ok(item))
            }
            Ok(None) => None,
            Err(err) => Some(Err(err)),
        }
    }

    pub async fn get(&mut self, index: usize) -> Result<Option<T>, E> {
        self.fill_to(index.saturating_add(1)).await?;
        Ok(self.buffer.get(index).cloned())
    }

    /// The top item, if the list has any.
    pub async fn first(&mut self) -> Result<Option<T>, E> {
        self.get(0).await
    }

    /// Total number of elements. Fetches everything.
    pub async fn len(&mut self) -> Result<usize, E> {
        self.fill_to(usize::MAX).await?;
        Ok(self.buffer.len())
    }

    pub async fn is_empty(&mut self) -> Result<bool, E> {
        self.fill_to(1).await?;
        Ok(self.buffer.is_empty())
    }

    /// Elements in `range`, clipped to the end of the list.
    pub async fn slice(&mut self, range: Range<usize>) -> Result<Vec<T>, E> {
        self.fill_to(range.end).await?;
        let end = range.end.min(self.buffer.len());
        let start = range.start.min(end);
        Ok(self.buffer[start..end].to_vec())
    }

    /// Drain the remaining pages and return every element.
    pub async fn collect(mut self) -> Result<Vec<T>, E> {
        self.fill_to(usize::MAX).await?;
        Ok(self.buffer)
    }

    async fn fill_to(&mut self, wanted: usize) -> Result<(), E> {
        while self.buffer.len() < wanted {
            let Some(producer) = self.producer.as_mut() else {
                break;
            };
            self.state = ListState::Producing;
            match producer.produce().await {
                Some(Ok(chunk)) => {
                    debug!(
                        target: "pagination",
                        received = chunk.len(),
                        buffered = self.buffer.len() + chunk.len(),
                        "lazy list chunk produced"
                    );
                    self.buffer.extend(chunk);
                }
                Some(Err(err)) => return Err(err),
                None => {
                    debug!(target: "pagination", total = self.buffer.len(), "lazy list exhausted");
                    self.producer = None;
                    self.state = ListState::Exhausted;
                }
            }
        }
        Ok(())
    }
}

impl<T: fmt::Debug, E> fmt::Debug for LazyList<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyList")
            .field("state", &self.state)
            .field("consumed", &self.buffer)
            .field("cursor", &self.cursor)
            .finish()
    }
}

struct EachProducer<I, F> {
    inputs: VecDeque<I>,
    fetch: F,
}

#[async_trait]
impl<T, E, I, F, Fut> Producer<T, E> for EachProducer<I, F>
where
    T: Send + 'static,
    E: Send + 'static,
    I: Clone + Send + 'static,
    F: FnMut(I) -> Fut + Send,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    async fn produce(&mut self) -> Option<Result<Vec<T>, E>> {
        let input = self.inputs.front()?.clone();
        let item = match (self.fetch)(input).await {
            Ok(item) => item,
            Err(err) => return Some(Err(err)),
        };
        self.inputs.pop_front();
        Some(Ok(vec![item]))
    }
}

// SPDX-License-Identifier: GPL-3.0-or-later

use std::fmt;
use std::future::Future;
use tokio::sync::OnceCell;
use tracing::trace;

/// Lazily computed, copy-on-read property slot.
///
/// The computation runs at most once per slot. Every read hands out a clone,
/// so callers can mutate what they got without touching the cached value.
/// Values that should be shared rather than copied can be stored as an `Arc`.
pub struct Memo<T> {
    cell: OnceCell<T>,
}

impl<T: Clone> Memo<T> {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Return a clone of the cached value, computing it first if unset.
    ///
    /// A failing `compute` leaves the slot unset so the next read retries it.
    /// Concurrent first reads wait for a single computation.
    pub async fn get_or_try_init<E, F, Fut>(&self, compute: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.cell.get() {
            trace!(target: "memo", "memoized value hit");
            return Ok(value.clone());
        }
        let value = self.cell.get_or_try_init(compute).await?;
        Ok(value.clone())
    }

    pub async fn get_or_init<F, Fut>(&self, compute: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.cell.get_or_init(compute).await.clone()
    }

    /// Clone of the cached value, without computing anything.
    pub fn get(&self) -> Option<T> {
        self.cell.get().cloned()
    }

    pub fn is_set(&self) -> bool {
        self.cell.initialized()
    }
}

impl<T: Clone> Default for Memo<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Memo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(value) => f.debug_tuple("Memo").field(value).finish(),
            None => f.write_str("Memo(<unset>)"),
        }
    }
}

// SPDX-License-Identifier: GPL-3.0-or-later

//! Fire-and-forget execution of remote calls.
//!
//! The task runs on the tokio runtime and its outcome, success or failure, is
//! delivered exactly once: to a callback, or over a oneshot channel. A task
//! that panics is reported as [`CoreError::TaskAborted`]. There is no
//! cancellation or timeout here; timeouts belong to the transport.

use crate::error::CoreError;
use std::future::Future;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, warn};

/// Spawn `task` and hand its result to `callback` when it finishes.
///
/// Returns immediately. The returned handle resolves after the callback ran.
pub fn spawn_with_callback<Fut, T, E, C>(task: Fut, callback: C) -> JoinHandle<()>
where
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: From<CoreError> + Send + 'static,
    C: FnOnce(Result<T, E>) + Send + 'static,
{
    let worker = tokio::spawn(task);
    tokio::spawn(async move {
        let outcome = flatten(worker.await);
        debug!(target: "dispatch", ok = outcome.is_ok(), "delivering dispatched result");
        callback(outcome);
    })
}

/// Spawn `task` and deliver its result on the returned receiver.
pub fn spawn_with_channel<Fut, T, E>(task: Fut) -> oneshot::Receiver<Result<T, E>>
where
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: From<CoreError> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    spawn_with_callback(task, move |outcome| {
        if tx.send(outcome).is_err() {
            debug!(target: "dispatch", "result receiver dropped");
        }
    });
    rx
}

fn flatten<T, E: From<CoreError>>(joined: Result<Result<T, E>, JoinError>) -> Result<T, E> {
    match joined {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(target: "dispatch", error = %err, "dispatched task aborted");
            Err(CoreError::TaskAborted(err.to_string()).into())
        }
    }
}

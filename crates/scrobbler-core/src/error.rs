// SPDX-License-Identifier: GPL-3.0-or-later

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("{field} has to be provided to identify a {kind}")]
    InvalidIdentity {
        kind: &'static str,
        field: &'static str,
    },

    #[error(
        "user '{}' does not have permissions to access the service",
        .identity.as_deref().unwrap_or("<unknown>")
    )]
    AuthenticationRequired { identity: Option<String> },

    /// The entry stored under a key is not of the requested entity type.
    /// Cache keys include the entity's `TypeId`, so this is an invariant
    /// violation in the cache rather than a caller error.
    #[error("cached {kind} entry holds a different type")]
    KindMismatch { kind: &'static str },

    #[error("dispatched task did not complete: {0}")]
    TaskAborted(String),
}

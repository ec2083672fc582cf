// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::{CoreError, Result};
use std::fmt;

/// Value identifying a remote entity, such as an artist's name.
///
/// Two entities of the same kind with equal keys are the same entity: they
/// compare equal, hash equally and share one cached instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    kind: &'static str,
    parts: Vec<String>,
}

impl IdentityKey {
    /// Start deriving a key for an entity kind.
    pub fn builder(kind: &'static str) -> IdentityKeyBuilder {
        IdentityKeyBuilder {
            kind,
            parts: Vec::new(),
            missing: None,
        }
    }

    /// Key made of a single `name` field, the common case.
    ///
    /// ```
    /// use scrobbler_core::IdentityKey;
    ///
    /// let key = IdentityKey::named("artist", Some("Cher")).unwrap();
    /// assert_eq!(key.to_string(), "artist:Cher");
    /// assert!(IdentityKey::named("artist", None).is_err());
    /// ```
    pub fn named(kind: &'static str, name: Option<&str>) -> Result<Self> {
        Self::builder(kind).part("name", name).finish()
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.parts.join("/"))
    }
}

/// Collects identifying fields; the first absent or empty one fails the build.
#[derive(Debug)]
pub struct IdentityKeyBuilder {
    kind: &'static str,
    parts: Vec<String>,
    missing: Option<&'static str>,
}

impl IdentityKeyBuilder {
    pub fn part(mut self, field: &'static str, value: Option<&str>) -> Self {
        if self.missing.is_some() {
            return self;
        }
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => self.parts.push(v.to_string()),
            _ => self.missing = Some(field),
        }
        self
    }

    pub fn finish(self) -> Result<IdentityKey> {
        if let Some(field) = self.missing {
            return Err(CoreError::InvalidIdentity {
                kind: self.kind,
                field,
            });
        }
        Ok(IdentityKey {
            kind: self.kind,
            parts: self.parts,
        })
    }
}

/// An entity that can live in the [`ObjectCache`](crate::ObjectCache).
pub trait Identity: Send + Sync + 'static {
    /// Entity kind, used in keys and log output.
    const KIND: &'static str;

    fn identity_key(&self) -> &IdentityKey;
}

// SPDX-License-Identifier: GPL-3.0-or-later

/// Identity plumbing shared by every cached entity: the cache kind, and
/// equality, hashing, ordering and display derived from the identity key.
///
/// The entity needs `key: IdentityKey` and `name: String` fields.
macro_rules! impl_entity_identity {
    ($entity:ty, $kind:literal) => {
        impl scrobbler_core::Identity for $entity {
            const KIND: &'static str = $kind;

            fn identity_key(&self) -> &scrobbler_core::IdentityKey {
                &self.key
            }
        }

        impl PartialEq for $entity {
            fn eq(&self, other: &Self) -> bool {
                self.key == other.key
            }
        }

        impl Eq for $entity {}

        impl std::hash::Hash for $entity {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                std::hash::Hash::hash(&self.key, state);
            }
        }

        impl PartialOrd for $entity {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $entity {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                self.key.cmp(&other.key)
            }
        }

        impl std::fmt::Display for $entity {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "<{}: {}>", $kind, self.name)
            }
        }
    };
}

pub(crate) use impl_entity_identity;

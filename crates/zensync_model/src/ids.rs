//! Identifiers for local and remote records.
//!
//! Local ids are assigned by the entity store on first save. Origin ids are
//! assigned by Zendesk; a `None` origin id means "not yet synced outward".

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Numeric identity shared by every typed record id.
pub trait RecordId: Copy + Eq + Ord + Hash + fmt::Debug + Send + Sync + 'static {
    /// Builds the id from its raw value.
    fn from_raw(raw: u64) -> Self;

    /// Returns the raw value.
    fn raw(self) -> u64;
}

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Creates the id from a raw value.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the raw id value.
            #[must_use]
            pub const fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl RecordId for $name {
            fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}:{}", $prefix, self.0)
            }
        }
    };
}

record_id!(
    /// Local id of a synced Zendesk record (user, ticket or comment).
    LocalId,
    "local"
);
record_id!(
    /// Id assigned by the remote Zendesk account.
    OriginId,
    "origin"
);
record_id!(
    /// Id of a configured Zendesk channel.
    ChannelId,
    "channel"
);
record_id!(
    /// Id of a CRM case.
    CaseId,
    "case"
);
record_id!(
    /// Id of a CRM case comment.
    CaseCommentId,
    "case-comment"
);
record_id!(
    /// Id of a CRM user.
    CrmUserId,
    "crm-user"
);
record_id!(
    /// Id of a CRM contact.
    ContactId,
    "contact"
);

/// Reference from one synced record to another.
///
/// Inbound records carry only the remote side (`origin_id`); refreshing them
/// against the store fills in the local id. Identity comparison prefers the
/// origin id and falls back to the local id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SyncRef {
    /// Local id, once the referenced record is known locally.
    pub id: Option<LocalId>,
    /// Remote id, once the referenced record exists in Zendesk.
    pub origin_id: Option<OriginId>,
}

impl SyncRef {
    /// Creates a reference from both sides.
    #[must_use]
    pub const fn new(id: Option<LocalId>, origin_id: Option<OriginId>) -> Self {
        Self { id, origin_id }
    }

    /// A reference to a record known only locally.
    #[must_use]
    pub const fn local(id: LocalId) -> Self {
        Self::new(Some(id), None)
    }

    /// A reference to a record known only remotely.
    #[must_use]
    pub const fn remote(origin_id: OriginId) -> Self {
        Self::new(None, Some(origin_id))
    }

    /// Returns true once the reference points at a local record.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.id.is_some()
    }

    /// Compares two references by identity.
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        match (self.origin_id, other.origin_id) {
            (Some(a), Some(b)) => a == b,
            _ => matches!((self.id, other.id), (Some(a), Some(b)) if a == b),
        }
    }
}

/// Compares two optional references by identity; two absent references match.
#[must_use]
pub fn same_reference(a: Option<&SyncRef>, b: Option<&SyncRef>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.same_identity(b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_prefix() {
        assert_eq!(OriginId::new(42).to_string(), "origin:42");
        assert_eq!(CaseCommentId::new(7).to_string(), "case-comment:7");
        assert_eq!(format!("{:?}", LocalId::new(3)), "LocalId(3)");
    }

    #[test]
    fn raw_roundtrip() {
        let id = ChannelId::from_raw(9);
        assert_eq!(id.raw(), 9);
        assert_eq!(id.as_u64(), 9);
    }

    #[test]
    fn identity_prefers_origin_id() {
        let a = SyncRef::new(Some(LocalId::new(1)), Some(OriginId::new(10)));
        let b = SyncRef::new(Some(LocalId::new(2)), Some(OriginId::new(10)));
        assert!(a.same_identity(&b));

        let c = SyncRef::new(Some(LocalId::new(1)), Some(OriginId::new(11)));
        assert!(!a.same_identity(&c));
    }

    #[test]
    fn identity_falls_back_to_local_id() {
        let a = SyncRef::local(LocalId::new(5));
        let b = SyncRef::new(Some(LocalId::new(5)), Some(OriginId::new(50)));
        assert!(a.same_identity(&b));
        assert!(!SyncRef::default().same_identity(&SyncRef::default()));
    }

    #[test]
    fn optional_references() {
        let a = SyncRef::remote(OriginId::new(1));
        assert!(same_reference(None, None));
        assert!(!same_reference(Some(&a), None));
        assert!(same_reference(Some(&a), Some(&a)));
    }

    #[test]
    fn serializes_transparently() {
        let json = serde_json::to_string(&OriginId::new(100)).unwrap();
        assert_eq!(json, "100");
    }
}

//! Storage-facing record metadata.
//!
//! Every persisted type declares the table it lives in and the secondary
//! keys it can be found by. Stores index records by these keys; they never
//! look inside record bodies.

use crate::ids::{CaseCommentId, CaseId, ChannelId, CrmUserId, LocalId, OriginId, RecordId, SyncRef};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Table a record type lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    /// Configured Zendesk channels.
    Channel,
    /// Zendesk users.
    User,
    /// Zendesk tickets.
    Ticket,
    /// Zendesk ticket comments.
    TicketComment,
    /// CRM cases.
    Case,
    /// CRM case comments.
    CaseComment,
    /// CRM users.
    CrmUser,
    /// CRM contacts.
    Contact,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Table::Channel => "channel",
            Table::User => "user",
            Table::Ticket => "ticket",
            Table::TicketComment => "ticket_comment",
            Table::Case => "case",
            Table::CaseComment => "case_comment",
            Table::CrmUser => "crm_user",
            Table::Contact => "contact",
        };
        f.write_str(name)
    }
}

/// Secondary key a record can be found by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexKey {
    /// Remote id within a channel.
    Origin {
        /// Owning channel.
        channel: ChannelId,
        /// Remote id.
        origin_id: OriginId,
    },
    /// Primary email, optionally scoped to a channel. Always lowercase.
    Email {
        /// Owning channel, for channel-scoped records.
        channel: Option<ChannelId>,
        /// Normalized email.
        email: String,
    },
    /// Secondary email of a CRM user. Always lowercase.
    SecondaryEmail(String),
    /// Record linked to a CRM case.
    Case(CaseId),
    /// Record linked to a CRM case comment.
    CaseComment(CaseCommentId),
    /// Comment owned by a ticket.
    Ticket(LocalId),
    /// Zendesk user linked to a CRM user within a channel.
    CrmUser {
        /// Owning channel.
        channel: ChannelId,
        /// Linked CRM user.
        user: CrmUserId,
    },
}

impl IndexKey {
    /// Email key with normalization applied.
    #[must_use]
    pub fn email(channel: Option<ChannelId>, email: &str) -> Self {
        IndexKey::Email {
            channel,
            email: normalize_email(email),
        }
    }

    /// Secondary email key with normalization applied.
    #[must_use]
    pub fn secondary_email(email: &str) -> Self {
        IndexKey::SecondaryEmail(normalize_email(email))
    }
}

/// Normalizes an email for use as a join key.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A persistable record.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Typed id of the record.
    type Id: RecordId;

    /// Table the record lives in.
    const TABLE: Table;

    /// Local id, once assigned.
    fn id(&self) -> Option<Self::Id>;

    /// Stores the id assigned by the store.
    fn assign_id(&mut self, id: Self::Id);

    /// Secondary keys the record is indexed by.
    fn index_keys(&self) -> Vec<IndexKey> {
        Vec::new()
    }
}

/// A record mirrored from a Zendesk account.
pub trait Synced: Record<Id = LocalId> {
    /// Remote id, once synced.
    fn origin_id(&self) -> Option<OriginId>;

    /// Owning channel.
    fn channel(&self) -> Option<ChannelId>;

    /// Attaches the record to a channel.
    fn set_channel(&mut self, channel: ChannelId);

    /// Reference to this record.
    fn sync_ref(&self) -> SyncRef {
        SyncRef::new(self.id(), self.origin_id())
    }

    /// Origin key, when both the channel and the origin id are known.
    fn origin_key(&self) -> Option<IndexKey> {
        match (self.channel(), self.origin_id()) {
            (Some(channel), Some(origin_id)) => Some(IndexKey::Origin { channel, origin_id }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_keys_are_normalized() {
        assert_eq!(
            IndexKey::email(None, "  Jane@Example.COM "),
            IndexKey::Email {
                channel: None,
                email: "jane@example.com".into()
            }
        );
        assert_eq!(
            IndexKey::secondary_email("A@X.com"),
            IndexKey::SecondaryEmail("a@x.com".into())
        );
    }

    #[test]
    fn table_display() {
        assert_eq!(Table::TicketComment.to_string(), "ticket_comment");
        assert_eq!(Table::CrmUser.to_string(), "crm_user");
    }
}

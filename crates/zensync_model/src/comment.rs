//! Zendesk ticket comment.

use crate::ids::{CaseCommentId, ChannelId, LocalId, OriginId, SyncRef};
use crate::record::{IndexKey, Record, Synced, Table};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A comment on a Zendesk ticket.
///
/// A comment without an owning ticket is invalid. A comment with no origin
/// id is pending export.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TicketComment {
    /// Local id.
    pub id: Option<LocalId>,
    /// Remote id; `None` while pending export.
    pub origin_id: Option<OriginId>,
    /// Owning channel.
    pub channel: Option<ChannelId>,
    /// Plain text body.
    pub body: String,
    /// HTML body as rendered by Zendesk.
    pub html_body: Option<String>,
    /// Visible to the requester.
    pub public: bool,
    /// Author.
    pub author: Option<SyncRef>,
    /// Owning ticket.
    pub ticket: Option<SyncRef>,
    /// Mirrored CRM case comment.
    pub related_comment: Option<CaseCommentId>,
    /// Remote creation time.
    pub origin_created_at: Option<DateTime<Utc>>,
}

impl TicketComment {
    /// Creates a public comment that is not yet synced.
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            public: true,
            ..Self::default()
        }
    }

    /// Returns true while the comment waits to be pushed.
    #[must_use]
    pub fn is_pending_export(&self) -> bool {
        self.origin_id.is_none()
    }
}

impl Record for TicketComment {
    type Id = LocalId;
    const TABLE: Table = Table::TicketComment;

    fn id(&self) -> Option<LocalId> {
        self.id
    }

    fn assign_id(&mut self, id: LocalId) {
        self.id = Some(id);
    }

    fn index_keys(&self) -> Vec<IndexKey> {
        let mut keys: Vec<IndexKey> = self.origin_key().into_iter().collect();
        if let Some(ticket) = self.ticket.and_then(|t| t.id) {
            keys.push(IndexKey::Ticket(ticket));
        }
        if let Some(related) = self.related_comment {
            keys.push(IndexKey::CaseComment(related));
        }
        keys
    }
}

impl Synced for TicketComment {
    fn origin_id(&self) -> Option<OriginId> {
        self.origin_id
    }

    fn channel(&self) -> Option<ChannelId> {
        self.channel
    }

    fn set_channel(&mut self, channel: ChannelId) {
        self.channel = Some(channel);
    }
}

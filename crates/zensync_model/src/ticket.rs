//! Zendesk ticket.

use crate::comment::TicketComment;
use crate::ids::{CaseId, ChannelId, LocalId, OriginId, SyncRef};
use crate::lookup::{TicketPriority, TicketStatus, TicketType};
use crate::record::{IndexKey, Record, Synced, Table};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which user reference of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketRole {
    /// Who asked.
    Requester,
    /// Who works on it.
    Assignee,
    /// Who filed it.
    Submitter,
}

impl TicketRole {
    /// All roles, in push order.
    pub const ALL: [TicketRole; 3] = [
        TicketRole::Requester,
        TicketRole::Assignee,
        TicketRole::Submitter,
    ];

    /// Lowercase role name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TicketRole::Requester => "requester",
            TicketRole::Assignee => "assignee",
            TicketRole::Submitter => "submitter",
        }
    }
}

/// A Zendesk ticket mirrored locally.
///
/// Comments are owned by the ticket and stored separately, keyed by the
/// ticket's local id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Ticket {
    /// Local id.
    pub id: Option<LocalId>,
    /// Remote id; `None` until first export.
    pub origin_id: Option<OriginId>,
    /// Owning channel.
    pub channel: Option<ChannelId>,
    /// API url of the remote ticket.
    pub url: Option<String>,
    /// External id set by integrations.
    pub external_id: Option<String>,
    /// Subject line.
    pub subject: String,
    /// Description (first comment body).
    pub description: String,
    /// Status.
    pub status: Option<TicketStatus>,
    /// Priority.
    pub priority: Option<TicketPriority>,
    /// Type.
    pub ticket_type: Option<TicketType>,
    /// Requesting user.
    pub requester: Option<SyncRef>,
    /// Assigned agent.
    pub assignee: Option<SyncRef>,
    /// Submitting user.
    pub submitter: Option<SyncRef>,
    /// Linked CRM case.
    pub related_case: Option<CaseId>,
    /// Local CRM edits wait to be pushed.
    #[serde(default)]
    pub pending_export: bool,
    /// Remote creation time.
    pub origin_created_at: Option<DateTime<Utc>>,
    /// Remote last update time.
    pub origin_updated_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Creates a local ticket that is not yet synced.
    pub fn new(subject: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    /// Returns true once the ticket exists remotely.
    #[must_use]
    pub fn is_synced(&self) -> bool {
        self.origin_id.is_some()
    }

    /// Returns a user reference.
    #[must_use]
    pub fn user(&self, role: TicketRole) -> Option<&SyncRef> {
        match role {
            TicketRole::Requester => self.requester.as_ref(),
            TicketRole::Assignee => self.assignee.as_ref(),
            TicketRole::Submitter => self.submitter.as_ref(),
        }
    }

    /// Replaces a user reference.
    pub fn set_user(&mut self, role: TicketRole, user: Option<SyncRef>) {
        match role {
            TicketRole::Requester => self.requester = user,
            TicketRole::Assignee => self.assignee = user,
            TicketRole::Submitter => self.submitter = user,
        }
    }

    /// Appends a comment: the comment now belongs to this ticket and channel.
    pub fn add_comment(&self, comment: &mut TicketComment) {
        comment.ticket = Some(self.sync_ref());
        if comment.channel.is_none() {
            comment.channel = self.channel;
        }
    }
}

impl Record for Ticket {
    type Id = LocalId;
    const TABLE: Table = Table::Ticket;

    fn id(&self) -> Option<LocalId> {
        self.id
    }

    fn assign_id(&mut self, id: LocalId) {
        self.id = Some(id);
    }

    fn index_keys(&self) -> Vec<IndexKey> {
        let mut keys: Vec<IndexKey> = self.origin_key().into_iter().collect();
        if let Some(case) = self.related_case {
            keys.push(IndexKey::Case(case));
        }
        keys
    }
}

impl Synced for Ticket {
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

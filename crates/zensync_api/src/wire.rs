//! JSON shapes of the Zendesk REST API.
//!
//! Lookup fields stay strings here; unknown values are dropped during
//! conversion instead of failing a whole page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A Zendesk user.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RemoteUser {
    /// Remote id; absent on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// API url.
    #[serde(default, skip_serializing)]
    pub url: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Role machine name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Active flag.
    #[serde(default, skip_serializing)]
    pub active: Option<bool>,
    /// Creation time.
    #[serde(default, skip_serializing)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default, skip_serializing)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A Zendesk ticket comment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RemoteComment {
    /// Remote id; absent on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Plain body.
    #[serde(default)]
    pub body: String,
    /// Rendered body.
    #[serde(default, skip_serializing)]
    pub html_body: Option<String>,
    /// Public flag.
    #[serde(default = "public_default")]
    pub public: bool,
    /// Author id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<u64>,
    /// Creation time.
    #[serde(default, skip_serializing)]
    pub created_at: Option<DateTime<Utc>>,
    /// Owning ticket id. Zendesk omits it; transports fill it in.
    #[serde(default, skip_serializing)]
    pub ticket_id: Option<u64>,
}

fn public_default() -> bool {
    true
}

/// A Zendesk ticket.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RemoteTicket {
    /// Remote id; absent on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// API url.
    #[serde(default, skip_serializing)]
    pub url: Option<String>,
    /// External id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    /// Subject.
    #[serde(default)]
    pub subject: String,
    /// Description. Read-only; set through the first comment.
    #[serde(default, skip_serializing)]
    pub description: String,
    /// Status machine name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Priority machine name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// Type machine name.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ticket_type: Option<String>,
    /// Requester id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester_id: Option<u64>,
    /// Assignee id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<u64>,
    /// Submitter id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitter_id: Option<u64>,
    /// Creation time.
    #[serde(default, skip_serializing)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default, skip_serializing)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Comment to add with this write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<RemoteComment>,
}

/// Result of creating a ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedTicket {
    /// The stored ticket.
    pub ticket: RemoteTicket,
    /// The initial comment, when Zendesk created one.
    pub comment: Option<RemoteComment>,
}

/// One record handed to an import processor.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteRecord {
    /// A user.
    User(RemoteUser),
    /// A ticket.
    Ticket(RemoteTicket),
    /// A ticket comment.
    Comment(RemoteComment),
}

impl RemoteRecord {
    /// Name of the record kind, for logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            RemoteRecord::User(_) => "user",
            RemoteRecord::Ticket(_) => "ticket",
            RemoteRecord::Comment(_) => "ticket_comment",
        }
    }

    /// Remote id of the record.
    pub fn id(&self) -> Option<u64> {
        match self {
            RemoteRecord::User(user) => user.id,
            RemoteRecord::Ticket(ticket) => ticket.id,
            RemoteRecord::Comment(comment) => comment.id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct UserEnvelope {
    pub user: RemoteUser,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct TicketEnvelope {
    pub ticket: RemoteTicket,
}

/// Response to a ticket write. Zendesk reports the comment it stored as an
/// audit event.
#[derive(Debug, Deserialize)]
pub(crate) struct TicketWrite {
    pub ticket: RemoteTicket,
    #[serde(default)]
    pub audit: Option<Audit>,
}

impl TicketWrite {
    /// The comment created by the write, if the audit lists one.
    pub fn comment(&self) -> Option<RemoteComment> {
        let event = self
            .audit
            .as_ref()?
            .events
            .iter()
            .find(|e| e.event_type == "Comment" && e.id.is_some())?;
        Some(RemoteComment {
            id: event.id,
            body: event.body.clone().unwrap_or_default(),
            html_body: event.html_body.clone(),
            public: event.public.unwrap_or(true),
            author_id: event.author_id,
            created_at: self.audit.as_ref().and_then(|a| a.created_at),
            ticket_id: self.ticket.id,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct Audit {
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub events: Vec<AuditEvent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuditEvent {
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub html_body: Option<String>,
    #[serde(default)]
    pub public: Option<bool>,
    #[serde(default)]
    pub author_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserPage {
    #[serde(default)]
    pub users: Vec<RemoteUser>,
    #[serde(default)]
    pub next_page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TicketPage {
    #[serde(default)]
    pub tickets: Vec<RemoteTicket>,
    #[serde(default)]
    pub next_page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentPage {
    #[serde(default)]
    pub comments: Vec<RemoteComment>,
    #[serde(default)]
    pub next_page: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_type_field_is_renamed() {
        let json = r#"{"id": 7, "subject": "s", "type": "incident", "status": "open"}"#;
        let ticket: RemoteTicket = serde_json::from_str(json).unwrap();
        assert_eq!(ticket.ticket_type.as_deref(), Some("incident"));

        let out = serde_json::to_value(&ticket).unwrap();
        assert_eq!(out["type"], "incident");
    }

    #[test]
    fn read_only_fields_are_not_sent() {
        let ticket = RemoteTicket {
            subject: "s".into(),
            description: "d".into(),
            url: Some("https://x".into()),
            ..RemoteTicket::default()
        };
        let out = serde_json::to_value(&ticket).unwrap();
        assert!(out.get("description").is_none());
        assert!(out.get("url").is_none());
        assert!(out.get("id").is_none());
    }

    #[test]
    fn comments_default_to_public() {
        let comment: RemoteComment = serde_json::from_str(r#"{"id": 1, "body": "hi"}"#).unwrap();
        assert!(comment.public);
    }
}

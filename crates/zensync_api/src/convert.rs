//! Conversions between wire shapes and model records.
//!
//! Inbound conversions produce detached records: no local id, no channel,
//! and references carrying only origin ids. Outbound conversions read
//! origin ids from references; unresolved references are left out.

use crate::wire::{RemoteComment, RemoteTicket, RemoteUser};
use zensync_model::{Lookup, OriginId, SyncRef, Ticket, TicketComment, User};

fn lookup<L: Lookup>(name: Option<&str>) -> Option<L> {
    let name = name?;
    let value = L::from_name(name);
    if value.is_none() {
        tracing::warn!(kind = L::KIND, value = name, "ignoring unknown lookup value");
    }
    value
}

fn remote_ref(id: Option<u64>) -> Option<SyncRef> {
    id.map(|id| SyncRef::remote(OriginId::new(id)))
}

fn origin_of(reference: Option<&SyncRef>) -> Option<u64> {
    reference.and_then(|r| r.origin_id).map(OriginId::as_u64)
}

impl From<&RemoteUser> for User {
    fn from(remote: &RemoteUser) -> Self {
        User {
            origin_id: remote.id.map(OriginId::new),
            url: remote.url.clone(),
            name: remote.name.clone(),
            email: remote.email.clone(),
            phone: remote.phone.clone(),
            role: lookup(remote.role.as_deref()),
            active: remote.active.unwrap_or(true),
            origin_created_at: remote.created_at,
            origin_updated_at: remote.updated_at,
            ..User::default()
        }
    }
}

impl From<&User> for RemoteUser {
    fn from(user: &User) -> Self {
        RemoteUser {
            id: user.origin_id.map(OriginId::as_u64),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            role: user.role.map(|r| r.name().to_string()),
            ..RemoteUser::default()
        }
    }
}

impl From<&RemoteTicket> for Ticket {
    fn from(remote: &RemoteTicket) -> Self {
        Ticket {
            origin_id: remote.id.map(OriginId::new),
            url: remote.url.clone(),
            external_id: remote.external_id.clone(),
            subject: remote.subject.clone(),
            description: remote.description.clone(),
            status: lookup(remote.status.as_deref()),
            priority: lookup(remote.priority.as_deref()),
            ticket_type: lookup(remote.ticket_type.as_deref()),
            requester: remote_ref(remote.requester_id),
            assignee: remote_ref(remote.assignee_id),
            submitter: remote_ref(remote.submitter_id),
            origin_created_at: remote.created_at,
            origin_updated_at: remote.updated_at,
            ..Ticket::default()
        }
    }
}

impl From<&Ticket> for RemoteTicket {
    fn from(ticket: &Ticket) -> Self {
        RemoteTicket {
            id: ticket.origin_id.map(OriginId::as_u64),
            external_id: ticket.external_id.clone(),
            subject: ticket.subject.clone(),
            description: ticket.description.clone(),
            status: ticket.status.map(|s| s.name().to_string()),
            priority: ticket.priority.map(|p| p.name().to_string()),
            ticket_type: ticket.ticket_type.map(|t| t.name().to_string()),
            requester_id: origin_of(ticket.requester.as_ref()),
            assignee_id: origin_of(ticket.assignee.as_ref()),
            submitter_id: origin_of(ticket.submitter.as_ref()),
            ..RemoteTicket::default()
        }
    }
}

impl From<&RemoteComment> for TicketComment {
    fn from(remote: &RemoteComment) -> Self {
        TicketComment {
            origin_id: remote.id.map(OriginId::new),
            body: remote.body.clone(),
            html_body: remote.html_body.clone(),
            public: remote.public,
            author: remote_ref(remote.author_id),
            ticket: remote_ref(remote.ticket_id),
            origin_created_at: remote.created_at,
            ..TicketComment::default()
        }
    }
}

impl From<&TicketComment> for RemoteComment {
    fn from(comment: &TicketComment) -> Self {
        RemoteComment {
            id: comment.origin_id.map(OriginId::as_u64),
            body: comment.body.clone(),
            public: comment.public,
            author_id: origin_of(comment.author.as_ref()),
            ticket_id: origin_of(comment.ticket.as_ref()),
            ..RemoteComment::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zensync_model::{LocalId, TicketPriority, TicketStatus, UserRole};

    #[test]
    fn inbound_ticket_carries_remote_refs() {
        let remote = RemoteTicket {
            id: Some(100),
            subject: "Printer".into(),
            status: Some("hold".into()),
            priority: Some("urgent".into()),
            requester_id: Some(42),
            ..RemoteTicket::default()
        };
        let ticket = Ticket::from(&remote);
        assert_eq!(ticket.origin_id, Some(OriginId::new(100)));
        assert_eq!(ticket.status, Some(TicketStatus::Hold));
        assert_eq!(ticket.priority, Some(TicketPriority::Urgent));
        assert_eq!(ticket.requester, Some(SyncRef::remote(OriginId::new(42))));
        assert!(ticket.assignee.is_none());
        assert!(ticket.id.is_none());
    }

    #[test]
    fn unknown_lookup_is_dropped() {
        let remote = RemoteUser {
            id: Some(1),
            role: Some("superhero".into()),
            ..RemoteUser::default()
        };
        assert!(User::from(&remote).role.is_none());
    }

    #[test]
    fn outbound_ticket_skips_unresolved_refs() {
        let mut ticket = Ticket::new("s", "d");
        ticket.requester = Some(SyncRef::local(LocalId::new(3)));
        ticket.assignee = Some(SyncRef::new(Some(LocalId::new(4)), Some(OriginId::new(44))));

        let remote = RemoteTicket::from(&ticket);
        assert_eq!(remote.requester_id, None);
        assert_eq!(remote.assignee_id, Some(44));
        assert_eq!(remote.id, None);
    }

    #[test]
    fn user_role_goes_out_by_name() {
        let mut user = User::new("Eve", Some("eve@x.com".into()));
        user.role = Some(UserRole::EndUser);
        assert_eq!(RemoteUser::from(&user).role.as_deref(), Some("end-user"));
    }
}

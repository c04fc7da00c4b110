//! Mapping between Zendesk tickets and CRM cases.
//!
//! Status and priority mappings are fixed. A ticket with no counterpart
//! value (no status, no priority) leaves the case field alone.

use crate::changes::{TicketChanges, TicketField};
use zensync_model::{
    Case, CaseComment, CaseId, CasePriority, CaseStatus, CrmUserId, Ticket, TicketComment,
    TicketPriority, TicketStatus,
};

/// Case status for a ticket status.
pub fn case_status(status: TicketStatus) -> CaseStatus {
    match status {
        TicketStatus::New | TicketStatus::Open => CaseStatus::Open,
        TicketStatus::Pending | TicketStatus::Hold => CaseStatus::InProgress,
        TicketStatus::Solved => CaseStatus::Resolved,
        TicketStatus::Closed => CaseStatus::Closed,
    }
}

/// Case priority for a ticket priority.
pub fn case_priority(priority: TicketPriority) -> CasePriority {
    match priority {
        TicketPriority::Low => CasePriority::Low,
        TicketPriority::Normal => CasePriority::Normal,
        TicketPriority::High | TicketPriority::Urgent => CasePriority::High,
    }
}

/// Ticket status for a case status.
pub fn ticket_status(status: CaseStatus) -> TicketStatus {
    match status {
        CaseStatus::Open => TicketStatus::Open,
        CaseStatus::InProgress => TicketStatus::Pending,
        CaseStatus::Resolved => TicketStatus::Solved,
        CaseStatus::Closed => TicketStatus::Closed,
    }
}

/// Ticket priority for a case priority.
pub fn ticket_priority(priority: CasePriority) -> TicketPriority {
    match priority {
        CasePriority::Low => TicketPriority::Low,
        CasePriority::Normal => TicketPriority::Normal,
        CasePriority::High => TicketPriority::High,
    }
}

/// Builds a new case mirroring a ticket.
pub fn case_from_ticket(ticket: &Ticket, owner: Option<CrmUserId>) -> Case {
    Case {
        subject: ticket.subject.clone(),
        description: ticket.description.clone(),
        status: ticket.status.map(case_status),
        priority: ticket.priority.map(case_priority),
        owner,
        updated_at: ticket.origin_updated_at,
        ..Case::default()
    }
}

/// Builds a case comment mirroring a ticket comment.
pub fn case_comment_from_ticket_comment(comment: &TicketComment, case: CaseId) -> CaseComment {
    CaseComment {
        message: comment.body.clone(),
        public: comment.public,
        created_at: comment.origin_created_at,
        ..CaseComment::new(case, "")
    }
}

/// Builds a pending ticket comment for a case comment that has none.
pub fn ticket_comment_from_case_comment(ticket: &Ticket, comment: &CaseComment) -> TicketComment {
    let mut ticket_comment = TicketComment::new(comment.message.clone());
    ticket_comment.public = comment.public;
    ticket_comment.related_comment = comment.id;
    ticket.add_comment(&mut ticket_comment);
    ticket_comment
}

/// Ticket changes that carry a case edit back to Zendesk.
pub fn ticket_changes_from_case(case: &Case, ticket: &Ticket) -> TicketChanges {
    let mut changes = TicketChanges::new();
    if ticket.subject != case.subject {
        changes.push(TicketField::Subject(case.subject.clone()));
    }
    if let Some(status) = case.status.map(ticket_status) {
        // Hold and New have no case counterpart; keep them while the case agrees.
        if ticket.status.map(case_status) != case.status {
            changes.push(TicketField::Status(Some(status)));
        }
    }
    if let Some(priority) = case.priority.map(ticket_priority) {
        if ticket.priority.map(case_priority) != case.priority {
            changes.push(TicketField::Priority(Some(priority)));
        }
    }
    changes
}

/// Applies a locally edited case onto its ticket.
///
/// Marks the ticket for export and returns true when anything changed.
pub fn apply_case_to_ticket(case: &Case, ticket: &mut Ticket) -> bool {
    let changed = ticket_changes_from_case(case, ticket).apply(ticket) > 0;
    if changed {
        ticket.pending_export = true;
    }
    changed
}

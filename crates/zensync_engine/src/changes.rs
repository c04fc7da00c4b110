//! Explicit field-level change sets.
//!
//! A change set is an ordered list of field assignments calculated from a
//! "before" and an "after" state. Calculating never touches either state;
//! [`ChangeSet::apply`] consumes the set and writes it onto a target.

use chrono::{DateTime, Utc};
use std::fmt;
use zensync_model::{
    Case, CasePriority, CaseStatus, ContactId, CrmUserId, OriginId, SyncRef, Ticket,
    TicketPriority, TicketStatus, TicketType,
};

/// A single field assignment on a target type.
pub trait FieldSet: Clone + fmt::Debug + PartialEq {
    /// Record the assignment writes to.
    type Target;

    /// Field name, for logging.
    fn name(&self) -> &'static str;

    /// Writes the value. Returns true if the field changed.
    fn apply_to(self, target: &mut Self::Target) -> bool;
}

/// Ordered field assignments for one target.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet<F> {
    ops: Vec<F>,
}

impl<F> Default for ChangeSet<F> {
    fn default() -> Self {
        Self { ops: Vec::new() }
    }
}

impl<F: FieldSet> ChangeSet<F> {
    /// Creates an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an assignment.
    pub fn push(&mut self, op: F) {
        self.ops.push(op);
    }

    /// Number of assignments.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if there is nothing to apply.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The assignments, in order.
    pub fn ops(&self) -> &[F] {
        &self.ops
    }

    /// Names of the assigned fields.
    pub fn field_names(&self) -> Vec<&'static str> {
        self.ops.iter().map(FieldSet::name).collect()
    }

    /// Writes every assignment onto `target`, returning how many fields
    /// actually changed.
    pub fn apply(self, target: &mut F::Target) -> usize {
        let mut changed = 0;
        for op in self.ops {
            if op.apply_to(target) {
                changed += 1;
            }
        }
        changed
    }
}

fn assign<V: PartialEq>(slot: &mut V, value: V) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

/// Assignable ticket fields.
#[derive(Debug, Clone, PartialEq)]
pub enum TicketField {
    /// Subject line.
    Subject(String),
    /// Description (first comment body).
    Description(String),
    /// Status.
    Status(Option<TicketStatus>),
    /// Priority.
    Priority(Option<TicketPriority>),
    /// Type.
    Type(Option<TicketType>),
    /// Requester reference.
    Requester(Option<SyncRef>),
    /// Assignee reference.
    Assignee(Option<SyncRef>),
    /// Submitter reference.
    Submitter(Option<SyncRef>),
    /// Remote URL.
    Url(Option<String>),
    /// External id.
    ExternalId(Option<String>),
    /// Zendesk id.
    OriginId(Option<OriginId>),
    /// Remote creation time.
    OriginCreatedAt(Option<DateTime<Utc>>),
    /// Remote update time.
    OriginUpdatedAt(Option<DateTime<Utc>>),
}

impl FieldSet for TicketField {
    type Target = Ticket;

    fn name(&self) -> &'static str {
        match self {
            TicketField::Subject(_) => "subject",
            TicketField::Description(_) => "description",
            TicketField::Status(_) => "status",
            TicketField::Priority(_) => "priority",
            TicketField::Type(_) => "type",
            TicketField::Requester(_) => "requester",
            TicketField::Assignee(_) => "assignee",
            TicketField::Submitter(_) => "submitter",
            TicketField::Url(_) => "url",
            TicketField::ExternalId(_) => "external_id",
            TicketField::OriginId(_) => "origin_id",
            TicketField::OriginCreatedAt(_) => "origin_created_at",
            TicketField::OriginUpdatedAt(_) => "origin_updated_at",
        }
    }

    fn apply_to(self, ticket: &mut Ticket) -> bool {
        match self {
            TicketField::Subject(v) => assign(&mut ticket.subject, v),
            TicketField::Description(v) => assign(&mut ticket.description, v),
            TicketField::Status(v) => assign(&mut ticket.status, v),
            TicketField::Priority(v) => assign(&mut ticket.priority, v),
            TicketField::Type(v) => assign(&mut ticket.ticket_type, v),
            TicketField::Requester(v) => assign(&mut ticket.requester, v),
            TicketField::Assignee(v) => assign(&mut ticket.assignee, v),
            TicketField::Submitter(v) => assign(&mut ticket.submitter, v),
            TicketField::Url(v) => assign(&mut ticket.url, v),
            TicketField::ExternalId(v) => assign(&mut ticket.external_id, v),
            TicketField::OriginId(v) => assign(&mut ticket.origin_id, v),
            TicketField::OriginCreatedAt(v) => assign(&mut ticket.origin_created_at, v),
            TicketField::OriginUpdatedAt(v) => assign(&mut ticket.origin_updated_at, v),
        }
    }
}

/// Assignable case fields.
#[derive(Debug, Clone, PartialEq)]
pub enum CaseField {
    /// Subject line.
    Subject(String),
    /// Description.
    Description(String),
    /// Status.
    Status(Option<CaseStatus>),
    /// Priority.
    Priority(Option<CasePriority>),
    /// Assigned CRM user.
    AssignedTo(Option<CrmUserId>),
    /// Related CRM contact.
    RelatedContact(Option<ContactId>),
}

impl FieldSet for CaseField {
    type Target = Case;

    fn name(&self) -> &'static str {
        match self {
            CaseField::Subject(_) => "subject",
            CaseField::Description(_) => "description",
            CaseField::Status(_) => "status",
            CaseField::Priority(_) => "priority",
            CaseField::AssignedTo(_) => "assigned_to",
            CaseField::RelatedContact(_) => "related_contact",
        }
    }

    fn apply_to(self, case: &mut Case) -> bool {
        match self {
            CaseField::Subject(v) => assign(&mut case.subject, v),
            CaseField::Description(v) => assign(&mut case.description, v),
            CaseField::Status(v) => assign(&mut case.status, v),
            CaseField::Priority(v) => assign(&mut case.priority, v),
            CaseField::AssignedTo(v) => assign(&mut case.assigned_to, v),
            CaseField::RelatedContact(v) => assign(&mut case.related_contact, v),
        }
    }
}

/// Changes to a ticket.
pub type TicketChanges = ChangeSet<TicketField>;

/// Changes to a case.
pub type CaseChanges = ChangeSet<CaseField>;

#[cfg(test)]
mod tests {
    use super::*;
    use zensync_model::LocalId;

    #[test]
    fn empty_set_is_noop() {
        let mut ticket = Ticket::new("a", "b");
        let before = ticket.clone();
        assert_eq!(TicketChanges::new().apply(&mut ticket), 0);
        assert_eq!(ticket, before);
    }

    #[test]
    fn apply_counts_real_changes() {
        let mut ticket = Ticket::new("a", "b");
        let mut changes = TicketChanges::new();
        changes.push(TicketField::Subject("a".into()));
        changes.push(TicketField::Status(Some(TicketStatus::Open)));
        changes.push(TicketField::Requester(Some(SyncRef::local(LocalId::new(1)))));

        assert_eq!(changes.field_names(), ["subject", "status", "requester"]);
        assert_eq!(changes.clone().apply(&mut ticket), 2);
        assert_eq!(ticket.status, Some(TicketStatus::Open));
        assert_eq!(changes.apply(&mut ticket), 0);
    }

    #[test]
    fn case_fields() {
        let mut case = Case::new("old");
        let mut changes = CaseChanges::new();
        changes.push(CaseField::Subject("new".into()));
        changes.push(CaseField::AssignedTo(Some(CrmUserId::new(4))));
        assert_eq!(changes.len(), 2);
        assert_eq!(changes.apply(&mut case), 2);
        assert_eq!(case.subject, "new");
        assert_eq!(case.assigned_to, Some(CrmUserId::new(4)));
    }

    #[test]
    fn later_ops_win() {
        let mut case = Case::new("a");
        let mut changes = CaseChanges::new();
        changes.push(CaseField::Subject("b".into()));
        changes.push(CaseField::Subject("c".into()));
        changes.apply(&mut case);
        assert_eq!(case.subject, "c");
    }
}

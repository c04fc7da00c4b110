use super::{SyncHelper, SyncScope};
use crate::changes::{CaseChanges, CaseField, TicketChanges, TicketField};
use crate::error::{SyncError, SyncResult};
use crate::kind::EntityKind;
use crate::linkage;
use zensync_api::{RemoteRecord, RemoteTicket};
use zensync_model::{
    same_reference, Case, CaseId, IndexKey, SyncPriority, SyncRef, Synced, Ticket, TicketRole,
    User,
};
use zensync_store::EntityStore;

/// Sync rules for Zendesk tickets.
#[derive(Debug)]
pub struct TicketSyncHelper<'a, S> {
    scope: SyncScope<'a, S>,
}

impl<'a, S: EntityStore> TicketSyncHelper<'a, S> {
    /// Creates a helper.
    pub fn new(scope: SyncScope<'a, S>) -> Self {
        Self { scope }
    }

    /// Converts a remote ticket and refreshes it against the local store.
    pub fn refresh_ticket(&self, remote: &RemoteTicket) -> SyncResult<Ticket> {
        let mut ticket = Ticket::from(remote);
        self.refresh_entity(&mut ticket)?;
        Ok(ticket)
    }

    /// Finds the ticket linked to a case.
    pub fn find_by_case(&self, case: CaseId) -> SyncResult<Option<Ticket>> {
        Ok(self
            .scope
            .store
            .find_all::<Ticket>(&IndexKey::Case(case))?
            .into_iter()
            .find(|t| t.channel == Some(self.scope.channel.id)))
    }

    /// Field changes that turn `target` into `source`.
    ///
    /// References compare by identity; a local reference and a remote one
    /// naming the same user are equal.
    pub fn calculate_ticket_changes(&self, target: &Ticket, source: &Ticket) -> TicketChanges {
        let mut changes = TicketChanges::new();
        if target.subject != source.subject {
            changes.push(TicketField::Subject(source.subject.clone()));
        }
        if target.description != source.description {
            changes.push(TicketField::Description(source.description.clone()));
        }
        if target.status != source.status {
            changes.push(TicketField::Status(source.status));
        }
        if target.priority != source.priority {
            changes.push(TicketField::Priority(source.priority));
        }
        if target.ticket_type != source.ticket_type {
            changes.push(TicketField::Type(source.ticket_type));
        }
        for role in TicketRole::ALL {
            let (before, after) = (target.user(role), source.user(role));
            if !same_reference(before, after) {
                let value = after.copied();
                changes.push(match role {
                    TicketRole::Requester => TicketField::Requester(value),
                    TicketRole::Assignee => TicketField::Assignee(value),
                    TicketRole::Submitter => TicketField::Submitter(value),
                });
            }
        }
        if target.url != source.url {
            changes.push(TicketField::Url(source.url.clone()));
        }
        if target.external_id != source.external_id {
            changes.push(TicketField::ExternalId(source.external_id.clone()));
        }
        if source.origin_id.is_some() && target.origin_id != source.origin_id {
            changes.push(TicketField::OriginId(source.origin_id));
        }
        if target.origin_created_at != source.origin_created_at {
            changes.push(TicketField::OriginCreatedAt(source.origin_created_at));
        }
        if target.origin_updated_at != source.origin_updated_at {
            changes.push(TicketField::OriginUpdatedAt(source.origin_updated_at));
        }
        changes
    }

    /// Case changes that mirror a ticket onto its case.
    ///
    /// The assignee maps to its linked CRM user and the requester to its
    /// linked contact. Ticket values without a CRM counterpart leave the
    /// case field as it is.
    pub fn calculate_related_case_changes(
        &self,
        ticket: &Ticket,
        case: &Case,
    ) -> SyncResult<CaseChanges> {
        let mut changes = CaseChanges::new();
        if case.subject != ticket.subject {
            changes.push(CaseField::Subject(ticket.subject.clone()));
        }
        if case.description != ticket.description {
            changes.push(CaseField::Description(ticket.description.clone()));
        }
        if let Some(status) = ticket.status.map(linkage::case_status) {
            if case.status != Some(status) {
                changes.push(CaseField::Status(Some(status)));
            }
        }
        if let Some(priority) = ticket.priority.map(linkage::case_priority) {
            if case.priority != Some(priority) {
                changes.push(CaseField::Priority(Some(priority)));
            }
        }
        if let Some(assignee) = self.linked_user(ticket.assignee.as_ref())? {
            if assignee.related_user.is_some() && case.assigned_to != assignee.related_user {
                changes.push(CaseField::AssignedTo(assignee.related_user));
            }
        }
        if let Some(requester) = self.linked_user(ticket.requester.as_ref())? {
            if requester.related_contact.is_some()
                && case.related_contact != requester.related_contact
            {
                changes.push(CaseField::RelatedContact(requester.related_contact));
            }
        }
        Ok(changes)
    }

    /// Applies the related case changes of a ticket and saves the case.
    ///
    /// Returns the number of changed case fields.
    pub fn update_related_case(&self, ticket: &Ticket) -> SyncResult<usize> {
        let Some(case_id) = ticket.related_case else {
            return Ok(0);
        };
        let Some(mut case) = self.scope.store.get::<Case>(case_id)? else {
            return Ok(0);
        };
        let changes = self.calculate_related_case_changes(ticket, &case)?;
        if changes.is_empty() {
            return Ok(0);
        }
        tracing::debug!(fields = ?changes.field_names(), "updating related case");
        let changed = changes.apply(&mut case);
        self.scope.store.save(&mut case)?;
        Ok(changed)
    }

    /// Applies a locally edited case onto its ticket and saves the ticket
    /// for export. Returns the ticket when it changed.
    pub fn apply_case(&self, case: &Case) -> SyncResult<Option<Ticket>> {
        let Some(case_id) = case.id else {
            return Ok(None);
        };
        let Some(mut ticket) = self.find_by_case(case_id)? else {
            return Ok(None);
        };
        let mut changed = linkage::apply_case_to_ticket(case, &mut ticket);
        if let Some(assigned) = case.assigned_to {
            if let Some(user) = self.scope.resolver().find_user_for_crm_user(assigned)? {
                let current = ticket.assignee;
                if !same_reference(current.as_ref(), Some(&user.sync_ref())) {
                    ticket.assignee = Some(user.sync_ref());
                    ticket.pending_export = true;
                    changed = true;
                }
            }
        }
        if !changed {
            return Ok(None);
        }
        self.scope.store.save(&mut ticket)?;
        Ok(Some(ticket))
    }

    fn linked_user(&self, reference: Option<&SyncRef>) -> SyncResult<Option<User>> {
        match reference {
            Some(reference) => Ok(self.scope.resolver().resolve(reference)?),
            None => Ok(None),
        }
    }

    fn keeps_local_fields(&self, ticket: &Ticket) -> bool {
        ticket.pending_export && self.scope.channel.settings.sync_priority == SyncPriority::Local
    }

    fn create_related_case(&self, ticket: &mut Ticket) -> SyncResult<()> {
        let mut case = linkage::case_from_ticket(ticket, self.scope.default_owner());
        self.calculate_related_case_changes(ticket, &case)?.apply(&mut case);
        let case_id = self.scope.store.save(&mut case)?;
        ticket.related_case = Some(case_id);
        tracing::info!(case = %case_id, "created related case");
        Ok(())
    }
}

impl<S: EntityStore> SyncHelper for TicketSyncHelper<'_, S> {
    type Entity = Ticket;
    const ENTITY: EntityKind = EntityKind::Ticket;

    fn extract(&self, record: RemoteRecord) -> SyncResult<Ticket> {
        match record {
            RemoteRecord::Ticket(remote) => Ok(Ticket::from(&remote)),
            other => Err(SyncError::TypeMismatch {
                expected: Self::ENTITY,
                found: other.kind(),
            }),
        }
    }

    fn refresh_entity(&self, ticket: &mut Ticket) -> SyncResult<()> {
        ticket.channel = Some(self.scope.channel.id);
        for role in TicketRole::ALL {
            if let Some(reference) = ticket.user(role).copied() {
                let resolved = self.scope.resolve_user_ref(&reference)?;
                ticket.set_user(role, Some(resolved));
            }
        }
        Ok(())
    }

    fn find_entity(&self, ticket: &Ticket) -> SyncResult<Option<Ticket>> {
        match ticket.origin_id {
            Some(origin_id) => Ok(self.scope.resolver().find_ticket(origin_id)?),
            None => Ok(None),
        }
    }

    fn copy_entity_properties(&self, target: &mut Ticket, source: &Ticket) {
        let keep_local = self.keeps_local_fields(target);
        let mut changes = TicketChanges::new();
        for op in self.calculate_ticket_changes(target, source).ops() {
            let scalar = matches!(
                op,
                TicketField::Subject(_)
                    | TicketField::Description(_)
                    | TicketField::Status(_)
                    | TicketField::Priority(_)
                    | TicketField::Type(_)
            );
            if keep_local && scalar {
                continue;
            }
            changes.push(op.clone());
        }
        changes.apply(target);
    }

    fn sync_related_entities(&self, ticket: &mut Ticket) -> SyncResult<()> {
        for role in TicketRole::ALL {
            if let Some(reference) = ticket.user(role).copied() {
                let resolved = self.scope.ensure_user(&reference)?;
                ticket.set_user(role, Some(resolved));
            }
        }

        if self.keeps_local_fields(ticket) {
            tracing::debug!("local changes pending, related case left as is");
            return Ok(());
        }
        let case_exists = match ticket.related_case {
            Some(case_id) => self.scope.store.get::<Case>(case_id)?.is_some(),
            None => false,
        };
        if case_exists {
            self.update_related_case(ticket)?;
        } else {
            self.create_related_case(ticket)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use zensync_model::{
        CasePriority, CaseStatus, Channel, ChannelId, ContactId, CrmUserId, LocalId, OriginId,
        TicketPriority, TicketStatus, ZendeskCredentials,
    };
    use zensync_store::InMemoryStore;

    fn channel() -> Channel {
        let mut channel = Channel::new(ChannelId::new(1), "Acme", ZendeskCredentials::default());
        channel.settings.default_user_owner = Some(CrmUserId::new(77));
        channel
    }

    fn synced_user(store: &InMemoryStore, origin: u64) -> User {
        let mut user = User::new("Jane", None);
        user.channel = Some(ChannelId::new(1));
        user.origin_id = Some(OriginId::new(origin));
        store.save(&mut user).unwrap();
        user
    }

    #[test]
    fn ticket_changes_compare_refs_by_identity() {
        let store = InMemoryStore::new();
        let channel = channel();
        let config = SyncConfig::default();
        let helper = TicketSyncHelper::new(SyncScope::new(&store, &channel, &config));

        let mut local = Ticket::new("Printer", "On fire");
        local.requester = Some(SyncRef::new(Some(LocalId::new(1)), Some(OriginId::new(42))));
        let mut remote = local.clone();
        remote.requester = Some(SyncRef::remote(OriginId::new(42)));
        remote.status = Some(TicketStatus::Open);

        let changes = helper.calculate_ticket_changes(&local, &remote);
        assert_eq!(changes.field_names(), ["status"]);
        assert!(local.status.is_none());
    }

    #[test]
    fn refresh_resolves_known_users_only() {
        let store = InMemoryStore::new();
        let known = synced_user(&store, 42);
        let channel = channel();
        let config = SyncConfig::default();
        let helper = TicketSyncHelper::new(SyncScope::new(&store, &channel, &config));

        let mut ticket = Ticket::new("Printer", "On fire");
        ticket.requester = Some(SyncRef::remote(OriginId::new(42)));
        ticket.assignee = Some(SyncRef::remote(OriginId::new(43)));
        helper.refresh_entity(&mut ticket).unwrap();

        assert_eq!(ticket.channel, Some(ChannelId::new(1)));
        assert_eq!(ticket.requester.and_then(|r| r.id), known.id);
        assert!(!ticket.assignee.unwrap().is_resolved());
        assert_eq!(store.all::<User>().unwrap().len(), 1);
    }

    #[test]
    fn cascade_creates_case_and_stubs_users() {
        let store = InMemoryStore::new();
        let channel = channel();
        let config = SyncConfig::default();
        let helper = TicketSyncHelper::new(SyncScope::new(&store, &channel, &config));

        let mut ticket = Ticket::new("Printer", "On fire");
        ticket.channel = Some(ChannelId::new(1));
        ticket.status = Some(TicketStatus::Pending);
        ticket.priority = Some(TicketPriority::Urgent);
        ticket.requester = Some(SyncRef::remote(OriginId::new(42)));
        ticket.submitter = Some(SyncRef::remote(OriginId::new(42)));
        helper.sync_related_entities(&mut ticket).unwrap();

        assert!(ticket.requester.unwrap().is_resolved());
        assert_eq!(ticket.requester, ticket.submitter);
        assert_eq!(store.all::<User>().unwrap().len(), 1);

        let case: Case = store.get(ticket.related_case.unwrap()).unwrap().unwrap();
        assert_eq!(case.subject, "Printer");
        assert_eq!(case.status, Some(CaseStatus::InProgress));
        assert_eq!(case.priority, Some(CasePriority::High));
        assert_eq!(case.owner, Some(CrmUserId::new(77)));
    }

    #[test]
    fn related_case_follows_linked_users() {
        let store = InMemoryStore::new();
        let mut agent = synced_user(&store, 1);
        agent.related_user = Some(CrmUserId::new(5));
        store.save(&mut agent).unwrap();
        let mut requester = synced_user(&store, 2);
        requester.related_contact = Some(ContactId::new(8));
        store.save(&mut requester).unwrap();

        let channel = channel();
        let config = SyncConfig::default();
        let helper = TicketSyncHelper::new(SyncScope::new(&store, &channel, &config));

        let mut case = Case::new("Printer");
        store.save(&mut case).unwrap();

        let mut ticket = Ticket::new("Printer", "");
        ticket.channel = Some(ChannelId::new(1));
        ticket.assignee = Some(agent.sync_ref());
        ticket.requester = Some(requester.sync_ref());
        ticket.status = Some(TicketStatus::Solved);
        ticket.related_case = case.id;

        assert_eq!(helper.update_related_case(&ticket).unwrap(), 3);
        let case: Case = store.get(case.id.unwrap()).unwrap().unwrap();
        assert_eq!(case.assigned_to, Some(CrmUserId::new(5)));
        assert_eq!(case.related_contact, Some(ContactId::new(8)));
        assert_eq!(case.status, Some(CaseStatus::Resolved));
        assert_eq!(helper.update_related_case(&ticket).unwrap(), 0);
    }

    #[test]
    fn local_priority_keeps_pending_fields() {
        let store = InMemoryStore::new();
        let mut channel = channel();
        channel.settings.sync_priority = SyncPriority::Local;
        let config = SyncConfig::default();
        let helper = TicketSyncHelper::new(SyncScope::new(&store, &channel, &config));

        let mut local = Ticket::new("Local subject", "");
        local.pending_export = true;
        let mut remote = Ticket::new("Remote subject", "");
        remote.url = Some("https://acme.zendesk.com/api/v2/tickets/1.json".into());

        helper.copy_entity_properties(&mut local, &remote);
        assert_eq!(local.subject, "Local subject");
        assert_eq!(local.url, remote.url);

        local.pending_export = false;
        helper.copy_entity_properties(&mut local, &remote);
        assert_eq!(local.subject, "Remote subject");
    }

    #[test]
    fn case_edit_is_applied_to_ticket() {
        let store = InMemoryStore::new();
        let mut agent = synced_user(&store, 1);
        agent.related_user = Some(CrmUserId::new(5));
        store.save(&mut agent).unwrap();

        let channel = channel();
        let config = SyncConfig::default();
        let helper = TicketSyncHelper::new(SyncScope::new(&store, &channel, &config));

        let mut case = Case::new("Printer");
        store.save(&mut case).unwrap();
        let mut ticket = Ticket::new("Printer", "");
        ticket.channel = Some(ChannelId::new(1));
        ticket.related_case = case.id;
        store.save(&mut ticket).unwrap();

        assert!(helper.apply_case(&case).unwrap().is_none());

        case.assigned_to = Some(CrmUserId::new(5));
        let updated = helper.apply_case(&case).unwrap().unwrap();
        assert!(updated.pending_export);
        assert_eq!(updated.assignee.and_then(|a| a.id), agent.id);
    }
}

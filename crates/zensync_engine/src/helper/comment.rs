use super::{SyncHelper, SyncScope};
use crate::error::{SyncError, SyncResult};
use crate::kind::EntityKind;
use crate::linkage;
use zensync_api::{RemoteComment, RemoteRecord};
use zensync_model::{
    Case, CaseComment, CaseCommentId, IndexKey, Synced, Ticket, TicketComment, User,
};
use zensync_store::EntityStore;

/// Sync rules for Zendesk ticket comments.
#[derive(Debug)]
pub struct TicketCommentSyncHelper<'a, S> {
    scope: SyncScope<'a, S>,
}

impl<'a, S: EntityStore> TicketCommentSyncHelper<'a, S> {
    /// Creates a helper.
    pub fn new(scope: SyncScope<'a, S>) -> Self {
        Self { scope }
    }

    /// Converts a remote comment of a ticket and refreshes it.
    pub fn refresh_ticket_comment(
        &self,
        remote: &RemoteComment,
        ticket: &Ticket,
    ) -> SyncResult<TicketComment> {
        let mut comment = TicketComment::from(remote);
        ticket.add_comment(&mut comment);
        self.refresh_entity(&mut comment)?;
        Ok(comment)
    }

    /// Finds the ticket comment mirroring a case comment.
    pub fn find_by_case_comment(
        &self,
        case_comment: CaseCommentId,
    ) -> SyncResult<Option<TicketComment>> {
        Ok(self
            .scope
            .store
            .find_all::<TicketComment>(&IndexKey::CaseComment(case_comment))?
            .into_iter()
            .find(|c| c.channel == Some(self.scope.channel.id)))
    }

    /// Comments of a local ticket, in creation order.
    pub fn ticket_comments(&self, ticket: &Ticket) -> SyncResult<Vec<TicketComment>> {
        match ticket.id {
            Some(id) => Ok(self.scope.store.find_all(&IndexKey::Ticket(id))?),
            None => Ok(Vec::new()),
        }
    }

    fn load_ticket(&self, comment: &TicketComment) -> SyncResult<Option<Ticket>> {
        match &comment.ticket {
            Some(reference) => Ok(self.scope.resolver().resolve(reference)?),
            None => Ok(None),
        }
    }

    fn sync_case_comment(&self, comment: &mut TicketComment, case: &Case) -> SyncResult<()> {
        let Some(case_id) = case.id else {
            return Ok(());
        };
        let existing = match comment.related_comment {
            Some(id) => self.scope.store.get::<CaseComment>(id)?,
            None => None,
        };
        if let Some(mut case_comment) = existing {
            if case_comment.message != comment.body || case_comment.public != comment.public {
                case_comment.message = comment.body.clone();
                case_comment.public = comment.public;
                self.scope.store.save(&mut case_comment)?;
            }
            return Ok(());
        }

        let author = match &comment.author {
            Some(reference) => self.scope.resolver().resolve::<User>(reference)?,
            None => None,
        };
        let mut case_comment = linkage::case_comment_from_ticket_comment(comment, case_id);
        case_comment.owner = author
            .as_ref()
            .and_then(|a| a.related_user)
            .or(self.scope.default_owner());
        case_comment.contact = author.as_ref().and_then(|a| a.related_contact);
        let id = self.scope.store.save(&mut case_comment)?;
        comment.related_comment = Some(id);
        tracing::info!(case_comment = %id, "created related case comment");
        Ok(())
    }
}

impl<S: EntityStore> SyncHelper for TicketCommentSyncHelper<'_, S> {
    type Entity = TicketComment;
    const ENTITY: EntityKind = EntityKind::TicketComment;

    fn extract(&self, record: RemoteRecord) -> SyncResult<TicketComment> {
        match record {
            RemoteRecord::Comment(remote) => Ok(TicketComment::from(&remote)),
            other => Err(SyncError::TypeMismatch {
                expected: Self::ENTITY,
                found: other.kind(),
            }),
        }
    }

    fn validate_links(&self, comment: &TicketComment) -> SyncResult<()> {
        if comment.ticket.is_none() {
            return Err(SyncError::MissingRequiredLink("Comment Ticket required.".into()));
        }
        Ok(())
    }

    fn refresh_entity(&self, comment: &mut TicketComment) -> SyncResult<()> {
        comment.channel = Some(self.scope.channel.id);
        if let Some(ticket) = self.load_ticket(comment)? {
            comment.ticket = Some(ticket.sync_ref());
        }
        if let Some(author) = comment.author {
            comment.author = Some(self.scope.resolve_user_ref(&author)?);
        }
        Ok(())
    }

    fn validate_resolved(&self, comment: &TicketComment) -> SyncResult<()> {
        match comment.ticket {
            Some(ticket) if ticket.is_resolved() => Ok(()),
            Some(ticket) => Err(SyncError::UnresolvedReference(format!(
                "Ticket not found [origin_id={}].",
                ticket.origin_id.map_or(0, |o| o.as_u64())
            ))),
            None => Err(SyncError::MissingRequiredLink("Comment Ticket required.".into())),
        }
    }

    fn find_entity(&self, comment: &TicketComment) -> SyncResult<Option<TicketComment>> {
        let ticket = comment.ticket.and_then(|t| t.id);
        match (ticket, comment.origin_id) {
            (Some(ticket), Some(origin_id)) => {
                let resolver = self.scope.resolver();
                match resolver.find_comment(ticket, origin_id)? {
                    Some(found) => Ok(Some(found)),
                    None => Ok(resolver.find_pending_comment(ticket, &comment.body)?),
                }
            }
            _ => Ok(None),
        }
    }

    fn copy_entity_properties(&self, target: &mut TicketComment, source: &TicketComment) {
        if target.origin_id.is_none() {
            target.origin_id = source.origin_id;
        }
        target.body = source.body.clone();
        target.html_body = source.html_body.clone();
        target.public = source.public;
        target.author = source.author;
        target.origin_created_at = source.origin_created_at;
    }

    fn sync_related_entities(&self, comment: &mut TicketComment) -> SyncResult<()> {
        if let Some(author) = comment.author {
            comment.author = Some(self.scope.ensure_user(&author)?);
        }
        let Some(ticket) = self.load_ticket(comment)? else {
            return Ok(());
        };
        let Some(case_id) = ticket.related_case else {
            return Ok(());
        };
        match self.scope.store.get::<Case>(case_id)? {
            Some(case) => self.sync_case_comment(comment, &case),
            None => Ok(()),
        }
    }
}

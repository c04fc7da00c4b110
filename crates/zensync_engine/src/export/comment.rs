use super::{isolate, remote_user, ExportWriter};
use crate::error::{SyncError, SyncResult};
use crate::helper::SyncScope;
use crate::kind::EntityKind;
use crate::report::BatchReport;
use zensync_api::{RemoteComment, ZendeskTransport};
use zensync_model::{CaseComment, OriginId, Synced, SyncRef, Ticket, TicketComment};
use zensync_store::EntityStore;

/// Pushes pending ticket comments to Zendesk.
///
/// Runs the follow-up job scheduled by the ticket writer. The comment body
/// and author come from the linked case comment when there is one.
pub struct TicketCommentExportWriter<'a, S, T> {
    scope: SyncScope<'a, S>,
    transport: &'a T,
}

impl<'a, S, T> TicketCommentExportWriter<'a, S, T>
where
    S: EntityStore,
    T: ZendeskTransport,
{
    /// Creates a writer.
    pub fn new(scope: SyncScope<'a, S>, transport: &'a T) -> Self {
        Self { scope, transport }
    }

    fn remote_ticket(&self, comment: &TicketComment) -> SyncResult<(Ticket, OriginId)> {
        let ticket = match &comment.ticket {
            Some(reference) => self.scope.resolver().resolve::<Ticket>(reference)?,
            None => return Err(SyncError::MissingRequiredLink("Comment Ticket required.".into())),
        };
        let Some(ticket) = ticket else {
            return Err(SyncError::UnresolvedReference("Ticket not found.".into()));
        };
        match ticket.origin_id {
            Some(origin_id) => Ok((ticket, origin_id)),
            None => Err(SyncError::UnresolvedReference(format!(
                "Ticket not synced [id={}].",
                ticket.id.map_or(0, |id| id.as_u64())
            ))),
        }
    }

    /// Author of a case comment, as a Zendesk user reference.
    fn case_comment_author(&self, case_comment: &CaseComment) -> SyncResult<Option<SyncRef>> {
        match case_comment.owner {
            Some(owner) => Ok(self
                .scope
                .resolver()
                .find_user_for_crm_user(owner)?
                .map(|u| u.sync_ref())),
            None => Ok(None),
        }
    }

    fn export(&self, comment: &mut TicketComment, report: &mut BatchReport) -> SyncResult<()> {
        let (ticket, ticket_origin) = self.remote_ticket(comment)?;

        if let Some(id) = comment.related_comment {
            if let Some(case_comment) = self.scope.store.get::<CaseComment>(id)? {
                comment.body = case_comment.message.clone();
                comment.public = case_comment.public;
                if let Some(author) = self.case_comment_author(&case_comment)? {
                    comment.author = Some(author);
                }
            }
        }
        let author = comment.author.unwrap_or_default();
        comment.author = remote_user(self.scope, self.transport, &author, "author", report)?;

        tracing::info!(ticket = ticket_origin.as_u64(), "add comment in Zendesk API");
        let created = self
            .transport
            .add_ticket_comment(ticket_origin.as_u64(), &RemoteComment::from(&*comment))
            .map_err(SyncError::remote_write)?;

        comment.origin_id = created.id.map(OriginId::new);
        if comment.origin_id.is_none() {
            tracing::warn!("comment id not read back, next import links it");
        }
        comment.html_body = created.html_body;
        comment.origin_created_at = created.created_at;
        comment.ticket = Some(ticket.sync_ref());
        self.scope.store.save(comment)?;
        tracing::info!(origin_id = ?comment.origin_id, "created ticket comment");
        report.increment_add_count();
        Ok(())
    }
}

impl<S, T> ExportWriter for TicketCommentExportWriter<'_, S, T>
where
    S: EntityStore,
    T: ZendeskTransport,
{
    type Entity = TicketComment;
    const ENTITY: EntityKind = EntityKind::TicketComment;

    fn write_item(&mut self, comment: TicketComment, report: &mut BatchReport) -> SyncResult<()> {
        let span = tracing::info_span!("zendesk_ticket_comment", id = ?comment.id);
        let _enter = span.enter();

        if !comment.is_pending_export() {
            tracing::info!(origin_id = ?comment.origin_id, "comment already synced");
            return Ok(());
        }
        let mut working = comment;
        isolate(self.export(&mut working, report), report)?;
        Ok(())
    }
}

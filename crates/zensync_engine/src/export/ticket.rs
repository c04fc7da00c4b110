use super::{isolate, remote_user, ExportWriter};
use crate::error::{SyncError, SyncResult};
use crate::helper::{SyncHelper, SyncScope, TicketCommentSyncHelper, TicketSyncHelper};
use crate::kind::EntityKind;
use crate::linkage;
use crate::report::BatchReport;
use crate::scheduler::{JobPayload, SyncScheduler};
use zensync_api::{CreatedTicket, RemoteComment, RemoteTicket, ZendeskTransport};
use zensync_model::{CaseComment, IndexKey, OriginId, Ticket, TicketComment, TicketRole};
use zensync_store::EntityStore;

/// Pushes local tickets to Zendesk.
///
/// After the batch is flushed, case comments of the written tickets that
/// have no ticket comment yet are materialized as pending comments and one
/// `ticket_comment` job is scheduled for them.
pub struct TicketExportWriter<'a, S, T, Q> {
    scope: SyncScope<'a, S>,
    transport: &'a T,
    scheduler: &'a Q,
    written: Vec<Ticket>,
}

impl<'a, S, T, Q> TicketExportWriter<'a, S, T, Q>
where
    S: EntityStore,
    T: ZendeskTransport,
    Q: SyncScheduler,
{
    /// Creates a writer.
    pub fn new(scope: SyncScope<'a, S>, transport: &'a T, scheduler: &'a Q) -> Self {
        Self {
            scope,
            transport,
            scheduler,
            written: Vec::new(),
        }
    }

    fn tickets(&self) -> TicketSyncHelper<'a, S> {
        TicketSyncHelper::new(self.scope)
    }

    fn comments(&self) -> TicketCommentSyncHelper<'a, S> {
        TicketCommentSyncHelper::new(self.scope)
    }

    fn sync_ticket_relations(
        &self,
        ticket: &mut Ticket,
        report: &mut BatchReport,
    ) -> SyncResult<()> {
        for role in TicketRole::ALL {
            let Some(reference) = ticket.user(role).copied() else {
                continue;
            };
            if reference.origin_id.is_none() {
                let user =
                    remote_user(self.scope, self.transport, &reference, role.as_str(), report)?;
                ticket.set_user(role, user);
            }
        }
        Ok(())
    }

    /// Applies a remote representation onto the ticket and its case.
    fn reconcile(&self, ticket: &mut Ticket, remote: &RemoteTicket) -> SyncResult<()> {
        tracing::info!("update ticket by response data");
        let helper = self.tickets();
        let refreshed = helper.refresh_ticket(remote)?;
        helper.calculate_ticket_changes(ticket, &refreshed).apply(ticket);
        ticket.pending_export = false;
        self.scope.store.save(ticket)?;

        tracing::info!("update related case");
        helper.update_related_case(ticket)?;
        Ok(())
    }

    fn update_ticket(&self, ticket: &mut Ticket, report: &mut BatchReport) -> SyncResult<()> {
        tracing::info!(origin_id = ?ticket.origin_id, "update ticket in Zendesk API");
        let updated = self
            .transport
            .update_ticket(&RemoteTicket::from(&*ticket))
            .map_err(SyncError::remote_write)?;

        self.reconcile(ticket, &updated)?;
        report.increment_update_count();
        Ok(())
    }

    fn create_ticket(&self, ticket: &mut Ticket, report: &mut BatchReport) -> SyncResult<()> {
        tracing::info!("create ticket in Zendesk API");
        let mut request = RemoteTicket::from(&*ticket);
        request.comment = Some(RemoteComment {
            body: ticket.description.clone(),
            author_id: ticket.requester.and_then(|r| r.origin_id).map(OriginId::as_u64),
            ..RemoteComment::default()
        });
        let CreatedTicket {
            ticket: created,
            comment,
        } = self
            .transport
            .create_ticket(&request)
            .map_err(SyncError::remote_write)?;
        tracing::info!(origin_id = ?created.id, "created ticket");

        self.reconcile(ticket, &created)?;
        report.increment_update_count();

        if let Some(remote) = comment {
            let helper = self.comments();
            let mut comment = helper.refresh_ticket_comment(&remote, ticket)?;
            tracing::info!(origin_id = ?comment.origin_id, "created ticket comment");
            self.scope.store.save(&mut comment)?;
            report.increment_add_count();

            tracing::info!("update related case comment");
            helper.sync_related_entities(&mut comment)?;
            self.scope.store.save(&mut comment)?;
            report.increment_add_count();
        }
        Ok(())
    }

    fn export(&self, ticket: &mut Ticket, report: &mut BatchReport) -> SyncResult<()> {
        self.sync_ticket_relations(ticket, report)?;
        if ticket.origin_id.is_some() {
            self.update_ticket(ticket, report)
        } else {
            self.create_ticket(ticket, report)
        }
    }

    /// Materializes pending comments for case comments without one and
    /// schedules a single export job for every pending comment.
    fn create_new_ticket_comments(&self, tickets: &[Ticket]) -> SyncResult<()> {
        let helper = self.comments();
        let mut pending: Vec<TicketComment> = Vec::new();

        for ticket in tickets {
            let Some(case_id) = ticket.related_case else {
                continue;
            };
            pending.extend(
                helper
                    .ticket_comments(ticket)?
                    .into_iter()
                    .filter(TicketComment::is_pending_export),
            );

            let case_comments: Vec<CaseComment> =
                self.scope.store.find_all(&IndexKey::Case(case_id))?;
            for case_comment in case_comments {
                let Some(case_comment_id) = case_comment.id else {
                    continue;
                };
                if helper.find_by_case_comment(case_comment_id)?.is_some() {
                    continue;
                }
                tracing::info!(case_comment = %case_comment_id, "create ticket comment");
                let mut comment = linkage::ticket_comment_from_case_comment(ticket, &case_comment);
                self.scope.store.save(&mut comment)?;
                pending.push(comment);
            }
        }

        if pending.is_empty() {
            return Ok(());
        }
        self.scope.store.flush()?;

        let ids: Vec<_> = pending.iter().filter_map(|c| c.id).collect();
        tracing::info!(ids = ?ids, "schedule job to sync existing ticket comments");
        self.scheduler.schedule(
            self.scope.channel.id,
            EntityKind::TicketComment,
            JobPayload::with_ids(ids),
        );
        Ok(())
    }
}

impl<S, T, Q> ExportWriter for TicketExportWriter<'_, S, T, Q>
where
    S: EntityStore,
    T: ZendeskTransport,
    Q: SyncScheduler,
{
    type Entity = Ticket;
    const ENTITY: EntityKind = EntityKind::Ticket;

    fn write_item(&mut self, ticket: Ticket, report: &mut BatchReport) -> SyncResult<()> {
        let span = tracing::info_span!("zendesk_ticket", id = ?ticket.id);
        let _enter = span.enter();

        let mut working = ticket;
        if working.channel.is_none() {
            working.channel = Some(self.scope.channel.id);
        }
        let exported = isolate(self.export(&mut working, report), report)?;
        if exported.is_some() {
            self.written.push(working);
        }
        Ok(())
    }

    fn post_flush(&mut self, _report: &mut BatchReport) -> SyncResult<()> {
        let tickets = std::mem::take(&mut self.written);
        self.create_new_ticket_comments(&tickets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::scheduler::QueueScheduler;
    use zensync_api::{ApiCall, ApiError, MockTransport};
    use zensync_model::{Case, Channel, ChannelId, SyncRef, Synced, User, ZendeskCredentials};
    use zensync_store::InMemoryStore;

    fn channel() -> Channel {
        Channel::new(
            ChannelId::new(1),
            "Acme",
            ZendeskCredentials {
                default_user_email: "support@acme.com".into(),
                ..ZendeskCredentials::default()
            },
        )
    }

    fn local_ticket(store: &InMemoryStore) -> Ticket {
        let mut ticket = Ticket::new("Printer", "On fire");
        ticket.channel = Some(ChannelId::new(1));
        store.save(&mut ticket).unwrap();
        ticket
    }

    #[test]
    fn unsynced_ticket_is_created() {
        let store = InMemoryStore::new();
        let channel = channel();
        let config = SyncConfig::default();
        let transport = MockTransport::new();
        transport.set_next_ticket_id(100);
        let scheduler = QueueScheduler::new();
        let scope = SyncScope::new(&store, &channel, &config);
        let mut writer = TicketExportWriter::new(scope, &transport, &scheduler);

        let ticket = local_ticket(&store);
        let mut report = BatchReport::new();
        writer.write_item(ticket.clone(), &mut report).unwrap();

        assert_eq!(transport.call_count(ApiCall::CreateTicket), 1);
        assert_eq!(transport.call_count(ApiCall::UpdateTicket), 0);
        let stored: Ticket = store.get(ticket.id.unwrap()).unwrap().unwrap();
        assert_eq!(stored.origin_id, Some(OriginId::new(100)));
        assert_eq!(report.updated, 1);
        // initial comment plus its case comment
        assert_eq!(report.added, 2);
        assert_eq!(store.all::<TicketComment>().unwrap().len(), 1);
    }

    /// Accepts every ticket create and fails every read.
    #[derive(Default)]
    struct ReadOutageClient {
        posts: parking_lot::Mutex<u32>,
    }

    impl zensync_api::HttpClient for &ReadOutageClient {
        fn send(
            &self,
            request: &zensync_api::HttpRequest,
        ) -> zensync_api::ApiResult<zensync_api::HttpResponse> {
            let (status, body) = match request.method {
                zensync_api::Method::Post => {
                    *self.posts.lock() += 1;
                    (201, r#"{"ticket": {"id": 7, "subject": "Printer"}}"#)
                }
                _ => (503, "Service Unavailable"),
            };
            Ok(zensync_api::HttpResponse {
                status,
                body: body.to_string(),
                retry_after: None,
            })
        }
    }

    #[test]
    fn created_ticket_keeps_origin_when_comment_read_fails() {
        let store = InMemoryStore::new();
        let channel = channel();
        let config = SyncConfig::default();
        let client = ReadOutageClient::default();
        let transport = zensync_api::HttpTransport::new(
            "https://acme.zendesk.com",
            &channel.transport,
            &client,
        );
        let scheduler = QueueScheduler::new();
        let scope = SyncScope::new(&store, &channel, &config);
        let mut writer = TicketExportWriter::new(scope, &transport, &scheduler);

        let ticket = local_ticket(&store);
        let mut report = BatchReport::new();
        writer.write_item(ticket.clone(), &mut report).unwrap();

        assert_eq!(report.errors, 0);
        assert_eq!(report.updated, 1);
        let stored: Ticket = store.get(ticket.id.unwrap()).unwrap().unwrap();
        assert_eq!(stored.origin_id, Some(OriginId::new(7)));

        writer.write_item(stored, &mut report).unwrap();
        assert_eq!(*client.posts.lock(), 1);
    }

    #[test]
    fn synced_ticket_is_updated() {
        let store = InMemoryStore::new();
        let channel = channel();
        let config = SyncConfig::default();
        let transport = MockTransport::new();
        let origin = transport.insert_ticket(RemoteTicket {
            subject: "Printer".into(),
            ..RemoteTicket::default()
        });
        let scheduler = QueueScheduler::new();
        let scope = SyncScope::new(&store, &channel, &config);
        let mut writer = TicketExportWriter::new(scope, &transport, &scheduler);

        let mut ticket = local_ticket(&store);
        ticket.origin_id = Some(OriginId::new(origin));
        ticket.subject = "Printer still on fire".into();
        ticket.pending_export = true;

        let mut report = BatchReport::new();
        writer.write_item(ticket.clone(), &mut report).unwrap();

        assert_eq!(transport.call_count(ApiCall::UpdateTicket), 1);
        assert_eq!(transport.call_count(ApiCall::CreateTicket), 0);
        assert_eq!(transport.ticket(origin).unwrap().subject, "Printer still on fire");
        let stored: Ticket = store.get(ticket.id.unwrap()).unwrap().unwrap();
        assert!(!stored.pending_export);
        assert_eq!(report.updated, 1);
    }

    #[test]
    fn remote_failure_leaves_ticket_untouched() {
        let store = InMemoryStore::new();
        let channel = channel();
        let config = SyncConfig::default();
        let transport = MockTransport::new();
        transport.fail_next(ApiCall::CreateTicket, ApiError::Validation("subject".into()));
        let scheduler = QueueScheduler::new();
        let scope = SyncScope::new(&store, &channel, &config);
        let mut writer = TicketExportWriter::new(scope, &transport, &scheduler);

        let ticket = local_ticket(&store);
        let mut report = BatchReport::new();
        writer.write_item(ticket.clone(), &mut report).unwrap();
        writer.post_flush(&mut report).unwrap();

        assert_eq!(report.errors, 1);
        assert_eq!(report.updated, 0);
        let stored: Ticket = store.get(ticket.id.unwrap()).unwrap().unwrap();
        assert_eq!(stored, ticket);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn fatal_remote_failure_aborts() {
        let store = InMemoryStore::new();
        let channel = channel();
        let config = SyncConfig::default();
        let transport = MockTransport::new();
        transport.fail_next(ApiCall::CreateTicket, ApiError::Authentication("token".into()));
        let scheduler = QueueScheduler::new();
        let scope = SyncScope::new(&store, &channel, &config);
        let mut writer = TicketExportWriter::new(scope, &transport, &scheduler);

        let mut report = BatchReport::new();
        let err = writer
            .write_item(local_ticket(&store), &mut report)
            .unwrap_err();
        assert!(matches!(err, SyncError::Api(ApiError::Authentication(_))));
        assert_eq!(report.errors, 0);
    }

    #[test]
    fn failed_requester_falls_back_to_default_user() {
        let store = InMemoryStore::new();
        let mut default = User::new("Support", Some("support@acme.com".into()));
        default.channel = Some(ChannelId::new(1));
        default.origin_id = Some(OriginId::new(1));
        store.save(&mut default).unwrap();
        let mut requester = User::new("Jane", Some("jane@x.com".into()));
        requester.channel = Some(ChannelId::new(1));
        store.save(&mut requester).unwrap();

        let channel = channel();
        let config = SyncConfig::default();
        let transport = MockTransport::new();
        transport.fail_next(ApiCall::CreateUser, ApiError::Validation("email".into()));
        let scheduler = QueueScheduler::new();
        let scope = SyncScope::new(&store, &channel, &config);
        let mut writer = TicketExportWriter::new(scope, &transport, &scheduler);

        let mut ticket = local_ticket(&store);
        ticket.requester = Some(requester.sync_ref());
        let mut report = BatchReport::new();
        writer.write_item(ticket.clone(), &mut report).unwrap();

        assert_eq!(report.warnings, 1);
        assert_eq!(report.errors, 0);
        let stored: Ticket = store.get(ticket.id.unwrap()).unwrap().unwrap();
        assert_eq!(stored.requester.and_then(|r| r.origin_id), Some(OriginId::new(1)));
    }

    #[test]
    fn post_flush_materializes_case_comments() {
        let store = InMemoryStore::new();
        let mut case = Case::new("Printer");
        let case_id = store.save(&mut case).unwrap();
        store.save(&mut CaseComment::new(case_id, "first")).unwrap();
        store.save(&mut CaseComment::new(case_id, "second")).unwrap();

        let channel = channel();
        let config = SyncConfig::default();
        let transport = MockTransport::new();
        let scheduler = QueueScheduler::new();
        let scope = SyncScope::new(&store, &channel, &config);
        let mut writer = TicketExportWriter::new(scope, &transport, &scheduler);

        let mut ticket = local_ticket(&store);
        ticket.related_case = Some(case_id);
        let mut report = BatchReport::new();
        writer.write_item(ticket, &mut report).unwrap();
        store.flush().unwrap();
        writer.post_flush(&mut report).unwrap();

        let pending: Vec<TicketComment> = store
            .all::<TicketComment>()
            .unwrap()
            .into_iter()
            .filter(TicketComment::is_pending_export)
            .collect();
        assert_eq!(pending.len(), 2);

        let jobs = scheduler.drain();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].kind, EntityKind::TicketComment);
        let mut ids: Vec<_> = pending.iter().filter_map(|c| c.id).collect();
        ids.sort();
        assert_eq!(jobs[0].payload.ids, ids);
        assert!(!store.has_pending());

        // a second flush finds nothing new to materialize
        writer.post_flush(&mut report).unwrap();
        assert!(scheduler.is_empty());
    }

    #[test]
    fn written_ticket_keeps_local_requester_identity() {
        let store = InMemoryStore::new();
        let channel = channel();
        let config = SyncConfig::default();
        let transport = MockTransport::new();
        transport.set_next_user_id(42);
        let scheduler = QueueScheduler::new();
        let scope = SyncScope::new(&store, &channel, &config);
        let mut writer = TicketExportWriter::new(scope, &transport, &scheduler);

        let mut requester = User::new("Jane", Some("a@x.com".into()));
        requester.channel = Some(ChannelId::new(1));
        store.save(&mut requester).unwrap();
        let mut ticket = local_ticket(&store);
        ticket.requester = Some(SyncRef::local(requester.id.unwrap()));

        let mut report = BatchReport::new();
        writer.write_item(ticket.clone(), &mut report).unwrap();

        let stored: Ticket = store.get(ticket.id.unwrap()).unwrap().unwrap();
        assert_eq!(stored.requester.and_then(|r| r.id), requester.id);
        assert_eq!(stored.requester.and_then(|r| r.origin_id), Some(OriginId::new(42)));
    }
}

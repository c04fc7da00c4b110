//! Batch runner.
//!
//! A batch imports or exports one entity kind for one channel. The runner
//! holds the batch lease, runs the batch inside a `sync_batch` span, commits
//! on success and rolls back on a fatal error. Transient failures are
//! retried with exponential backoff.
//!
//! ## Commit points
//!
//! - Import batches commit once, after the last record.
//! - Export batches commit after every record, since a remote write that
//!   succeeded must not be forgotten when a later record aborts the batch.

use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::export::{ExportWriter, TicketCommentExportWriter, TicketExportWriter, UserExportWriter};
use crate::helper::{
    SyncHelper, SyncScope, TicketCommentSyncHelper, TicketSyncHelper, UserSyncHelper,
};
use crate::import::ImportProcessor;
use crate::kind::EntityKind;
use crate::lock::BatchLock;
use crate::report::BatchReport;
use crate::scheduler::{QueueScheduler, ScheduledJob, SyncScheduler};
use zensync_api::{ApiError, RemoteRecord, ZendeskTransport};
use zensync_model::{Case, CaseId, Channel, LocalId, Synced, Ticket, TicketComment, User};
use zensync_store::EntityStore;

/// Order in which [`SyncRunner::import_all`] runs the kinds.
///
/// Users first so tickets find their requesters; tickets before comments.
pub const IMPORT_ORDER: [EntityKind; 3] =
    [EntityKind::User, EntityKind::Ticket, EntityKind::TicketComment];

/// Runs import and export batches against one entity store.
#[derive(Debug)]
pub struct SyncRunner<S, L> {
    store: S,
    config: SyncConfig,
    locks: L,
}

impl<S: EntityStore, L: BatchLock> SyncRunner<S, L> {
    /// Creates a runner.
    pub fn new(store: S, config: SyncConfig, locks: L) -> Self {
        Self {
            store,
            config,
            locks,
        }
    }

    /// The entity store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The engine configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Imports every record of one kind from Zendesk.
    pub fn run_import<T: ZendeskTransport>(
        &self,
        channel: &Channel,
        transport: &T,
        kind: EntityKind,
    ) -> SyncResult<BatchReport> {
        self.run_batch(channel, kind, |scope, report| match kind {
            EntityKind::User => {
                let records = transport.list_users()?.into_iter().map(RemoteRecord::User);
                self.import_records(UserSyncHelper::new(scope), records, report)
            }
            EntityKind::Ticket => {
                let records = transport.list_tickets()?.into_iter().map(RemoteRecord::Ticket);
                self.import_records(TicketSyncHelper::new(scope), records, report)
            }
            EntityKind::TicketComment => {
                let records = self.remote_comments(channel, transport)?;
                self.import_records(TicketCommentSyncHelper::new(scope), records, report)
            }
        })
    }

    /// Imports users, tickets and comments, in that order.
    ///
    /// Stops at the first failed batch.
    pub fn import_all<T: ZendeskTransport>(
        &self,
        channel: &Channel,
        transport: &T,
    ) -> SyncResult<Vec<(EntityKind, BatchReport)>> {
        let mut reports = Vec::with_capacity(IMPORT_ORDER.len());
        for kind in IMPORT_ORDER {
            reports.push((kind, self.run_import(channel, transport, kind)?));
        }
        Ok(reports)
    }

    /// Exports records of one kind to Zendesk.
    ///
    /// Without `ids`, exports every record of the channel that needs it:
    /// unsynced users, tickets that are unsynced or pending export, and
    /// unsynced comments.
    pub fn run_export<T, Q>(
        &self,
        channel: &Channel,
        transport: &T,
        scheduler: &Q,
        kind: EntityKind,
        ids: Option<&[LocalId]>,
    ) -> SyncResult<BatchReport>
    where
        T: ZendeskTransport,
        Q: SyncScheduler,
    {
        self.run_batch(channel, kind, |scope, report| match kind {
            EntityKind::User => {
                let users = self.export_items::<User>(scope, ids, |u| !u.is_synced())?;
                self.export_records(UserExportWriter::new(scope, transport), users, report)
            }
            EntityKind::Ticket => {
                let tickets = self.export_items::<Ticket>(scope, ids, |t| {
                    t.pending_export || !t.is_synced()
                })?;
                let writer = TicketExportWriter::new(scope, transport, scheduler);
                self.export_records(writer, tickets, report)
            }
            EntityKind::TicketComment => {
                let comments =
                    self.export_items::<TicketComment>(scope, ids, TicketComment::is_pending_export)?;
                let writer = TicketCommentExportWriter::new(scope, transport);
                self.export_records(writer, comments, report)
            }
        })
    }

    /// Runs one scheduled job.
    pub fn run_job<T, Q>(
        &self,
        channel: &Channel,
        transport: &T,
        scheduler: &Q,
        job: &ScheduledJob,
    ) -> SyncResult<BatchReport>
    where
        T: ZendeskTransport,
        Q: SyncScheduler,
    {
        tracing::info!(%job.kind, ids = job.payload.ids.len(), "running scheduled job");
        self.run_export(channel, transport, scheduler, job.kind, Some(&job.payload.ids))
    }

    /// Runs the queued jobs of `channel` until none are left.
    ///
    /// Jobs of other channels stay queued. Jobs scheduled while running are
    /// picked up in the same call. A job is removed only after it has run,
    /// so a failed job and the ones behind it wait for the next call.
    pub fn run_jobs<T: ZendeskTransport>(
        &self,
        channel: &Channel,
        transport: &T,
        queue: &QueueScheduler,
    ) -> SyncResult<Vec<(EntityKind, BatchReport)>> {
        let mut reports = Vec::new();
        while let Some(job) = queue.next_for(channel.id) {
            let report = self.run_job(channel, transport, queue, &job)?;
            queue.complete(&job)?;
            reports.push((job.kind, report));
        }
        Ok(reports)
    }

    /// Applies locally edited cases onto their tickets.
    ///
    /// Returns the ids of the tickets now pending export. Does nothing for
    /// one-way channels.
    pub fn apply_case_edits(&self, channel: &Channel, cases: &[CaseId]) -> SyncResult<Vec<LocalId>> {
        if !channel.is_two_way() {
            tracing::debug!(channel = %channel.id, "one-way channel, case edits ignored");
            return Ok(Vec::new());
        }
        let _lease = self.locks.acquire(channel.id, EntityKind::Ticket)?;
        let tickets = TicketSyncHelper::new(SyncScope::new(&self.store, channel, &self.config));
        let result = self.apply_cases(&tickets, cases);
        if result.is_err() {
            self.store.rollback();
        }
        result
    }

    fn apply_cases(
        &self,
        tickets: &TicketSyncHelper<'_, S>,
        cases: &[CaseId],
    ) -> SyncResult<Vec<LocalId>> {
        let mut pending = Vec::new();
        for id in cases {
            let Some(case) = self.store.get::<Case>(*id)? else {
                tracing::warn!(case = %id, "case not found");
                continue;
            };
            if let Some(ticket) = tickets.apply_case(&case)? {
                tracing::info!(ticket = ?ticket.id, case = %id, "ticket marked for export");
                pending.extend(ticket.id);
            }
        }
        self.store.flush()?;
        Ok(pending)
    }

    fn run_batch<F>(&self, channel: &Channel, kind: EntityKind, mut batch: F) -> SyncResult<BatchReport>
    where
        F: FnMut(SyncScope<'_, S>, &mut BatchReport) -> SyncResult<()>,
    {
        if !channel.enabled {
            tracing::info!(channel = %channel.id, %kind, "channel disabled, batch skipped");
            return Ok(BatchReport::new());
        }
        let _lease = self.locks.acquire(channel.id, kind)?;

        let run_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("sync_batch", channel = %channel.id, %kind, %run_id);
        let _enter = span.enter();

        let scope = SyncScope::new(&self.store, channel, &self.config);
        let retry = &self.config.retry;
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                let delay = retry.delay_for_attempt(attempt);
                tracing::info!(attempt, ?delay, "retrying batch");
                std::thread::sleep(delay);
            }
            let mut report = BatchReport::new();
            let result =
                batch(scope, &mut report).and_then(|()| self.store.flush().map_err(Into::into));
            match result {
                Ok(()) => {
                    tracing::info!(%report, "batch finished");
                    return Ok(report);
                }
                Err(e) => {
                    self.store.rollback();
                    attempt += 1;
                    if e.is_retryable() && attempt < retry.max_attempts {
                        tracing::warn!(error = %e, "batch failed, will retry");
                        continue;
                    }
                    tracing::error!(error = %e, "batch aborted");
                    return Err(e);
                }
            }
        }
    }

    fn import_records<H, I>(&self, helper: H, records: I, report: &mut BatchReport) -> SyncResult<()>
    where
        H: SyncHelper,
        I: IntoIterator<Item = RemoteRecord>,
    {
        let processor = ImportProcessor::new(helper);
        for record in records {
            report.increment_read_count();
            if let Some(mut entity) = processor.process(record, report)? {
                self.store.save(&mut entity)?;
            }
        }
        Ok(())
    }

    /// Lists the remote comments of every synced ticket of the channel.
    fn remote_comments<T: ZendeskTransport>(
        &self,
        channel: &Channel,
        transport: &T,
    ) -> SyncResult<Vec<RemoteRecord>> {
        let mut records = Vec::new();
        for ticket in self.store.all::<Ticket>()? {
            if ticket.channel != Some(channel.id) {
                continue;
            }
            let Some(origin_id) = ticket.origin_id else {
                continue;
            };
            let comments = match transport.list_ticket_comments(origin_id.as_u64()) {
                Ok(comments) => comments,
                Err(ApiError::NotFound(_)) => {
                    tracing::warn!(ticket = origin_id.as_u64(), "ticket gone from Zendesk");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            records.extend(comments.into_iter().map(|mut comment| {
                comment.ticket_id = Some(origin_id.as_u64());
                RemoteRecord::Comment(comment)
            }));
        }
        Ok(records)
    }

    fn export_items<E: Synced>(
        &self,
        scope: SyncScope<'_, S>,
        ids: Option<&[LocalId]>,
        needs_export: impl Fn(&E) -> bool,
    ) -> SyncResult<Vec<E>> {
        let Some(ids) = ids else {
            return Ok(self
                .store
                .all::<E>()?
                .into_iter()
                .filter(|e| e.channel() == Some(scope.channel.id) && needs_export(e))
                .collect());
        };
        let resolver = scope.resolver();
        let mut items = Vec::with_capacity(ids.len());
        for id in ids {
            match resolver.get::<E>(*id)? {
                Some(item) => items.push(item),
                None => tracing::warn!(%id, "record not found in channel"),
            }
        }
        Ok(items)
    }

    fn export_records<W: ExportWriter>(
        &self,
        mut writer: W,
        items: Vec<W::Entity>,
        report: &mut BatchReport,
    ) -> SyncResult<()> {
        for item in items {
            report.increment_read_count();
            writer.write_item(item, report)?;
            self.store.flush()?;
        }
        writer.post_flush(report)
    }
}

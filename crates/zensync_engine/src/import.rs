//! Import of remote records.

use crate::error::{SyncError, SyncResult};
use crate::helper::SyncHelper;
use crate::kind::EntityKind;
use crate::report::BatchReport;
use tracing::Span;
use zensync_api::RemoteRecord;
use zensync_model::{Record, Synced};

/// Reconciles remote records with local ones through a [`SyncHelper`].
///
/// Each processed record moves exactly one of the `added`, `updated` or
/// `errors` counters of the report.
#[derive(Debug)]
pub struct ImportProcessor<H> {
    helper: H,
}

fn record_span(kind: EntityKind, origin_id: Option<u64>) -> Span {
    match kind {
        EntityKind::User => tracing::info_span!("zendesk_user", origin_id),
        EntityKind::Ticket => tracing::info_span!("zendesk_ticket", origin_id),
        EntityKind::TicketComment => tracing::info_span!("zendesk_ticket_comment", origin_id),
    }
}

impl<H: SyncHelper> ImportProcessor<H> {
    /// Creates a processor.
    pub fn new(helper: H) -> Self {
        Self { helper }
    }

    /// The helper driving this processor.
    pub fn helper(&self) -> &H {
        &self.helper
    }

    /// Processes one remote record.
    ///
    /// Returns the entity to persist, `Ok(None)` if the record was skipped
    /// with a record-level error, or `Err` when the batch must abort.
    pub fn process(
        &self,
        record: RemoteRecord,
        report: &mut BatchReport,
    ) -> SyncResult<Option<H::Entity>> {
        let span = record_span(H::ENTITY, record.id());
        let _enter = span.enter();

        match self.reconcile(record, report) {
            Ok(entity) => Ok(Some(entity)),
            Err(e) if e.is_record_level() => {
                tracing::error!(error = %e, "record skipped");
                report.add_error(&e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn reconcile(&self, record: RemoteRecord, report: &mut BatchReport) -> SyncResult<H::Entity> {
        let mut entity = self.helper.extract(record)?;
        if entity.origin_id().is_none() {
            return Err(SyncError::MissingOriginId(H::ENTITY));
        }
        self.helper.validate_links(&entity)?;
        self.helper.refresh_entity(&mut entity)?;
        self.helper.validate_resolved(&entity)?;

        let existing = self.helper.find_entity(&entity)?;
        let (mut entity, is_new) = match existing {
            Some(mut existing) => {
                self.helper.copy_entity_properties(&mut existing, &entity);
                tracing::info!(id = ?existing.id(), "update found {}", H::ENTITY);
                (existing, false)
            }
            None => {
                tracing::info!("add new {}", H::ENTITY);
                (entity, true)
            }
        };

        self.helper.sync_related_entities(&mut entity)?;
        if is_new {
            report.increment_add_count();
        } else {
            report.increment_update_count();
        }
        Ok(entity)
    }
}

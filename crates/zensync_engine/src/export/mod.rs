//! Export of local records to Zendesk.
//!
//! The runner feeds a writer one item at a time, flushes the store, then
//! calls [`ExportWriter::post_flush`] once.

mod comment;
mod ticket;
mod user;

pub use comment::TicketCommentExportWriter;
pub use ticket::TicketExportWriter;
pub use user::UserExportWriter;

use crate::error::SyncResult;
use crate::helper::SyncScope;
use crate::kind::EntityKind;
use crate::report::BatchReport;
use zensync_api::ZendeskTransport;
use zensync_model::{Synced, SyncRef, User};
use zensync_store::EntityStore;

/// Pushes local records of one kind to Zendesk.
pub trait ExportWriter {
    /// Entity the writer pushes.
    type Entity: Synced;

    /// Kind of the entity.
    const ENTITY: EntityKind;

    /// Pushes one record and reconciles the response.
    ///
    /// Record-level failures are counted in `report` and leave the local
    /// record as it was; only batch-fatal errors are returned.
    fn write_item(&mut self, item: Self::Entity, report: &mut BatchReport) -> SyncResult<()>;

    /// Runs once after the batch has been flushed.
    fn post_flush(&mut self, _report: &mut BatchReport) -> SyncResult<()> {
        Ok(())
    }
}

/// Counts a record-level failure and turns it into `None`.
pub(crate) fn isolate<T>(result: SyncResult<T>, report: &mut BatchReport) -> SyncResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_record_level() => {
            tracing::error!(error = %e, "record skipped");
            report.add_error(&e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Returns a reference to a user known to Zendesk.
///
/// A local-only user is created remotely first. When that fails the
/// channel's default user is substituted and a warning is counted.
pub(crate) fn remote_user<S, T>(
    scope: SyncScope<'_, S>,
    transport: &T,
    reference: &SyncRef,
    role: &str,
    report: &mut BatchReport,
) -> SyncResult<Option<SyncRef>>
where
    S: EntityStore,
    T: ZendeskTransport,
{
    if reference.origin_id.is_some() {
        return Ok(Some(*reference));
    }
    let users = crate::helper::UserSyncHelper::new(scope);
    if let Some(mut user) = scope.resolver().resolve::<User>(reference)? {
        if user.origin_id.is_some() {
            return Ok(Some(user.sync_ref()));
        }
        tracing::info!(role, "creating user in Zendesk");
        match users.create_remote_user(transport, &mut user) {
            Ok(()) => return Ok(Some(user.sync_ref())),
            Err(e) if e.is_record_level() => {
                tracing::warn!(role, error = %e, "user could not be created");
            }
            Err(e) => return Err(e),
        }
    }

    tracing::warn!(role, "default user substituted");
    report.increment_warning_count();
    Ok(users.find_default_user()?.map(|u| u.sync_ref()))
}

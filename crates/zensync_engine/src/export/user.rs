use super::{isolate, ExportWriter};
use crate::error::SyncResult;
use crate::helper::{SyncScope, UserSyncHelper};
use crate::kind::EntityKind;
use crate::report::BatchReport;
use zensync_api::ZendeskTransport;
use zensync_model::User;
use zensync_store::EntityStore;

/// Pushes local users to Zendesk.
///
/// Users with an origin id are updated in place; the rest are created.
pub struct UserExportWriter<'a, S, T> {
    users: UserSyncHelper<'a, S>,
    transport: &'a T,
}

impl<'a, S, T> UserExportWriter<'a, S, T>
where
    S: EntityStore,
    T: ZendeskTransport,
{
    /// Creates a writer.
    pub fn new(scope: SyncScope<'a, S>, transport: &'a T) -> Self {
        Self {
            users: UserSyncHelper::new(scope),
            transport,
        }
    }
}

impl<S, T> ExportWriter for UserExportWriter<'_, S, T>
where
    S: EntityStore,
    T: ZendeskTransport,
{
    type Entity = User;
    const ENTITY: EntityKind = EntityKind::User;

    fn write_item(&mut self, mut user: User, report: &mut BatchReport) -> SyncResult<()> {
        let span = tracing::info_span!("zendesk_user", id = ?user.id);
        let _enter = span.enter();

        if user.origin_id.is_some() {
            tracing::info!(origin_id = ?user.origin_id, "update user in Zendesk API");
            if isolate(self.users.update_remote_user(self.transport, &mut user), report)?.is_some() {
                report.increment_update_count();
            }
        } else {
            tracing::info!("create user in Zendesk API");
            if isolate(self.users.create_remote_user(self.transport, &mut user), report)?.is_some() {
                report.increment_add_count();
            }
        }
        Ok(())
    }
}

//! Per-entity sync helpers.
//!
//! A helper knows how one entity type is refreshed against the local store,
//! matched to an existing record, merged and cascaded into the CRM side.
//! The import processor and export writers drive helpers; helpers never
//! touch counters.

mod comment;
mod ticket;
mod user;

pub use comment::TicketCommentSyncHelper;
pub use ticket::TicketSyncHelper;
pub use user::{split_name, NameParts, UserSyncHelper};

use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::kind::EntityKind;
use crate::resolver::IdentityResolver;
use std::fmt;
use zensync_api::RemoteRecord;
use zensync_model::{Channel, CrmUserId, OriginId, Synced, SyncRef, User};
use zensync_store::EntityStore;

/// Everything a helper works against: store, channel and configuration.
#[derive(Debug)]
pub struct SyncScope<'a, S> {
    /// Entity store.
    pub store: &'a S,
    /// Channel being synced.
    pub channel: &'a Channel,
    /// Engine configuration.
    pub config: &'a SyncConfig,
}

impl<S> Clone for SyncScope<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for SyncScope<'_, S> {}

impl<'a, S: EntityStore> SyncScope<'a, S> {
    /// Creates a scope.
    pub fn new(store: &'a S, channel: &'a Channel, config: &'a SyncConfig) -> Self {
        Self {
            store,
            channel,
            config,
        }
    }

    /// Channel-scoped resolver over the same store.
    pub fn resolver(&self) -> IdentityResolver<'a, S> {
        IdentityResolver::new(self.store, self.channel)
    }

    /// CRM user that owns records created by the sync.
    pub fn default_owner(&self) -> Option<CrmUserId> {
        self.channel.settings.default_user_owner
    }

    /// Resolves a user reference to a local reference, if the user is known.
    pub(crate) fn resolve_user_ref(&self, reference: &SyncRef) -> SyncResult<SyncRef> {
        Ok(match self.resolver().resolve::<User>(reference)? {
            Some(user) => user.sync_ref(),
            None => *reference,
        })
    }

    /// Returns a local reference for a remote user, saving a stub user when
    /// the user has not been imported yet.
    pub(crate) fn ensure_user(&self, reference: &SyncRef) -> SyncResult<SyncRef> {
        if reference.is_resolved() {
            return Ok(*reference);
        }
        let Some(origin_id) = reference.origin_id else {
            return Ok(*reference);
        };
        if let Some(user) = self.resolver().find_by_origin::<User>(origin_id)? {
            return Ok(user.sync_ref());
        }
        let mut stub = stub_user(self.channel, origin_id);
        self.store.save(&mut stub)?;
        tracing::debug!(origin_id = origin_id.as_u64(), "saved stub user");
        Ok(stub.sync_ref())
    }
}

fn stub_user(channel: &Channel, origin_id: OriginId) -> User {
    User {
        origin_id: Some(origin_id),
        channel: Some(channel.id),
        active: true,
        ..User::default()
    }
}

/// Reconciliation steps for one entity type.
pub trait SyncHelper {
    /// Local entity the helper handles.
    type Entity: Synced + fmt::Debug;

    /// Kind of the entity.
    const ENTITY: EntityKind;

    /// Converts a remote payload, rejecting payloads of another type.
    fn extract(&self, record: RemoteRecord) -> SyncResult<Self::Entity>;

    /// Checks references that must be present before refresh.
    fn validate_links(&self, _entity: &Self::Entity) -> SyncResult<()> {
        Ok(())
    }

    /// Attaches the entity to the channel and resolves its references
    /// against the local store. Writes nothing.
    fn refresh_entity(&self, entity: &mut Self::Entity) -> SyncResult<()>;

    /// Checks references that must resolve after refresh.
    fn validate_resolved(&self, _entity: &Self::Entity) -> SyncResult<()> {
        Ok(())
    }

    /// Finds the local record matching a refreshed entity.
    fn find_entity(&self, entity: &Self::Entity) -> SyncResult<Option<Self::Entity>>;

    /// Copies the mutable remote fields of `source` onto `target`.
    fn copy_entity_properties(&self, target: &mut Self::Entity, source: &Self::Entity);

    /// Creates or updates the CRM records that mirror the entity.
    fn sync_related_entities(&self, entity: &mut Self::Entity) -> SyncResult<()>;
}

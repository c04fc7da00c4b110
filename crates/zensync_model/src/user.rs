//! Zendesk user.

use crate::ids::{ChannelId, ContactId, CrmUserId, LocalId, OriginId};
use crate::lookup::UserRole;
use crate::record::{IndexKey, Record, Synced, Table};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A Zendesk user mirrored locally.
///
/// Email is the cross-system join key: agents and admins link to the CRM
/// user with the same email, end users to the CRM contact.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct User {
    /// Local id.
    pub id: Option<LocalId>,
    /// Remote id; `None` until the user exists in Zendesk.
    pub origin_id: Option<OriginId>,
    /// Owning channel.
    pub channel: Option<ChannelId>,
    /// API url of the remote user.
    pub url: Option<String>,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Role in the Zendesk account.
    pub role: Option<UserRole>,
    /// Account is active.
    #[serde(default)]
    pub active: bool,
    /// Linked CRM user (agents and admins).
    pub related_user: Option<CrmUserId>,
    /// Linked CRM contact (end users).
    pub related_contact: Option<ContactId>,
    /// Remote creation time.
    pub origin_created_at: Option<DateTime<Utc>>,
    /// Remote last update time.
    pub origin_updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Creates a local user that is not yet synced.
    pub fn new(name: impl Into<String>, email: Option<String>) -> Self {
        Self {
            name: name.into(),
            email,
            active: true,
            ..Self::default()
        }
    }

    /// Returns true once the user exists remotely.
    #[must_use]
    pub fn is_synced(&self) -> bool {
        self.origin_id.is_some()
    }

    /// Returns true for agents and admins.
    #[must_use]
    pub fn is_agent(&self) -> bool {
        self.role.is_some_and(UserRole::is_agent)
    }
}

impl Record for User {
    type Id = LocalId;
    const TABLE: Table = Table::User;

    fn id(&self) -> Option<LocalId> {
        self.id
    }

    fn assign_id(&mut self, id: LocalId) {
        self.id = Some(id);
    }

    fn index_keys(&self) -> Vec<IndexKey> {
        let mut keys: Vec<IndexKey> = self.origin_key().into_iter().collect();
        if let (Some(channel), Some(email)) = (self.channel, self.email.as_deref()) {
            keys.push(IndexKey::email(Some(channel), email));
        }
        if let (Some(channel), Some(user)) = (self.channel, self.related_user) {
            keys.push(IndexKey::CrmUser { channel, user });
        }
        keys
    }
}

impl Synced for User {
    fn origin_id(&self) -> Option<OriginId> {
        self.origin_id
    }

    fn channel(&self) -> Option<ChannelId> {
        self.channel
    }

    fn set_channel(&mut self, channel: ChannelId) {
        self.channel = Some(channel);
    }
}

//! Configured Zendesk channels.

use crate::ids::{ChannelId, CrmUserId};
use crate::record::{Record, Table};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side wins when both changed since the last sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncPriority {
    /// Remote state overwrites local edits.
    #[default]
    Remote,
    /// Pending local edits survive an import.
    Local,
}

/// Credentials of a Zendesk account.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ZendeskCredentials {
    /// Account subdomain (`acme` for `acme.zendesk.com`).
    pub sub_domain: String,
    /// Email of the API user.
    pub email: String,
    /// API token.
    pub api_token: String,
    /// Email of the Zendesk user substituted for unresolvable users.
    pub default_user_email: String,
}

impl fmt::Debug for ZendeskCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZendeskCredentials")
            .field("sub_domain", &self.sub_domain)
            .field("email", &self.email)
            .field("api_token", &"<redacted>")
            .field("default_user_email", &self.default_user_email)
            .finish()
    }
}

/// Per-channel sync behavior.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncSettings {
    /// CRM user owning records created by the sync.
    pub default_user_owner: Option<CrmUserId>,
    /// Conflict side.
    #[serde(default)]
    pub sync_priority: SyncPriority,
    /// Push CRM edits back to Zendesk.
    #[serde(default)]
    pub two_way_sync: bool,
}

/// One configured connection to a Zendesk account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Channel id.
    pub id: ChannelId,
    /// Display name.
    pub name: String,
    /// Disabled channels are skipped by every batch.
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    /// Account credentials.
    pub transport: ZendeskCredentials,
    /// Sync behavior.
    #[serde(default)]
    pub settings: SyncSettings,
}

fn enabled_default() -> bool {
    true
}

impl Channel {
    /// Creates an enabled channel with default settings.
    pub fn new(id: ChannelId, name: impl Into<String>, transport: ZendeskCredentials) -> Self {
        Self {
            id,
            name: name.into(),
            enabled: true,
            transport,
            settings: SyncSettings::default(),
        }
    }

    /// Root url of the account API.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("https://{}.zendesk.com", self.transport.sub_domain)
    }

    /// Returns true when CRM edits are pushed to Zendesk.
    #[must_use]
    pub fn is_two_way(&self) -> bool {
        self.enabled && self.settings.two_way_sync
    }
}

impl Record for Channel {
    type Id = ChannelId;
    const TABLE: Table = Table::Channel;

    fn id(&self) -> Option<ChannelId> {
        Some(self.id)
    }

    fn assign_id(&mut self, id: ChannelId) {
        self.id = id;
    }
}

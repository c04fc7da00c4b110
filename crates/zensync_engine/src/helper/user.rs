use super::{SyncHelper, SyncScope};
use crate::error::{SyncError, SyncResult};
use crate::kind::EntityKind;
use zensync_api::{RemoteRecord, RemoteUser, ZendeskTransport};
use zensync_model::{Contact, OriginId, User};
use zensync_store::EntityStore;

/// A personal name split into contact name fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NameParts {
    /// Prefix such as "Dr".
    pub prefix: Option<String>,
    /// First name.
    pub first: String,
    /// Middle name.
    pub middle: Option<String>,
    /// Last name.
    pub last: String,
    /// Suffix such as "Jr".
    pub suffix: Option<String>,
}

fn is_affix(part: &str, affixes: &[String]) -> bool {
    let part = part.trim_end_matches('.');
    affixes.iter().any(|a| a.eq_ignore_ascii_case(part))
}

/// Splits a full name.
///
/// Prefixes and suffixes are only recognized when at least three words
/// remain. A single word is used as both first and last name. Returns
/// `None` for a blank name.
pub fn split_name(name: &str, prefixes: &[String], suffixes: &[String]) -> Option<NameParts> {
    const MAX_PARTS: usize = 5;

    let words: Vec<&str> = name.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }
    let mut parts: Vec<String> = words.iter().take(MAX_PARTS - 1).map(|w| w.to_string()).collect();
    if words.len() >= MAX_PARTS {
        parts.push(words[MAX_PARTS - 1..].join(" "));
    }

    let mut split = NameParts::default();
    if parts.len() > 2 && is_affix(&parts[0], prefixes) {
        split.prefix = Some(parts.remove(0));
    }
    if parts.len() > 2 && parts.last().is_some_and(|p| is_affix(p, suffixes)) {
        split.suffix = parts.pop();
    }

    split.first = parts[0].clone();
    if parts.len() > 2 {
        split.middle = Some(parts[1].clone());
        split.last = parts[2..].join(" ");
    } else {
        split.last = parts.get(1).unwrap_or(&parts[0]).clone();
    }
    Some(split)
}

/// Sync rules for Zendesk users.
#[derive(Debug)]
pub struct UserSyncHelper<'a, S> {
    scope: SyncScope<'a, S>,
}

impl<'a, S: EntityStore> UserSyncHelper<'a, S> {
    /// Creates a helper.
    pub fn new(scope: SyncScope<'a, S>) -> Self {
        Self { scope }
    }

    /// The channel's default Zendesk user.
    pub fn find_default_user(&self) -> SyncResult<Option<User>> {
        Ok(self.scope.resolver().find_default_user()?)
    }

    /// Creates a local user in Zendesk and stores the assigned origin id.
    pub fn create_remote_user<T: ZendeskTransport>(
        &self,
        transport: &T,
        user: &mut User,
    ) -> SyncResult<()> {
        let created = transport
            .create_user(&RemoteUser::from(&*user))
            .map_err(SyncError::remote_write)?;
        user.origin_id = created.id.map(OriginId::new);
        user.url = created.url;
        user.origin_created_at = created.created_at;
        user.origin_updated_at = created.updated_at;
        if user.channel.is_none() {
            user.channel = Some(self.scope.channel.id);
        }
        self.scope.store.save(user)?;
        tracing::info!(origin_id = ?user.origin_id, "created user in Zendesk");
        Ok(())
    }

    /// Pushes local user fields to an existing Zendesk user.
    pub fn update_remote_user<T: ZendeskTransport>(
        &self,
        transport: &T,
        user: &mut User,
    ) -> SyncResult<()> {
        let updated = transport
            .update_user(&RemoteUser::from(&*user))
            .map_err(SyncError::remote_write)?;
        user.origin_updated_at = updated.updated_at;
        self.scope.store.save(user)?;
        Ok(())
    }

    fn find_or_create_contact(&self, user: &User) -> SyncResult<Option<Contact>> {
        let Some(email) = user.email.as_deref().filter(|e| !e.trim().is_empty()) else {
            return Ok(None);
        };
        if let Some(contact) = self.scope.resolver().find_contact(email)? {
            return Ok(Some(contact));
        }

        let config = self.scope.config;
        let Some(name) = split_name(&user.name, &config.name_prefixes, &config.name_suffixes)
        else {
            tracing::warn!(email, "user has no name, contact not created");
            return Ok(None);
        };
        let mut contact = Contact {
            name_prefix: name.prefix,
            first_name: name.first,
            middle_name: name.middle,
            last_name: name.last,
            name_suffix: name.suffix,
            owner: self.scope.default_owner(),
            phones: user.phone.iter().cloned().collect(),
            ..Contact::default()
        };
        contact.add_email(email.trim());
        self.scope.store.save(&mut contact)?;
        tracing::info!(contact = ?contact.id, "created contact");
        Ok(Some(contact))
    }
}

impl<S: EntityStore> SyncHelper for UserSyncHelper<'_, S> {
    type Entity = User;
    const ENTITY: EntityKind = EntityKind::User;

    fn extract(&self, record: RemoteRecord) -> SyncResult<User> {
        match record {
            RemoteRecord::User(remote) => Ok(User::from(&remote)),
            other => Err(SyncError::TypeMismatch {
                expected: Self::ENTITY,
                found: other.kind(),
            }),
        }
    }

    fn refresh_entity(&self, user: &mut User) -> SyncResult<()> {
        user.channel = Some(self.scope.channel.id);
        Ok(())
    }

    fn find_entity(&self, user: &User) -> SyncResult<Option<User>> {
        Ok(self.scope.resolver().find_user(user)?)
    }

    fn copy_entity_properties(&self, target: &mut User, source: &User) {
        if target.origin_id.is_none() {
            target.origin_id = source.origin_id;
        }
        target.url = source.url.clone();
        target.name = source.name.clone();
        target.email = source.email.clone();
        target.phone = source.phone.clone();
        target.role = source.role;
        target.active = source.active;
        target.origin_created_at = source.origin_created_at;
        target.origin_updated_at = source.origin_updated_at;
    }

    fn sync_related_entities(&self, user: &mut User) -> SyncResult<()> {
        if user.is_agent() {
            if user.related_user.is_none() {
                if let Some(email) = user.email.as_deref() {
                    user.related_user = self
                        .scope
                        .resolver()
                        .find_crm_user(email)?
                        .and_then(|crm| crm.id);
                }
            }
        } else if user.related_contact.is_none() {
            user.related_contact = self.find_or_create_contact(user)?.and_then(|c| c.id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use zensync_api::MockTransport;
    use zensync_model::{
        Channel, ChannelId, CrmUser, CrmUserId, IndexKey, UserRole, ZendeskCredentials,
    };
    use zensync_store::InMemoryStore;

    fn split(name: &str) -> Option<NameParts> {
        let config = SyncConfig::default();
        split_name(name, &config.name_prefixes, &config.name_suffixes)
    }

    fn channel() -> Channel {
        let mut channel = Channel::new(
            ChannelId::new(1),
            "Acme",
            ZendeskCredentials {
                default_user_email: "support@acme.com".into(),
                ..ZendeskCredentials::default()
            },
        );
        channel.settings.default_user_owner = Some(CrmUserId::new(77));
        channel
    }

    #[test]
    fn import_links_unsynced_user_by_email() {
        let store = InMemoryStore::new();
        let channel = channel();
        let config = SyncConfig::default();
        let mut local = User::new("A. Person", Some("a@x.com".into()));
        local.channel = Some(channel.id);
        let local_id = store.save(&mut local).unwrap();

        let processor = crate::import::ImportProcessor::new(UserSyncHelper::new(
            SyncScope::new(&store, &channel, &config),
        ));
        let remote = RemoteUser {
            id: Some(42),
            name: "A. Person".into(),
            email: Some("A@x.com".into()),
            role: Some("end-user".into()),
            ..RemoteUser::default()
        };
        let mut report = crate::report::BatchReport::new();
        let mut merged = processor
            .process(RemoteRecord::User(remote), &mut report)
            .unwrap()
            .unwrap();
        store.save(&mut merged).unwrap();

        assert_eq!(report.added, 0);
        assert_eq!(report.updated, 1);
        assert_eq!(merged.id, Some(local_id));
        assert_eq!(merged.origin_id, Some(OriginId::new(42)));
        let users: Vec<User> = store
            .find_all(&IndexKey::email(Some(channel.id), "a@x.com"))
            .unwrap();
        assert_eq!(users.len(), 1);
    }

    #[test]
    fn split_two_words() {
        let parts = split("Jane Doe").unwrap();
        assert_eq!(parts.first, "Jane");
        assert_eq!(parts.last, "Doe");
        assert_eq!(parts.middle, None);
    }

    #[test]
    fn split_single_word_is_first_and_last() {
        let parts = split("  Cher ").unwrap();
        assert_eq!(parts.first, "Cher");
        assert_eq!(parts.last, "Cher");
    }

    #[test]
    fn split_blank_name() {
        assert_eq!(split("   "), None);
    }

    #[test]
    fn split_prefix_middle_suffix() {
        let parts = split("Dr. John Ronald Tolkien Jr.").unwrap();
        assert_eq!(parts.prefix.as_deref(), Some("Dr."));
        assert_eq!(parts.first, "John");
        assert_eq!(parts.middle.as_deref(), Some("Ronald"));
        assert_eq!(parts.last, "Tolkien");
        assert_eq!(parts.suffix.as_deref(), Some("Jr."));
    }

    #[test]
    fn split_short_name_keeps_prefix_word() {
        let parts = split("Dr Who").unwrap();
        assert_eq!(parts.prefix, None);
        assert_eq!(parts.first, "Dr");
        assert_eq!(parts.last, "Who");
    }

    #[test]
    fn split_long_name_joins_tail() {
        let parts = split("Anna Maria de la Cruz Lopez").unwrap();
        assert_eq!(parts.first, "Anna");
        assert_eq!(parts.middle.as_deref(), Some("Maria"));
        assert_eq!(parts.last, "de la Cruz Lopez");
    }

    #[test]
    fn end_user_gets_new_contact() {
        let store = InMemoryStore::new();
        let channel = channel();
        let config = SyncConfig::default();
        let helper = UserSyncHelper::new(SyncScope::new(&store, &channel, &config));

        let mut user = User::new("Jane Doe", Some("Jane@X.com".into()));
        user.phone = Some("555-0100".into());
        user.role = Some(UserRole::EndUser);
        helper.sync_related_entities(&mut user).unwrap();

        let contact: Contact = store.get(user.related_contact.unwrap()).unwrap().unwrap();
        assert_eq!(contact.first_name, "Jane");
        assert_eq!(contact.last_name, "Doe");
        assert_eq!(contact.owner, Some(CrmUserId::new(77)));
        assert_eq!(contact.phones, ["555-0100"]);
        assert!(contact.is_primary_email("jane@x.com"));
    }

    #[test]
    fn end_user_reuses_existing_contact() {
        let store = InMemoryStore::new();
        let mut existing = Contact::default();
        existing.add_email("jane@x.com");
        let contact_id = store.save(&mut existing).unwrap();

        let channel = channel();
        let config = SyncConfig::default();
        let helper = UserSyncHelper::new(SyncScope::new(&store, &channel, &config));

        let mut user = User::new("Jane Doe", Some("jane@x.com".into()));
        helper.sync_related_entities(&mut user).unwrap();
        assert_eq!(user.related_contact, Some(contact_id));
        assert_eq!(store.all::<Contact>().unwrap().len(), 1);
    }

    #[test]
    fn user_without_email_gets_no_contact() {
        let store = InMemoryStore::new();
        let channel = channel();
        let config = SyncConfig::default();
        let helper = UserSyncHelper::new(SyncScope::new(&store, &channel, &config));

        let mut user = User::new("Jane Doe", None);
        helper.sync_related_entities(&mut user).unwrap();
        assert_eq!(user.related_contact, None);

        let mut nameless = User::new(" ", Some("x@y.com".into()));
        helper.sync_related_entities(&mut nameless).unwrap();
        assert_eq!(nameless.related_contact, None);
        assert!(store.all::<Contact>().unwrap().is_empty());
    }

    #[test]
    fn agent_links_crm_user() {
        let store = InMemoryStore::new();
        let mut crm = CrmUser::new("Agent", "agent@crm.com");
        crm.secondary_emails.push("agent@acme.zendesk.com".into());
        let crm_id = store.save(&mut crm).unwrap();

        let channel = channel();
        let config = SyncConfig::default();
        let helper = UserSyncHelper::new(SyncScope::new(&store, &channel, &config));

        let mut user = User::new("Agent", Some("agent@acme.zendesk.com".into()));
        user.role = Some(UserRole::Agent);
        helper.sync_related_entities(&mut user).unwrap();
        assert_eq!(user.related_user, Some(crm_id));
        assert_eq!(user.related_contact, None);
    }

    #[test]
    fn create_remote_user_stores_origin_id() {
        let store = InMemoryStore::new();
        let channel = channel();
        let config = SyncConfig::default();
        let helper = UserSyncHelper::new(SyncScope::new(&store, &channel, &config));
        let transport = MockTransport::new();
        transport.set_next_user_id(42);

        let mut user = User::new("Jane", Some("jane@x.com".into()));
        helper.create_remote_user(&transport, &mut user).unwrap();

        assert_eq!(user.origin_id, Some(OriginId::new(42)));
        assert_eq!(user.channel, Some(ChannelId::new(1)));
        let stored: Option<User> = store
            .find_one(&IndexKey::Origin {
                channel: ChannelId::new(1),
                origin_id: OriginId::new(42),
            })
            .unwrap();
        assert_eq!(stored.and_then(|u| u.id), user.id);
    }
}

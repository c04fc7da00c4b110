//! Identity resolution of remote records against the local store.
//!
//! Every lookup is scoped to one channel and never writes. A record that
//! belongs to another channel is reported as not found.

use zensync_model::{
    Channel, Contact, CrmUser, CrmUserId, IndexKey, LocalId, OriginId, Synced, SyncRef, Ticket,
    TicketComment, User,
};
use zensync_store::{EntityStore, StoreResult};

/// Channel-scoped lookups of local records.
#[derive(Debug)]
pub struct IdentityResolver<'a, S> {
    store: &'a S,
    channel: &'a Channel,
}

impl<S> Clone for IdentityResolver<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for IdentityResolver<'_, S> {}

impl<'a, S: EntityStore> IdentityResolver<'a, S> {
    /// Creates a resolver for a channel.
    pub fn new(store: &'a S, channel: &'a Channel) -> Self {
        Self { store, channel }
    }

    /// Returns the channel lookups are scoped to.
    pub fn channel(&self) -> &'a Channel {
        self.channel
    }

    /// Finds a synced record by its origin id.
    pub fn find_by_origin<E: Synced>(&self, origin_id: OriginId) -> StoreResult<Option<E>> {
        self.store.find_one(&IndexKey::Origin {
            channel: self.channel.id,
            origin_id,
        })
    }

    /// Loads a record by local id, provided it belongs to this channel.
    pub fn get<E: Synced>(&self, id: LocalId) -> StoreResult<Option<E>> {
        Ok(self
            .store
            .get::<E>(id)?
            .filter(|entity| entity.channel() == Some(self.channel.id)))
    }

    /// Resolves a reference: by local id when it has one, else by origin id.
    pub fn resolve<E: Synced>(&self, reference: &SyncRef) -> StoreResult<Option<E>> {
        if let Some(id) = reference.id {
            return self.get(id);
        }
        match reference.origin_id {
            Some(origin_id) => self.find_by_origin(origin_id),
            None => Ok(None),
        }
    }

    /// Finds the local copy of a Zendesk user.
    ///
    /// Matches by origin id first. When that misses, email is the join key:
    /// a user with an origin id only adopts a local user that was never
    /// synced, while a user without one takes any match.
    pub fn find_user(&self, user: &User) -> StoreResult<Option<User>> {
        let Some(origin_id) = user.origin_id else {
            return match user.email.as_deref() {
                Some(email) => self.find_user_by_email(email),
                None => Ok(None),
            };
        };
        if let Some(found) = self.find_by_origin(origin_id)? {
            return Ok(Some(found));
        }
        match user.email.as_deref() {
            Some(email) => self.find_unsynced_user_by_email(email),
            None => Ok(None),
        }
    }

    /// Finds a never-synced Zendesk user by email within the channel.
    pub fn find_unsynced_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        if email.trim().is_empty() {
            return Ok(None);
        }
        Ok(self
            .store
            .find_all::<User>(&IndexKey::email(Some(self.channel.id), email))?
            .into_iter()
            .find(|u| u.origin_id.is_none()))
    }

    /// Finds a Zendesk user by email within the channel.
    pub fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        if email.trim().is_empty() {
            return Ok(None);
        }
        self.store
            .find_one(&IndexKey::email(Some(self.channel.id), email))
    }

    /// Finds the Zendesk user linked to a CRM user.
    pub fn find_user_for_crm_user(&self, user: CrmUserId) -> StoreResult<Option<User>> {
        self.store.find_one(&IndexKey::CrmUser {
            channel: self.channel.id,
            user,
        })
    }

    /// Finds the channel's default Zendesk user.
    pub fn find_default_user(&self) -> StoreResult<Option<User>> {
        self.find_user_by_email(&self.channel.transport.default_user_email)
    }

    /// Finds a ticket by origin id.
    pub fn find_ticket(&self, origin_id: OriginId) -> StoreResult<Option<Ticket>> {
        self.find_by_origin(origin_id)
    }

    /// Finds a comment of a local ticket by origin id.
    pub fn find_comment(
        &self,
        ticket: LocalId,
        origin_id: OriginId,
    ) -> StoreResult<Option<TicketComment>> {
        Ok(self
            .store
            .find_all::<TicketComment>(&IndexKey::Ticket(ticket))?
            .into_iter()
            .find(|c| c.origin_id == Some(origin_id) && c.channel == Some(self.channel.id)))
    }

    /// Finds a pending comment of a local ticket with the given body.
    ///
    /// Used to adopt a comment that was pushed but whose remote id was never
    /// read back.
    pub fn find_pending_comment(
        &self,
        ticket: LocalId,
        body: &str,
    ) -> StoreResult<Option<TicketComment>> {
        Ok(self
            .store
            .find_all::<TicketComment>(&IndexKey::Ticket(ticket))?
            .into_iter()
            .find(|c| {
                c.is_pending_export()
                    && c.channel == Some(self.channel.id)
                    && c.body.trim() == body.trim()
            }))
    }

    /// Finds a CRM user by primary email, then by secondary email.
    pub fn find_crm_user(&self, email: &str) -> StoreResult<Option<CrmUser>> {
        if let Some(user) = self.store.find_one(&IndexKey::email(None, email))? {
            return Ok(Some(user));
        }
        self.store.find_one(&IndexKey::secondary_email(email))
    }

    /// Finds a CRM contact by email, preferring contacts where it is primary.
    pub fn find_contact(&self, email: &str) -> StoreResult<Option<Contact>> {
        let mut contacts: Vec<Contact> = self.store.find_all(&IndexKey::email(None, email))?;
        let primary = contacts.iter().position(|c| c.is_primary_email(email));
        Ok(match primary {
            Some(index) => Some(contacts.swap_remove(index)),
            None => contacts.into_iter().next(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zensync_model::{ChannelId, ZendeskCredentials};
    use zensync_store::InMemoryStore;

    fn channel(id: u64) -> Channel {
        Channel::new(
            ChannelId::new(id),
            "Acme",
            ZendeskCredentials {
                sub_domain: "acme".into(),
                default_user_email: "support@acme.com".into(),
                ..ZendeskCredentials::default()
            },
        )
    }

    fn user(channel: u64, origin: Option<u64>, email: &str) -> User {
        let mut user = User::new("Jane", Some(email.into()));
        user.channel = Some(ChannelId::new(channel));
        user.origin_id = origin.map(OriginId::new);
        user
    }

    #[test]
    fn resolve_by_origin_is_channel_scoped() {
        let store = InMemoryStore::new();
        store.save(&mut user(1, Some(42), "jane@x.com")).unwrap();

        let acme = channel(1);
        let other = channel(2);
        let found: Option<User> = IdentityResolver::new(&store, &acme)
            .find_by_origin(OriginId::new(42))
            .unwrap();
        assert!(found.is_some());

        let found: Option<User> = IdentityResolver::new(&store, &other)
            .find_by_origin(OriginId::new(42))
            .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn resolve_local_id_rejects_other_channel() {
        let store = InMemoryStore::new();
        let id = store.save(&mut user(2, None, "jane@x.com")).unwrap();

        let acme = channel(1);
        let resolver = IdentityResolver::new(&store, &acme);
        let found: Option<User> = resolver.resolve(&SyncRef::local(id)).unwrap();
        assert!(found.is_none());
        let found: Option<User> = resolver.resolve(&SyncRef::default()).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn user_without_origin_matches_by_email() {
        let store = InMemoryStore::new();
        store.save(&mut user(1, Some(7), "Jane@X.com")).unwrap();

        let acme = channel(1);
        let resolver = IdentityResolver::new(&store, &acme);
        let probe = User::new("Jane", Some("jane@x.com ".into()));
        assert_eq!(
            resolver.find_user(&probe).unwrap().and_then(|u| u.origin_id),
            Some(OriginId::new(7))
        );

        let stranger = User::new("Jane", None);
        assert!(resolver.find_user(&stranger).unwrap().is_none());
    }

    #[test]
    fn synced_user_adopts_unsynced_email_match() {
        let store = InMemoryStore::new();
        store.save(&mut user(1, Some(7), "jane@x.com")).unwrap();
        let local = store.save(&mut user(1, None, "jane@x.com")).unwrap();

        let acme = channel(1);
        let resolver = IdentityResolver::new(&store, &acme);
        let inbound = user(1, Some(42), "Jane@X.com");
        let found = resolver.find_user(&inbound).unwrap().unwrap();
        assert_eq!(found.id, Some(local));
        assert!(found.origin_id.is_none());

        let known = user(1, Some(7), "other@x.com");
        assert_eq!(
            resolver.find_user(&known).unwrap().and_then(|u| u.origin_id),
            Some(OriginId::new(7))
        );
    }

    #[test]
    fn synced_user_never_takes_over_another_origin() {
        let store = InMemoryStore::new();
        store.save(&mut user(1, Some(7), "jane@x.com")).unwrap();

        let acme = channel(1);
        let inbound = user(1, Some(42), "jane@x.com");
        assert!(IdentityResolver::new(&store, &acme)
            .find_user(&inbound)
            .unwrap()
            .is_none());
    }

    #[test]
    fn default_user_by_configured_email() {
        let store = InMemoryStore::new();
        store.save(&mut user(1, Some(1), "support@acme.com")).unwrap();

        let acme = channel(1);
        let default = IdentityResolver::new(&store, &acme).find_default_user().unwrap();
        assert_eq!(default.and_then(|u| u.origin_id), Some(OriginId::new(1)));
    }

    #[test]
    fn crm_user_falls_back_to_secondary_email() {
        let store = InMemoryStore::new();
        let mut crm = CrmUser::new("Agent", "agent@crm.com");
        crm.secondary_emails.push("agent@zendesk.com".into());
        store.save(&mut crm).unwrap();

        let acme = channel(1);
        let resolver = IdentityResolver::new(&store, &acme);
        assert!(resolver.find_crm_user("agent@crm.com").unwrap().is_some());
        assert!(resolver.find_crm_user("AGENT@zendesk.com").unwrap().is_some());
        assert!(resolver.find_crm_user("nobody@crm.com").unwrap().is_none());
    }

    #[test]
    fn contact_prefers_primary_email() {
        let store = InMemoryStore::new();
        let mut secondary = Contact {
            first_name: "Secondary".into(),
            ..Contact::default()
        };
        secondary.add_email("other@x.com");
        secondary.add_email("jane@x.com");
        store.save(&mut secondary).unwrap();

        let mut primary = Contact {
            first_name: "Primary".into(),
            ..Contact::default()
        };
        primary.add_email("jane@x.com");
        store.save(&mut primary).unwrap();

        let acme = channel(1);
        let found = IdentityResolver::new(&store, &acme)
            .find_contact("jane@x.com")
            .unwrap()
            .unwrap();
        assert_eq!(found.first_name, "Primary");
    }

    #[test]
    fn comment_by_ticket_and_origin() {
        let store = InMemoryStore::new();
        let mut comment = TicketComment::new("hi");
        comment.channel = Some(ChannelId::new(1));
        comment.origin_id = Some(OriginId::new(500));
        comment.ticket = Some(SyncRef::local(LocalId::new(3)));
        store.save(&mut comment).unwrap();

        let acme = channel(1);
        let resolver = IdentityResolver::new(&store, &acme);
        assert!(resolver
            .find_comment(LocalId::new(3), OriginId::new(500))
            .unwrap()
            .is_some());
        assert!(resolver
            .find_comment(LocalId::new(4), OriginId::new(500))
            .unwrap()
            .is_none());
    }
}

//! Test fixtures and store helpers.
//!
//! Provides a standard test channel, local records attached to it, and a
//! mock Zendesk account seeded with one requester, one agent, one ticket
//! and one comment.

use std::path::Path;
use tempfile::TempDir;
use zensync_api::{MockTransport, RemoteComment, RemoteTicket, RemoteUser};
use zensync_model::{
    Case, Channel, ChannelId, CrmUser, CrmUserId, Lookup, OriginId, Ticket, User, UserRole,
    ZendeskCredentials,
};
use zensync_store::{EntityStore, FileStore};

/// Id of the channel returned by [`test_channel`].
pub const CHANNEL_ID: ChannelId = ChannelId::new(1);

/// Email of the channel's default Zendesk user.
pub const DEFAULT_USER_EMAIL: &str = "support@acme.com";

/// CRM user owning records created by the sync.
pub const DEFAULT_OWNER: CrmUserId = CrmUserId::new(1);

/// An enabled one-way channel for the `acme` account.
pub fn test_channel() -> Channel {
    let mut channel = Channel::new(
        CHANNEL_ID,
        "Acme support",
        ZendeskCredentials {
            sub_domain: "acme".into(),
            email: "sync@acme.com".into(),
            api_token: "test-token".into(),
            default_user_email: DEFAULT_USER_EMAIL.into(),
        },
    );
    channel.settings.default_user_owner = Some(DEFAULT_OWNER);
    channel
}

/// A file store in a temporary directory, removed on drop.
pub struct TestStore {
    /// The store.
    pub store: FileStore,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: TempDir,
}

impl TestStore {
    /// Opens an empty store.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store =
            FileStore::open(&temp_dir.path().join("store")).expect("Failed to open file store");
        Self { store, temp_dir }
    }

    /// Returns the store directory.
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Returns the temporary root directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestStore {
    type Target = FileStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// A remote end user.
pub fn remote_end_user(id: u64, name: &str, email: &str) -> RemoteUser {
    RemoteUser {
        id: Some(id),
        name: name.into(),
        email: Some(email.into()),
        role: Some(UserRole::EndUser.name().into()),
        active: Some(true),
        ..RemoteUser::default()
    }
}

/// A remote agent.
pub fn remote_agent(id: u64, name: &str, email: &str) -> RemoteUser {
    RemoteUser {
        role: Some(UserRole::Agent.name().into()),
        ..remote_end_user(id, name, email)
    }
}

/// A local user of the test channel, already synced when `origin_id` is set.
pub fn local_user(name: &str, email: &str, origin_id: Option<u64>) -> User {
    let mut user = User::new(name, Some(email.into()));
    user.channel = Some(CHANNEL_ID);
    user.origin_id = origin_id.map(OriginId::new);
    user
}

/// A local, unsynced ticket of the test channel.
pub fn local_ticket(subject: &str, description: &str) -> Ticket {
    let mut ticket = Ticket::new(subject, description);
    ticket.channel = Some(CHANNEL_ID);
    ticket
}

/// Saves the channel's default user with the given remote id.
pub fn save_default_user<S: EntityStore>(store: &S, origin_id: u64) -> User {
    let mut user = local_user("Acme Support", DEFAULT_USER_EMAIL, Some(origin_id));
    user.role = Some(UserRole::Agent);
    store.save(&mut user).expect("Failed to save default user");
    user
}

/// Saves a CRM user.
pub fn save_crm_user<S: EntityStore>(store: &S, name: &str, email: &str) -> CrmUser {
    let mut user = CrmUser::new(name, email);
    store.save(&mut user).expect("Failed to save CRM user");
    user
}

/// Saves a case owned by the default owner.
pub fn save_case<S: EntityStore>(store: &S, subject: &str) -> Case {
    let mut case = Case::new(subject);
    case.owner = Some(DEFAULT_OWNER);
    store.save(&mut case).expect("Failed to save case");
    case
}

/// Remote ids of a [`seeded_account`].
#[derive(Debug)]
pub struct SeededAccount {
    /// The mock account.
    pub transport: MockTransport,
    /// End user who opened the ticket.
    pub requester: u64,
    /// Agent the ticket is assigned to.
    pub agent: u64,
    /// The ticket.
    pub ticket: u64,
    /// The ticket's first comment.
    pub comment: u64,
}

/// A mock account with one requester, one agent, one ticket and one comment.
///
/// Remote ids are fixed: requester 42, agent 7, ticket 100.
pub fn seeded_account() -> SeededAccount {
    let transport = MockTransport::new();
    let requester = transport.insert_user(remote_end_user(42, "Jane Q. Roe", "jane@example.com"));
    let agent = transport.insert_user(remote_agent(7, "Sam Agent", "sam@acme.com"));
    let ticket = transport.insert_ticket(RemoteTicket {
        id: Some(100),
        subject: "Printer on fire".into(),
        description: "The office printer is on fire".into(),
        status: Some("open".into()),
        priority: Some("high".into()),
        requester_id: Some(requester),
        assignee_id: Some(agent),
        submitter_id: Some(requester),
        ..RemoteTicket::default()
    });
    let comment = transport.insert_comment(
        ticket,
        RemoteComment {
            body: "The office printer is on fire".into(),
            author_id: Some(requester),
            ..RemoteComment::default()
        },
    );
    SeededAccount {
        transport,
        requester,
        agent,
        ticket,
        comment,
    }
}

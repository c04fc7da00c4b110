//! Transport layer abstraction for the Zendesk API.

use crate::error::{ApiError, ApiResult};
use crate::wire::{CreatedTicket, RemoteComment, RemoteTicket, RemoteUser};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// A Zendesk transport talks to one Zendesk account.
///
/// This trait abstracts the network layer, allowing for different
/// implementations (HTTP, in-memory mock for testing, etc.). All calls are
/// blocking.
pub trait ZendeskTransport: Send + Sync {
    /// Lists every user.
    fn list_users(&self) -> ApiResult<Vec<RemoteUser>>;

    /// Fetches one user.
    fn get_user(&self, id: u64) -> ApiResult<RemoteUser>;

    /// Creates a user and returns the stored state.
    fn create_user(&self, user: &RemoteUser) -> ApiResult<RemoteUser>;

    /// Updates a user and returns the stored state.
    fn update_user(&self, user: &RemoteUser) -> ApiResult<RemoteUser>;

    /// Lists every ticket.
    fn list_tickets(&self) -> ApiResult<Vec<RemoteTicket>>;

    /// Fetches one ticket.
    fn get_ticket(&self, id: u64) -> ApiResult<RemoteTicket>;

    /// Creates a ticket. Zendesk creates the initial comment from the
    /// ticket's `comment` field and returns it alongside.
    ///
    /// Once the ticket is stored the call succeeds; an initial comment that
    /// cannot be read back is reported as `None`.
    fn create_ticket(&self, ticket: &RemoteTicket) -> ApiResult<CreatedTicket>;

    /// Updates a ticket and returns the stored state.
    fn update_ticket(&self, ticket: &RemoteTicket) -> ApiResult<RemoteTicket>;

    /// Lists the comments of a ticket in creation order.
    fn list_ticket_comments(&self, ticket_id: u64) -> ApiResult<Vec<RemoteComment>>;

    /// Appends a comment to a ticket and returns the stored comment.
    ///
    /// Once the comment is stored the call succeeds. When its id cannot be
    /// read back the returned comment has no `id`.
    fn add_ticket_comment(&self, ticket_id: u64, comment: &RemoteComment)
        -> ApiResult<RemoteComment>;

    /// Checks if the transport is connected.
    fn is_connected(&self) -> bool;

    /// Closes the transport.
    fn close(&self);
}

impl<T: ZendeskTransport + ?Sized> ZendeskTransport for &T {
    fn list_users(&self) -> ApiResult<Vec<RemoteUser>> {
        (**self).list_users()
    }

    fn get_user(&self, id: u64) -> ApiResult<RemoteUser> {
        (**self).get_user(id)
    }

    fn create_user(&self, user: &RemoteUser) -> ApiResult<RemoteUser> {
        (**self).create_user(user)
    }

    fn update_user(&self, user: &RemoteUser) -> ApiResult<RemoteUser> {
        (**self).update_user(user)
    }

    fn list_tickets(&self) -> ApiResult<Vec<RemoteTicket>> {
        (**self).list_tickets()
    }

    fn get_ticket(&self, id: u64) -> ApiResult<RemoteTicket> {
        (**self).get_ticket(id)
    }

    fn create_ticket(&self, ticket: &RemoteTicket) -> ApiResult<CreatedTicket> {
        (**self).create_ticket(ticket)
    }

    fn update_ticket(&self, ticket: &RemoteTicket) -> ApiResult<RemoteTicket> {
        (**self).update_ticket(ticket)
    }

    fn list_ticket_comments(&self, ticket_id: u64) -> ApiResult<Vec<RemoteComment>> {
        (**self).list_ticket_comments(ticket_id)
    }

    fn add_ticket_comment(
        &self,
        ticket_id: u64,
        comment: &RemoteComment,
    ) -> ApiResult<RemoteComment> {
        (**self).add_ticket_comment(ticket_id, comment)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn close(&self) {
        (**self).close();
    }
}

/// Kind of a transport call, as recorded by [`MockTransport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiCall {
    /// `list_users`.
    ListUsers,
    /// `get_user`.
    GetUser,
    /// `create_user`.
    CreateUser,
    /// `update_user`.
    UpdateUser,
    /// `list_tickets`.
    ListTickets,
    /// `get_ticket`.
    GetTicket,
    /// `create_ticket`.
    CreateTicket,
    /// `update_ticket`.
    UpdateTicket,
    /// `list_ticket_comments`.
    ListComments,
    /// `add_ticket_comment`.
    AddComment,
}

#[derive(Debug)]
struct MockState {
    next_user_id: u64,
    next_ticket_id: u64,
    next_comment_id: u64,
    users: BTreeMap<u64, RemoteUser>,
    tickets: BTreeMap<u64, RemoteTicket>,
    comments: BTreeMap<u64, Vec<RemoteComment>>,
    calls: Vec<ApiCall>,
    failures: Vec<(ApiCall, ApiError)>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            next_user_id: 1,
            next_ticket_id: 1,
            next_comment_id: 1,
            users: BTreeMap::new(),
            tickets: BTreeMap::new(),
            comments: BTreeMap::new(),
            calls: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl MockState {
    fn enter(&mut self, call: ApiCall) -> ApiResult<()> {
        self.calls.push(call);
        match self.failures.iter().position(|(c, _)| *c == call) {
            Some(index) => Err(self.failures.remove(index).1),
            None => Ok(()),
        }
    }

    fn store_comment(&mut self, ticket_id: u64, comment: &RemoteComment) -> RemoteComment {
        let mut stored = comment.clone();
        let id = stored.id.unwrap_or_else(|| {
            let id = self.next_comment_id;
            self.next_comment_id += 1;
            id
        });
        self.next_comment_id = self.next_comment_id.max(id + 1);
        stored.id = Some(id);
        stored.ticket_id = Some(ticket_id);
        if stored.html_body.is_none() {
            stored.html_body = Some(format!("<p>{}</p>", stored.body));
        }
        stored.created_at.get_or_insert_with(Utc::now);
        self.comments.entry(ticket_id).or_default().push(stored.clone());
        stored
    }
}

/// An in-memory Zendesk account for testing.
///
/// Assigns ids the way Zendesk does, records every call, and can be told to
/// fail the next call of a given kind.
#[derive(Debug)]
pub struct MockTransport {
    connected: AtomicBool,
    state: Mutex<MockState>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Creates an empty mock account.
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            state: Mutex::new(MockState::default()),
        }
    }

    /// Sets the id given to the next created user.
    pub fn set_next_user_id(&self, id: u64) {
        self.state.lock().next_user_id = id;
    }

    /// Sets the id given to the next created ticket.
    pub fn set_next_ticket_id(&self, id: u64) {
        self.state.lock().next_ticket_id = id;
    }

    /// Sets the id given to the next created comment.
    pub fn set_next_comment_id(&self, id: u64) {
        self.state.lock().next_comment_id = id;
    }

    /// Seeds a user; returns its id.
    pub fn insert_user(&self, user: RemoteUser) -> u64 {
        let mut state = self.state.lock();
        let id = user.id.unwrap_or(state.next_user_id);
        state.next_user_id = state.next_user_id.max(id + 1);
        state.users.insert(id, RemoteUser { id: Some(id), ..user });
        id
    }

    /// Seeds a ticket; returns its id.
    pub fn insert_ticket(&self, ticket: RemoteTicket) -> u64 {
        let mut state = self.state.lock();
        let id = ticket.id.unwrap_or(state.next_ticket_id);
        state.next_ticket_id = state.next_ticket_id.max(id + 1);
        state.tickets.insert(
            id,
            RemoteTicket {
                id: Some(id),
                comment: None,
                ..ticket
            },
        );
        id
    }

    /// Seeds a comment on a ticket; returns its id.
    pub fn insert_comment(&self, ticket_id: u64, comment: RemoteComment) -> u64 {
        let mut state = self.state.lock();
        let stored = state.store_comment(ticket_id, &comment);
        stored.id.unwrap_or_default()
    }

    /// Returns a stored user.
    pub fn user(&self, id: u64) -> Option<RemoteUser> {
        self.state.lock().users.get(&id).cloned()
    }

    /// Returns a stored ticket.
    pub fn ticket(&self, id: u64) -> Option<RemoteTicket> {
        self.state.lock().tickets.get(&id).cloned()
    }

    /// Returns the stored comments of a ticket.
    pub fn comments(&self, ticket_id: u64) -> Vec<RemoteComment> {
        self.state
            .lock()
            .comments
            .get(&ticket_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns every call made so far.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().calls.clone()
    }

    /// Returns how many calls of a kind were made.
    pub fn call_count(&self, call: ApiCall) -> usize {
        self.state.lock().calls.iter().filter(|c| **c == call).count()
    }

    /// Forgets recorded calls.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Makes the next call of `call` kind fail with `error`.
    pub fn fail_next(&self, call: ApiCall, error: ApiError) {
        self.state.lock().failures.push((call, error));
    }

    /// Sets the connected state.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    fn enter(&self, call: ApiCall) -> ApiResult<parking_lot::MutexGuard<'_, MockState>> {
        if !self.is_connected() {
            return Err(ApiError::NotConnected);
        }
        let mut state = self.state.lock();
        state.enter(call)?;
        Ok(state)
    }
}

impl ZendeskTransport for MockTransport {
    fn list_users(&self) -> ApiResult<Vec<RemoteUser>> {
        let state = self.enter(ApiCall::ListUsers)?;
        Ok(state.users.values().cloned().collect())
    }

    fn get_user(&self, id: u64) -> ApiResult<RemoteUser> {
        let state = self.enter(ApiCall::GetUser)?;
        state
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("user {id}")))
    }

    fn create_user(&self, user: &RemoteUser) -> ApiResult<RemoteUser> {
        let mut state = self.enter(ApiCall::CreateUser)?;
        let id = state.next_user_id;
        state.next_user_id += 1;
        let now = Utc::now();
        let stored = RemoteUser {
            id: Some(id),
            url: Some(format!("https://mock.zendesk.com/api/v2/users/{id}.json")),
            active: Some(true),
            created_at: Some(now),
            updated_at: Some(now),
            ..user.clone()
        };
        state.users.insert(id, stored.clone());
        Ok(stored)
    }

    fn update_user(&self, user: &RemoteUser) -> ApiResult<RemoteUser> {
        let mut state = self.enter(ApiCall::UpdateUser)?;
        let id = user
            .id
            .ok_or_else(|| ApiError::Validation("user id is required".into()))?;
        let existing = state
            .users
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound(format!("user {id}")))?;
        existing.name = user.name.clone();
        existing.email = user.email.clone();
        existing.phone = user.phone.clone();
        existing.role = user.role.clone();
        existing.updated_at = Some(Utc::now());
        Ok(existing.clone())
    }

    fn list_tickets(&self) -> ApiResult<Vec<RemoteTicket>> {
        let state = self.enter(ApiCall::ListTickets)?;
        Ok(state.tickets.values().cloned().collect())
    }

    fn get_ticket(&self, id: u64) -> ApiResult<RemoteTicket> {
        let state = self.enter(ApiCall::GetTicket)?;
        state
            .tickets
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("ticket {id}")))
    }

    fn create_ticket(&self, ticket: &RemoteTicket) -> ApiResult<CreatedTicket> {
        let mut state = self.enter(ApiCall::CreateTicket)?;
        let id = state.next_ticket_id;
        state.next_ticket_id += 1;
        let now = Utc::now();
        let description = ticket
            .comment
            .as_ref()
            .map(|c| c.body.clone())
            .unwrap_or_default();
        let stored = RemoteTicket {
            id: Some(id),
            url: Some(format!("https://mock.zendesk.com/api/v2/tickets/{id}.json")),
            description,
            status: ticket.status.clone().or_else(|| Some("new".into())),
            submitter_id: ticket.submitter_id.or(ticket.requester_id),
            created_at: Some(now),
            updated_at: Some(now),
            comment: None,
            ..ticket.clone()
        };
        state.tickets.insert(id, stored.clone());

        let comment = ticket.comment.as_ref().map(|comment| {
            let comment = RemoteComment {
                author_id: comment.author_id.or(stored.submitter_id),
                ..comment.clone()
            };
            state.store_comment(id, &comment)
        });

        Ok(CreatedTicket {
            ticket: stored,
            comment,
        })
    }

    fn update_ticket(&self, ticket: &RemoteTicket) -> ApiResult<RemoteTicket> {
        let mut state = self.enter(ApiCall::UpdateTicket)?;
        let id = ticket
            .id
            .ok_or_else(|| ApiError::Validation("ticket id is required".into()))?;
        let existing = state
            .tickets
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound(format!("ticket {id}")))?;
        existing.subject = ticket.subject.clone();
        existing.external_id = ticket.external_id.clone();
        existing.status = ticket.status.clone();
        existing.priority = ticket.priority.clone();
        existing.ticket_type = ticket.ticket_type.clone();
        existing.requester_id = ticket.requester_id.or(existing.requester_id);
        existing.assignee_id = ticket.assignee_id;
        existing.submitter_id = ticket.submitter_id.or(existing.submitter_id);
        existing.updated_at = Some(Utc::now());
        let updated = existing.clone();

        if let Some(comment) = &ticket.comment {
            state.store_comment(id, comment);
        }
        Ok(updated)
    }

    fn list_ticket_comments(&self, ticket_id: u64) -> ApiResult<Vec<RemoteComment>> {
        let state = self.enter(ApiCall::ListComments)?;
        if !state.tickets.contains_key(&ticket_id) {
            return Err(ApiError::NotFound(format!("ticket {ticket_id}")));
        }
        Ok(state.comments.get(&ticket_id).cloned().unwrap_or_default())
    }

    fn add_ticket_comment(
        &self,
        ticket_id: u64,
        comment: &RemoteComment,
    ) -> ApiResult<RemoteComment> {
        let mut state = self.enter(ApiCall::AddComment)?;
        if !state.tickets.contains_key(&ticket_id) {
            return Err(ApiError::NotFound(format!("ticket {ticket_id}")));
        }
        let comment = RemoteComment {
            id: None,
            ..comment.clone()
        };
        Ok(state.store_comment(ticket_id, &comment))
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_transport_connection() {
        let transport = MockTransport::new();
        assert!(transport.is_connected());

        transport.set_connected(false);
        assert!(matches!(
            transport.list_tickets(),
            Err(ApiError::NotConnected)
        ));

        transport.set_connected(true);
        transport.close();
        assert!(!transport.is_connected());
    }

    #[test]
    fn mock_create_ticket_returns_initial_comment() {
        let transport = MockTransport::new();
        transport.set_next_ticket_id(100);

        let ticket = RemoteTicket {
            subject: "Printer".into(),
            requester_id: Some(42),
            comment: Some(RemoteComment {
                body: "It is on fire".into(),
                ..RemoteComment::default()
            }),
            ..RemoteTicket::default()
        };
        let created = transport.create_ticket(&ticket).unwrap();

        assert_eq!(created.ticket.id, Some(100));
        assert_eq!(created.ticket.description, "It is on fire");
        let comment = created.comment.unwrap();
        assert_eq!(comment.ticket_id, Some(100));
        assert_eq!(comment.author_id, Some(42));
        assert_eq!(transport.comments(100).len(), 1);
    }

    #[test]
    fn mock_records_calls() {
        let transport = MockTransport::new();
        let id = transport.insert_ticket(RemoteTicket::default());
        transport.get_ticket(id).unwrap();
        transport.list_ticket_comments(id).unwrap();

        assert_eq!(
            transport.calls(),
            vec![ApiCall::GetTicket, ApiCall::ListComments]
        );
        assert_eq!(transport.call_count(ApiCall::CreateTicket), 0);
    }

    #[test]
    fn mock_injected_failure_is_consumed() {
        let transport = MockTransport::new();
        transport.fail_next(ApiCall::CreateUser, ApiError::Validation("email taken".into()));

        let user = RemoteUser {
            name: "Jane".into(),
            ..RemoteUser::default()
        };
        assert!(matches!(
            transport.create_user(&user),
            Err(ApiError::Validation(_))
        ));
        assert!(transport.create_user(&user).is_ok());
        assert_eq!(transport.call_count(ApiCall::CreateUser), 2);
    }

    #[test]
    fn mock_update_unknown_ticket() {
        let transport = MockTransport::new();
        let ticket = RemoteTicket {
            id: Some(9),
            ..RemoteTicket::default()
        };
        assert!(matches!(
            transport.update_ticket(&ticket),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn mock_add_comment_assigns_new_id() {
        let transport = MockTransport::new();
        let ticket = transport.insert_ticket(RemoteTicket::default());
        transport.set_next_comment_id(500);

        let comment = RemoteComment {
            body: "Reply".into(),
            author_id: Some(7),
            ..RemoteComment::default()
        };
        let stored = transport.add_ticket_comment(ticket, &comment).unwrap();
        assert_eq!(stored.id, Some(500));
        assert_eq!(stored.ticket_id, Some(ticket));
    }
}

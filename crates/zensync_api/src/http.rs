//! HTTP transport implementation.
//!
//! This module maps the [`ZendeskTransport`] operations onto the Zendesk
//! REST endpoints. The actual HTTP client is abstracted via a trait so tests
//! and alternative HTTP stacks can plug in.

use crate::error::{ApiError, ApiResult};
use crate::transport::ZendeskTransport;
use crate::wire::{
    CommentPage, CreatedTicket, RemoteComment, RemoteTicket, RemoteUser, TicketEnvelope,
    TicketPage, TicketWrite, UserEnvelope, UserPage,
};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use zensync_model::ZendeskCredentials;

/// HTTP method used by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET.
    Get,
    /// POST.
    Post,
    /// PUT.
    Put,
}

/// An HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Method.
    pub method: Method,
    /// Absolute url.
    pub url: String,
    /// Basic auth user name.
    pub username: String,
    /// Basic auth password.
    pub password: String,
    /// JSON body.
    pub body: Option<serde_json::Value>,
}

/// An HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Body text.
    pub body: String,
    /// `Retry-After` header, in seconds.
    pub retry_after: Option<u64>,
}

/// HTTP client abstraction.
///
/// Implementations only move bytes; status interpretation happens in
/// [`HttpTransport`].
pub trait HttpClient: Send + Sync {
    /// Sends a request and returns the response, whatever its status.
    ///
    /// Fails only when no response was received.
    fn send(&self, request: &HttpRequest) -> ApiResult<HttpResponse>;

    /// Checks if the client is healthy.
    fn is_healthy(&self) -> bool {
        true
    }
}

/// HTTP-based Zendesk transport.
///
/// Authenticates with an API token (`{email}/token:{api_token}`) and follows
/// `next_page` links when listing.
pub struct HttpTransport<C: HttpClient> {
    base_url: String,
    username: String,
    api_token: String,
    page_size: u32,
    client: C,
    connected: AtomicBool,
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> HttpTransport<C> {
    /// Creates a transport for an account.
    pub fn new(base_url: impl Into<String>, credentials: &ZendeskCredentials, client: C) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username: format!("{}/token", credentials.email),
            api_token: credentials.api_token.clone(),
            page_size: 100,
            client,
            connected: AtomicBool::new(true),
            last_error: RwLock::new(None),
        }
    }

    /// Sets the page size used when listing.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, 100);
        self
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the last error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v2/{}", self.base_url, path)
    }

    fn list_url(&self, path: &str) -> String {
        format!("{}?per_page={}", self.url(path), self.page_size)
    }

    fn call<Res: DeserializeOwned>(
        &self,
        method: Method,
        url: String,
        body: Option<serde_json::Value>,
    ) -> ApiResult<Res> {
        if !self.is_connected() {
            return Err(ApiError::NotConnected);
        }

        let request = HttpRequest {
            method,
            url,
            username: self.username.clone(),
            password: self.api_token.clone(),
            body,
        };
        tracing::debug!(method = ?request.method, url = %request.url, "zendesk request");

        let result = self.client.send(&request).and_then(|response| {
            if (200..300).contains(&response.status) {
                serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
            } else {
                Err(ApiError::from_status(
                    response.status,
                    response.body,
                    response.retry_after,
                ))
            }
        });

        match &result {
            Ok(_) => *self.last_error.write() = None,
            Err(e) => *self.last_error.write() = Some(e.to_string()),
        }
        result
    }

    fn get<Res: DeserializeOwned>(&self, url: String) -> ApiResult<Res> {
        self.call(Method::Get, url, None)
    }

    fn send_json<Req: Serialize, Res: DeserializeOwned>(
        &self,
        method: Method,
        url: String,
        body: &Req,
    ) -> ApiResult<Res> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.call(method, url, Some(body))
    }

    /// Newest comment of a ticket, read after a write that did not report it.
    ///
    /// The write already happened, so a failed read is logged and yields
    /// `None` rather than an error.
    fn newest_comment(&self, ticket_id: u64) -> Option<RemoteComment> {
        match self.list_ticket_comments(ticket_id) {
            Ok(mut comments) => comments.pop(),
            Err(e) => {
                tracing::warn!(ticket = ticket_id, error = %e, "comment written but not read back");
                None
            }
        }
    }

    fn paginate<P, T>(&self, first: String, split: impl Fn(P) -> (Vec<T>, Option<String>)) -> ApiResult<Vec<T>>
    where
        P: DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut next = Some(first);
        while let Some(url) = next.take() {
            let (page, next_page) = split(self.get(url.clone())?);
            items.extend(page);
            next = next_page.filter(|n| *n != url);
        }
        Ok(items)
    }
}

impl<C: HttpClient> ZendeskTransport for HttpTransport<C> {
    fn list_users(&self) -> ApiResult<Vec<RemoteUser>> {
        self.paginate(self.list_url("users.json"), |page: UserPage| {
            (page.users, page.next_page)
        })
    }

    fn get_user(&self, id: u64) -> ApiResult<RemoteUser> {
        let envelope: UserEnvelope = self.get(self.url(&format!("users/{id}.json")))?;
        Ok(envelope.user)
    }

    fn create_user(&self, user: &RemoteUser) -> ApiResult<RemoteUser> {
        let body = UserEnvelope { user: user.clone() };
        let envelope: UserEnvelope = self.send_json(Method::Post, self.url("users.json"), &body)?;
        Ok(envelope.user)
    }

    fn update_user(&self, user: &RemoteUser) -> ApiResult<RemoteUser> {
        let id = user
            .id
            .ok_or_else(|| ApiError::Validation("user id is required".into()))?;
        let body = UserEnvelope { user: user.clone() };
        let envelope: UserEnvelope =
            self.send_json(Method::Put, self.url(&format!("users/{id}.json")), &body)?;
        Ok(envelope.user)
    }

    fn list_tickets(&self) -> ApiResult<Vec<RemoteTicket>> {
        self.paginate(self.list_url("tickets.json"), |page: TicketPage| {
            (page.tickets, page.next_page)
        })
    }

    fn get_ticket(&self, id: u64) -> ApiResult<RemoteTicket> {
        let envelope: TicketEnvelope = self.get(self.url(&format!("tickets/{id}.json")))?;
        Ok(envelope.ticket)
    }

    fn create_ticket(&self, ticket: &RemoteTicket) -> ApiResult<CreatedTicket> {
        let body = TicketEnvelope {
            ticket: ticket.clone(),
        };
        let response: TicketWrite =
            self.send_json(Method::Post, self.url("tickets.json"), &body)?;

        let comment = match (ticket.comment.is_some(), response.ticket.id) {
            (true, Some(id)) => response
                .comment()
                .or_else(|| self.newest_comment(id)),
            _ => None,
        };
        Ok(CreatedTicket {
            ticket: response.ticket,
            comment,
        })
    }

    fn update_ticket(&self, ticket: &RemoteTicket) -> ApiResult<RemoteTicket> {
        let id = ticket
            .id
            .ok_or_else(|| ApiError::Validation("ticket id is required".into()))?;
        let body = TicketEnvelope {
            ticket: ticket.clone(),
        };
        let envelope: TicketEnvelope =
            self.send_json(Method::Put, self.url(&format!("tickets/{id}.json")), &body)?;
        Ok(envelope.ticket)
    }

    fn list_ticket_comments(&self, ticket_id: u64) -> ApiResult<Vec<RemoteComment>> {
        let mut comments = self.paginate(
            self.list_url(&format!("tickets/{ticket_id}/comments.json")),
            |page: CommentPage| (page.comments, page.next_page),
        )?;
        for comment in &mut comments {
            comment.ticket_id = Some(ticket_id);
        }
        Ok(comments)
    }

    fn add_ticket_comment(
        &self,
        ticket_id: u64,
        comment: &RemoteComment,
    ) -> ApiResult<RemoteComment> {
        let body = serde_json::json!({ "ticket": { "comment": comment } });
        let response: TicketWrite =
            self.send_json(Method::Put, self.url(&format!("tickets/{ticket_id}.json")), &body)?;

        if let Some(stored) = response.comment() {
            return Ok(stored);
        }
        Ok(self
            .newest_comment(ticket_id)
            .unwrap_or_else(|| RemoteComment {
                id: None,
                ticket_id: Some(ticket_id),
                ..comment.clone()
            }))
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && self.client.is_healthy()
    }

    fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Replays canned responses and records requests.
    #[derive(Default)]
    struct ScriptedClient {
        responses: Mutex<Vec<HttpResponse>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedClient {
        fn respond(&self, status: u16, body: &str) {
            self.responses.lock().push(HttpResponse {
                status,
                body: body.to_string(),
                retry_after: None,
            });
        }
    }

    impl HttpClient for &ScriptedClient {
        fn send(&self, request: &HttpRequest) -> ApiResult<HttpResponse> {
            self.requests.lock().push(request.clone());
            let mut responses = self.responses.lock();
            if responses.is_empty() {
                return Err(ApiError::Connection("no scripted response".into()));
            }
            Ok(responses.remove(0))
        }
    }

    fn credentials() -> ZendeskCredentials {
        ZendeskCredentials {
            sub_domain: "acme".into(),
            email: "api@acme.com".into(),
            api_token: "tok".into(),
            default_user_email: "support@acme.com".into(),
        }
    }

    #[test]
    fn follows_next_page() {
        let client = ScriptedClient::default();
        client.respond(
            200,
            r#"{"tickets": [{"id": 1}], "next_page": "https://acme.zendesk.com/api/v2/tickets.json?page=2"}"#,
        );
        client.respond(200, r#"{"tickets": [{"id": 2}], "next_page": null}"#);

        let transport = HttpTransport::new("https://acme.zendesk.com/", &credentials(), &client);
        let tickets = transport.list_tickets().unwrap();

        assert_eq!(tickets.iter().map(|t| t.id).collect::<Vec<_>>(), [Some(1), Some(2)]);
        let requests = client.requests.lock();
        assert_eq!(
            requests[0].url,
            "https://acme.zendesk.com/api/v2/tickets.json?per_page=100"
        );
        assert_eq!(requests[0].username, "api@acme.com/token");
        assert_eq!(requests[0].password, "tok");
    }

    #[test]
    fn comments_get_ticket_id() {
        let client = ScriptedClient::default();
        client.respond(200, r#"{"comments": [{"id": 5, "body": "hi"}]}"#);

        let transport = HttpTransport::new("https://acme.zendesk.com", &credentials(), &client);
        let comments = transport.list_ticket_comments(77).unwrap();
        assert_eq!(comments[0].ticket_id, Some(77));
    }

    #[test]
    fn error_status_is_mapped() {
        let client = ScriptedClient::default();
        client.respond(401, "Couldn't authenticate you");

        let transport = HttpTransport::new("https://acme.zendesk.com", &credentials(), &client);
        let result = transport.get_ticket(1);
        assert!(matches!(result, Err(ApiError::Authentication(_))));
        assert!(transport.last_error().is_some());
    }

    #[test]
    fn create_ticket_fetches_initial_comment() {
        let client = ScriptedClient::default();
        client.respond(201, r#"{"ticket": {"id": 100, "subject": "s"}}"#);
        client.respond(200, r#"{"comments": [{"id": 900, "body": "d", "author_id": 42}]}"#);

        let transport = HttpTransport::new("https://acme.zendesk.com", &credentials(), &client);
        let ticket = RemoteTicket {
            subject: "s".into(),
            comment: Some(RemoteComment {
                body: "d".into(),
                ..RemoteComment::default()
            }),
            ..RemoteTicket::default()
        };
        let created = transport.create_ticket(&ticket).unwrap();

        assert_eq!(created.ticket.id, Some(100));
        assert_eq!(created.comment.unwrap().id, Some(900));
        let requests = client.requests.lock();
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[0].body.as_ref().unwrap()["ticket"]["comment"]["body"], "d");
    }

    #[test]
    fn create_ticket_reads_comment_from_audit() {
        let client = ScriptedClient::default();
        client.respond(
            201,
            r#"{"ticket": {"id": 100}, "audit": {"events": [
                {"type": "Create", "id": 1},
                {"type": "Comment", "id": 901, "body": "d", "public": true, "author_id": 42}
            ]}}"#,
        );

        let transport = HttpTransport::new("https://acme.zendesk.com", &credentials(), &client);
        let ticket = RemoteTicket {
            comment: Some(RemoteComment {
                body: "d".into(),
                ..RemoteComment::default()
            }),
            ..RemoteTicket::default()
        };
        let created = transport.create_ticket(&ticket).unwrap();

        let comment = created.comment.unwrap();
        assert_eq!(comment.id, Some(901));
        assert_eq!(comment.author_id, Some(42));
        assert_eq!(comment.ticket_id, Some(100));
        assert_eq!(client.requests.lock().len(), 1);
    }

    #[test]
    fn create_ticket_survives_failed_comment_read() {
        let client = ScriptedClient::default();
        client.respond(201, r#"{"ticket": {"id": 7}}"#);
        client.respond(503, "Service Unavailable");

        let transport = HttpTransport::new("https://acme.zendesk.com", &credentials(), &client);
        let ticket = RemoteTicket {
            comment: Some(RemoteComment {
                body: "d".into(),
                ..RemoteComment::default()
            }),
            ..RemoteTicket::default()
        };
        let created = transport.create_ticket(&ticket).unwrap();

        assert_eq!(created.ticket.id, Some(7));
        assert!(created.comment.is_none());
        let requests = client.requests.lock();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].method, Method::Get);
    }

    #[test]
    fn add_comment_survives_failed_read() {
        let client = ScriptedClient::default();
        client.respond(200, r#"{"ticket": {"id": 3}}"#);
        client.respond(503, "Service Unavailable");

        let transport = HttpTransport::new("https://acme.zendesk.com", &credentials(), &client);
        let comment = RemoteComment {
            body: "new".into(),
            ..RemoteComment::default()
        };
        let stored = transport.add_ticket_comment(3, &comment).unwrap();
        assert_eq!(stored.id, None);
        assert_eq!(stored.ticket_id, Some(3));
        assert_eq!(stored.body, "new");
    }

    #[test]
    fn add_comment_returns_newest() {
        let client = ScriptedClient::default();
        client.respond(200, r#"{"ticket": {"id": 3}}"#);
        client.respond(
            200,
            r#"{"comments": [{"id": 1, "body": "old"}, {"id": 2, "body": "new"}]}"#,
        );

        let transport = HttpTransport::new("https://acme.zendesk.com", &credentials(), &client);
        let comment = RemoteComment {
            body: "new".into(),
            ..RemoteComment::default()
        };
        let stored = transport.add_ticket_comment(3, &comment).unwrap();
        assert_eq!(stored.id, Some(2));
        assert_eq!(client.requests.lock()[0].method, Method::Put);
    }

    #[test]
    fn closed_transport_refuses_calls() {
        let client = ScriptedClient::default();
        let transport = HttpTransport::new("https://acme.zendesk.com", &credentials(), &client);
        transport.close();
        assert!(matches!(transport.list_users(), Err(ApiError::NotConnected)));
        assert!(client.requests.lock().is_empty());
    }
}

//! CRM-side records: cases, case comments, users and contacts.
//!
//! These live in the host CRM. The sync only reads them and writes the
//! fields that mirror Zendesk data.

use crate::ids::{CaseCommentId, CaseId, ContactId, CrmUserId};
use crate::lookup::{CasePriority, CaseStatus};
use crate::record::{normalize_email, IndexKey, Record, Table};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A CRM support case, linked one-to-one with a ticket.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Case {
    /// Case id.
    pub id: Option<CaseId>,
    /// Subject.
    pub subject: String,
    /// Description.
    pub description: String,
    /// Status.
    pub status: Option<CaseStatus>,
    /// Priority.
    pub priority: Option<CasePriority>,
    /// Owning CRM user.
    pub owner: Option<CrmUserId>,
    /// Assigned CRM user.
    pub assigned_to: Option<CrmUserId>,
    /// Contact the case is about.
    pub related_contact: Option<ContactId>,
    /// Last change in the CRM.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Case {
    /// Creates an unsaved case.
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Self::default()
        }
    }
}

impl Record for Case {
    type Id = CaseId;
    const TABLE: Table = Table::Case;

    fn id(&self) -> Option<CaseId> {
        self.id
    }

    fn assign_id(&mut self, id: CaseId) {
        self.id = Some(id);
    }
}

/// A comment on a CRM case.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CaseComment {
    /// Comment id.
    pub id: Option<CaseCommentId>,
    /// Owning case.
    pub case: Option<CaseId>,
    /// Message text.
    pub message: String,
    /// Visible to the customer.
    pub public: bool,
    /// Authoring CRM user.
    pub owner: Option<CrmUserId>,
    /// Authoring contact.
    pub contact: Option<ContactId>,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
}

impl CaseComment {
    /// Creates an unsaved public comment on a case.
    pub fn new(case: CaseId, message: impl Into<String>) -> Self {
        Self {
            case: Some(case),
            message: message.into(),
            public: true,
            ..Self::default()
        }
    }
}

impl Record for CaseComment {
    type Id = CaseCommentId;
    const TABLE: Table = Table::CaseComment;

    fn id(&self) -> Option<CaseCommentId> {
        self.id
    }

    fn assign_id(&mut self, id: CaseCommentId) {
        self.id = Some(id);
    }

    fn index_keys(&self) -> Vec<IndexKey> {
        self.case.map(IndexKey::Case).into_iter().collect()
    }
}

/// A CRM user (staff account).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CrmUser {
    /// User id.
    pub id: Option<CrmUserId>,
    /// Display name.
    pub name: String,
    /// Primary email.
    pub email: String,
    /// Additional emails.
    #[serde(default)]
    pub secondary_emails: Vec<String>,
}

impl CrmUser {
    /// Creates an unsaved user.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            ..Self::default()
        }
    }
}

impl Record for CrmUser {
    type Id = CrmUserId;
    const TABLE: Table = Table::CrmUser;

    fn id(&self) -> Option<CrmUserId> {
        self.id
    }

    fn assign_id(&mut self, id: CrmUserId) {
        self.id = Some(id);
    }

    fn index_keys(&self) -> Vec<IndexKey> {
        let mut keys = vec![IndexKey::email(None, &self.email)];
        keys.extend(
            self.secondary_emails
                .iter()
                .map(|email| IndexKey::secondary_email(email)),
        );
        keys
    }
}

/// Email of a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEmail {
    /// Address.
    pub email: String,
    /// Primary address flag.
    pub primary: bool,
}

/// A CRM contact (customer).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contact {
    /// Contact id.
    pub id: Option<ContactId>,
    /// Name prefix ("Dr.").
    pub name_prefix: Option<String>,
    /// First name.
    pub first_name: String,
    /// Middle name.
    pub middle_name: Option<String>,
    /// Last name.
    pub last_name: String,
    /// Name suffix ("Jr.").
    pub name_suffix: Option<String>,
    /// Emails.
    #[serde(default)]
    pub emails: Vec<ContactEmail>,
    /// Phone numbers.
    #[serde(default)]
    pub phones: Vec<String>,
    /// Owning CRM user.
    pub owner: Option<CrmUserId>,
}

impl Contact {
    /// Adds an email; the first email added becomes primary.
    pub fn add_email(&mut self, email: impl Into<String>) {
        let primary = self.emails.is_empty();
        self.emails.push(ContactEmail {
            email: email.into(),
            primary,
        });
    }

    /// Returns the primary email.
    #[must_use]
    pub fn primary_email(&self) -> Option<&str> {
        self.emails
            .iter()
            .find(|e| e.primary)
            .map(|e| e.email.as_str())
    }

    /// Returns true if the email is the contact's primary address.
    #[must_use]
    pub fn is_primary_email(&self, email: &str) -> bool {
        let email = normalize_email(email);
        self.emails
            .iter()
            .any(|e| e.primary && normalize_email(&e.email) == email)
    }

    /// Full display name.
    #[must_use]
    pub fn full_name(&self) -> String {
        [
            self.name_prefix.as_deref(),
            Some(self.first_name.as_str()),
            self.middle_name.as_deref(),
            Some(self.last_name.as_str()),
            self.name_suffix.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

impl Record for Contact {
    type Id = ContactId;
    const TABLE: Table = Table::Contact;

    fn id(&self) -> Option<ContactId> {
        self.id
    }

    fn assign_id(&mut self, id: ContactId) {
        self.id = Some(id);
    }

    fn index_keys(&self) -> Vec<IndexKey> {
        self.emails
            .iter()
            .map(|e| IndexKey::email(None, &e.email))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_email_is_primary() {
        let mut contact = Contact::default();
        contact.add_email("a@x.com");
        contact.add_email("b@x.com");
        assert_eq!(contact.primary_email(), Some("a@x.com"));
        assert!(contact.is_primary_email("A@X.COM"));
        assert!(!contact.is_primary_email("b@x.com"));
        assert_eq!(contact.index_keys().len(), 2);
    }

    #[test]
    fn full_name_skips_missing_parts() {
        let contact = Contact {
            name_prefix: Some("Dr.".into()),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            ..Contact::default()
        };
        assert_eq!(contact.full_name(), "Dr. Ada Lovelace");
    }

    #[test]
    fn crm_user_keys_include_secondary_emails() {
        let mut user = CrmUser::new("Bob", "Bob@Corp.com");
        user.secondary_emails.push("bobby@home.org".into());
        assert_eq!(
            user.index_keys(),
            vec![
                IndexKey::email(None, "bob@corp.com"),
                IndexKey::SecondaryEmail("bobby@home.org".into())
            ]
        );
    }

    #[test]
    fn case_comment_is_keyed_by_case() {
        let comment = CaseComment::new(CaseId::new(3), "hi");
        assert_eq!(comment.index_keys(), vec![IndexKey::Case(CaseId::new(3))]);
    }
}

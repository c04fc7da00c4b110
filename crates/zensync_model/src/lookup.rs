//! Fixed lookup values (statuses, priorities, roles).
//!
//! Every lookup is identified by a stable machine name. Equality is by
//! machine name only; display labels live in [`crate::LabelCatalog`].

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A closed set of values with stable machine names.
pub trait Lookup: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Lookup kind, used for labels and error messages.
    const KIND: &'static str;

    /// All values, in declaration order.
    const ALL: &'static [Self];

    /// Stable machine name.
    fn name(self) -> &'static str;

    /// Finds a value by machine name.
    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|value| value.name() == name)
    }
}

macro_rules! lookup {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident => $machine:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $machine)]
                $variant,
            )+
        }

        impl Lookup for $name {
            const KIND: &'static str = $kind;
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $machine,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_name(s).ok_or_else(|| ModelError::UnknownLookup {
                    kind: $kind,
                    name: s.to_string(),
                })
            }
        }
    };
}

lookup!(
    /// Zendesk ticket status.
    TicketStatus, "ticket_status" {
        /// Not yet assigned.
        New => "new",
        /// Assigned and being worked on.
        Open => "open",
        /// Waiting on the requester.
        Pending => "pending",
        /// Waiting on a third party.
        Hold => "hold",
        /// Solved, may still be reopened.
        Solved => "solved",
        /// Closed for good.
        Closed => "closed",
    }
);

lookup!(
    /// Zendesk ticket priority.
    TicketPriority, "ticket_priority" {
        /// Low priority.
        Low => "low",
        /// Normal priority.
        Normal => "normal",
        /// High priority.
        High => "high",
        /// Urgent priority.
        Urgent => "urgent",
    }
);

lookup!(
    /// Zendesk ticket type.
    TicketType, "ticket_type" {
        /// Problem ticket.
        Problem => "problem",
        /// Incident linked to a problem.
        Incident => "incident",
        /// Question.
        Question => "question",
        /// Task with a due date.
        Task => "task",
    }
);

lookup!(
    /// Zendesk user role.
    UserRole, "user_role" {
        /// Customer.
        EndUser => "end-user",
        /// Support agent.
        Agent => "agent",
        /// Account administrator.
        Admin => "admin",
    }
);

lookup!(
    /// CRM case status.
    CaseStatus, "case_status" {
        /// Open.
        Open => "open",
        /// Being worked on.
        InProgress => "in_progress",
        /// Resolved.
        Resolved => "resolved",
        /// Closed.
        Closed => "closed",
    }
);

lookup!(
    /// CRM case priority.
    CasePriority, "case_priority" {
        /// Low priority.
        Low => "low",
        /// Normal priority.
        Normal => "normal",
        /// High priority.
        High => "high",
    }
);

impl UserRole {
    /// Agents and admins map to CRM users; end users map to contacts.
    #[must_use]
    pub fn is_agent(self) -> bool {
        matches!(self, UserRole::Agent | UserRole::Admin)
    }
}

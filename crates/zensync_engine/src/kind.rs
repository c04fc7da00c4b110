//! Kinds of synced entities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Entity type a batch or job works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Zendesk users.
    User,
    /// Zendesk tickets.
    Ticket,
    /// Zendesk ticket comments.
    TicketComment,
}

impl EntityKind {
    /// Every kind, in import order.
    pub const ALL: [EntityKind; 3] = [EntityKind::User, EntityKind::Ticket, EntityKind::TicketComment];

    /// Machine name used in job payloads and lock files.
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Ticket => "ticket",
            EntityKind::TicketComment => "ticket_comment",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown entity kind '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_roundtrip() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.as_str().parse::<EntityKind>(), Ok(kind));
        }
        assert!("case".parse::<EntityKind>().is_err());
    }
}

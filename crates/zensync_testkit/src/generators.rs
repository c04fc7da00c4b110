//! Property-based test generators using proptest.
//!
//! Generated tickets and cases belong to the test channel and carry only
//! fields the change calculators compare.

use crate::fixtures::CHANNEL_ID;
use proptest::prelude::*;
use proptest::sample::select;
use zensync_model::{
    Case, CasePriority, CaseStatus, LocalId, Lookup, OriginId, SyncRef, Ticket, TicketPriority,
    TicketStatus, TicketType,
};

/// Strategy for any value of a lookup.
pub fn lookup_strategy<L: Lookup>() -> impl Strategy<Value = L> {
    select(L::ALL)
}

/// Strategy for an optional lookup value.
pub fn optional_lookup_strategy<L: Lookup>() -> impl Strategy<Value = Option<L>> {
    prop::option::of(lookup_strategy::<L>())
}

/// Strategy for short subjects and descriptions.
pub fn text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9 ,.!?]{0,40}").expect("Invalid regex")
}

/// Strategy for user references: absent, local only, remote only, or both.
pub fn user_ref_strategy() -> impl Strategy<Value = Option<SyncRef>> {
    prop_oneof![
        Just(None),
        (1u64..20).prop_map(|id| Some(SyncRef::local(LocalId::new(id)))),
        (1u64..20).prop_map(|id| Some(SyncRef::remote(OriginId::new(id)))),
        (1u64..20, 1u64..20).prop_map(|(id, origin)| Some(SyncRef::new(
            Some(LocalId::new(id)),
            Some(OriginId::new(origin))
        ))),
    ]
}

/// Strategy for tickets of the test channel.
pub fn ticket_strategy() -> impl Strategy<Value = Ticket> {
    (
        (text_strategy(), text_strategy()),
        (
            optional_lookup_strategy::<TicketStatus>(),
            optional_lookup_strategy::<TicketPriority>(),
            optional_lookup_strategy::<TicketType>(),
        ),
        (user_ref_strategy(), user_ref_strategy(), user_ref_strategy()),
        prop::option::of(1u64..1000),
    )
        .prop_map(
            |((subject, description), (status, priority, ticket_type), (requester, assignee, submitter), origin)| {
                Ticket {
                    channel: Some(CHANNEL_ID),
                    origin_id: origin.map(OriginId::new),
                    subject,
                    description,
                    status,
                    priority,
                    ticket_type,
                    requester,
                    assignee,
                    submitter,
                    ..Ticket::default()
                }
            },
        )
}

/// Strategy for cases.
pub fn case_strategy() -> impl Strategy<Value = Case> {
    (
        text_strategy(),
        text_strategy(),
        optional_lookup_strategy::<CaseStatus>(),
        optional_lookup_strategy::<CasePriority>(),
    )
        .prop_map(|(subject, description, status, priority)| Case {
            subject,
            description,
            status,
            priority,
            ..Case::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_tickets_belong_to_test_channel(ticket in ticket_strategy()) {
            prop_assert_eq!(ticket.channel, Some(CHANNEL_ID));
            prop_assert!(ticket.id.is_none());
        }

        #[test]
        fn generated_statuses_have_names(status in lookup_strategy::<TicketStatus>()) {
            prop_assert_eq!(TicketStatus::from_name(status.name()), Some(status));
        }
    }
}

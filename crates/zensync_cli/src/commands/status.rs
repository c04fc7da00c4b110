//! Per-channel sync counts.

use super::open_runner;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use zensync_model::{Channel, LabelCatalog, Ticket, TicketComment, User};
use zensync_store::EntityStore;

/// Sync counts of one channel.
#[derive(Debug, Default, Serialize)]
pub struct ChannelStatus {
    /// Channel id.
    pub channel: u64,
    /// Channel name.
    pub name: String,
    /// Whether batches run for the channel.
    pub enabled: bool,
    /// Local users.
    pub users: usize,
    /// Users without a Zendesk id.
    pub unsynced_users: usize,
    /// Local tickets.
    pub tickets: usize,
    /// Tickets without a Zendesk id or with local edits.
    pub pending_tickets: usize,
    /// Local comments.
    pub comments: usize,
    /// Comments not yet pushed.
    pub pending_comments: usize,
    /// Ticket count per status label.
    pub statuses: BTreeMap<String, usize>,
}

/// Counts the records of a channel.
pub fn collect<S: EntityStore>(
    store: &S,
    channel: &Channel,
    labels: &LabelCatalog,
    locale: &str,
) -> Result<ChannelStatus, Box<dyn std::error::Error>> {
    let mut status = ChannelStatus {
        channel: channel.id.as_u64(),
        name: channel.name.clone(),
        enabled: channel.enabled,
        ..ChannelStatus::default()
    };

    for user in store.all::<User>()? {
        if user.channel == Some(channel.id) {
            status.users += 1;
            status.unsynced_users += usize::from(!user.is_synced());
        }
    }
    for ticket in store.all::<Ticket>()? {
        if ticket.channel != Some(channel.id) {
            continue;
        }
        status.tickets += 1;
        status.pending_tickets += usize::from(ticket.pending_export || !ticket.is_synced());
        let label = match ticket.status {
            Some(value) => labels.label(value, locale),
            None => "Unset".to_string(),
        };
        *status.statuses.entry(label).or_default() += 1;
    }
    for comment in store.all::<TicketComment>()? {
        if comment.channel == Some(channel.id) {
            status.comments += 1;
            status.pending_comments += usize::from(comment.is_pending_export());
        }
    }

    Ok(status)
}

/// Runs the status command.
pub fn run(
    path: &Path,
    channel_id: Option<u64>,
    locale: &str,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let runner = open_runner(path)?;
    let store = runner.store();
    let labels = LabelCatalog::new(runner.config().locale.clone());

    let mut result = Vec::new();
    for channel in store.all::<Channel>()? {
        if channel_id.is_some_and(|id| id != channel.id.as_u64()) {
            continue;
        }
        result.push(collect(store, &channel, &labels, locale)?);
    }

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => print_text_output(&result),
    }

    Ok(())
}

fn print_text_output(result: &[ChannelStatus]) {
    if result.is_empty() {
        println!("No channels registered");
    }
    for status in result {
        println!(
            "{} [{}]{}",
            status.name,
            status.channel,
            if status.enabled { "" } else { " (disabled)" }
        );
        println!("  Users:    {} ({} unsynced)", status.users, status.unsynced_users);
        println!("  Tickets:  {} ({} pending)", status.tickets, status.pending_tickets);
        println!("  Comments: {} ({} pending)", status.comments, status.pending_comments);
        for (label, count) in &status.statuses {
            println!("    {:<16} {}", label, count);
        }
    }
}

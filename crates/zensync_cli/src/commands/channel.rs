//! Channel registration.

use super::CliError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use zensync_model::Channel;
use zensync_store::{EntityStore, FileStore};

/// Channel file contents: one channel or a list.
#[derive(Deserialize)]
#[serde(untagged)]
enum ChannelFile {
    One(Box<Channel>),
    Many(Vec<Channel>),
}

/// Channel fields safe to print.
#[derive(Debug, Serialize)]
pub struct ChannelSummary {
    /// Channel id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Account subdomain.
    pub sub_domain: String,
    /// Whether batches run for the channel.
    pub enabled: bool,
    /// Whether case edits are pushed back.
    pub two_way_sync: bool,
}

impl From<&Channel> for ChannelSummary {
    fn from(channel: &Channel) -> Self {
        Self {
            id: channel.id.as_u64(),
            name: channel.name.clone(),
            sub_domain: channel.transport.sub_domain.clone(),
            enabled: channel.enabled,
            two_way_sync: channel.settings.two_way_sync,
        }
    }
}

/// Parses a channel file.
pub fn parse_channels(
    text: &str,
    source: &str,
) -> Result<Vec<Channel>, Box<dyn std::error::Error>> {
    let channels = match serde_json::from_str(text)? {
        ChannelFile::One(channel) => vec![*channel],
        ChannelFile::Many(channels) => channels,
    };
    if channels.is_empty() {
        return Err(CliError::EmptyChannelFile(source.to_string()).into());
    }
    Ok(channels)
}

/// Saves channels into a store, replacing channels with the same id.
pub fn register<S: EntityStore>(
    store: &S,
    channels: &mut [Channel],
) -> Result<(), Box<dyn std::error::Error>> {
    for channel in channels.iter_mut() {
        store.save(channel)?;
        tracing::info!(channel = %channel.id, name = %channel.name, "channel registered");
    }
    store.flush()?;
    Ok(())
}

/// Runs `channel add`.
pub fn add(path: &Path, file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(file)?;
    let mut channels = parse_channels(&text, &file.display().to_string())?;
    let store = FileStore::open(path)?;
    register(&store, &mut channels)?;
    println!("Registered {} channel(s)", channels.len());
    Ok(())
}

/// Runs `channel list`.
pub fn list(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileStore::open(path)?;
    let summaries: Vec<ChannelSummary> = store
        .all::<Channel>()?
        .iter()
        .map(ChannelSummary::from)
        .collect();

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        _ => {
            if summaries.is_empty() {
                println!("No channels registered");
            }
            for summary in &summaries {
                println!(
                    "{:>4}  {:<24} {}.zendesk.com{}{}",
                    summary.id,
                    summary.name,
                    summary.sub_domain,
                    if summary.enabled { "" } else { "  (disabled)" },
                    if summary.two_way_sync { "  two-way" } else { "" },
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use zensync_model::{ChannelId, SyncPriority};
    use zensync_testkit::TestStore;

    const ONE: &str = r#"{
        "id": 3,
        "name": "Acme",
        "transport": {
            "sub_domain": "acme",
            "email": "api@acme.com",
            "api_token": "s3cret",
            "default_user_email": "support@acme.com"
        },
        "settings": { "sync_priority": "local", "two_way_sync": true }
    }"#;

    #[test]
    fn parses_single_channel() {
        let channels = parse_channels(ONE, "one.json").unwrap();
        assert_eq!(channels.len(), 1);
        let channel = &channels[0];
        assert_eq!(channel.id, ChannelId::new(3));
        assert!(channel.enabled);
        assert!(channel.is_two_way());
        assert_eq!(channel.settings.sync_priority, SyncPriority::Local);
    }

    #[test]
    fn parses_channel_list() {
        let text = format!("[{ONE}, {}]", ONE.replace("\"id\": 3", "\"id\": 4"));
        let channels = parse_channels(&text, "many.json").unwrap();
        let ids: Vec<u64> = channels.iter().map(|c| c.id.as_u64()).collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[test]
    fn empty_list_is_rejected() {
        let err = parse_channels("[]", "empty.json").unwrap_err();
        assert_eq!(err.to_string(), "no channel in empty.json");
    }

    #[test]
    fn registered_channels_are_replaced_by_id() {
        let store = TestStore::new();
        let mut channels = parse_channels(ONE, "one.json").unwrap();
        register(&*store, &mut channels).unwrap();

        channels[0].name = "Acme EU".into();
        register(&*store, &mut channels).unwrap();

        let stored = store.all::<Channel>().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "Acme EU");
    }

    #[test]
    fn summary_omits_token() {
        let channels = parse_channels(ONE, "one.json").unwrap();
        let json = serde_json::to_string(&ChannelSummary::from(&channels[0])).unwrap();
        assert!(!json.contains("s3cret"));
        assert!(json.contains("acme"));
    }
}

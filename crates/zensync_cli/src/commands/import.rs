//! Import batches.

use super::{http_transport, load_channel, open_runner, print_reports};
use std::path::Path;
use zensync_engine::EntityKind;

/// Runs the import command.
///
/// Without a kind, imports users, tickets and comments in that order.
pub fn run(
    path: &Path,
    channel_id: u64,
    kind: Option<EntityKind>,
) -> Result<(), Box<dyn std::error::Error>> {
    let runner = open_runner(path)?;
    let channel = load_channel(runner.store(), channel_id)?;
    let transport = http_transport(&channel)?;

    let reports = match kind {
        Some(kind) => vec![(kind, runner.run_import(&channel, &transport, kind)?)],
        None => runner.import_all(&channel, &transport)?,
    };
    print_reports(&channel, &reports);

    Ok(())
}

//! Export batches and their follow-up jobs.

use super::{http_transport, load_channel, open_queue, open_runner, print_reports};
use std::path::Path;
use zensync_engine::EntityKind;
use zensync_model::LocalId;

/// Runs the export command.
///
/// Jobs scheduled by the export (comment pushes after a ticket create) go to
/// the store's job queue. They run in the same process unless `run_jobs` is
/// false, in which case `jobs run` picks them up later.
pub fn run(
    path: &Path,
    channel_id: u64,
    kind: EntityKind,
    ids: &[u64],
    run_jobs: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let runner = open_runner(path)?;
    let channel = load_channel(runner.store(), channel_id)?;
    let transport = http_transport(&channel)?;
    let queue = open_queue(path)?;

    let ids: Vec<LocalId> = ids.iter().copied().map(LocalId::new).collect();
    let selection = if ids.is_empty() { None } else { Some(ids.as_slice()) };

    let mut reports = vec![(
        kind,
        runner.run_export(&channel, &transport, &queue, kind, selection)?,
    )];
    if run_jobs {
        reports.extend(runner.run_jobs(&channel, &transport, &queue)?);
    } else if !queue.is_empty() {
        tracing::info!(jobs = queue.len(), "follow-up jobs left queued");
    }
    print_reports(&channel, &reports);

    Ok(())
}

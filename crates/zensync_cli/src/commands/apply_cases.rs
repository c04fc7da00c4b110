//! Case edits pushed back to Zendesk.

use super::{http_transport, load_channel, open_queue, open_runner, print_reports};
use std::path::Path;
use zensync_engine::EntityKind;
use zensync_model::CaseId;

/// Runs the apply-cases command.
pub fn run(
    path: &Path,
    channel_id: u64,
    cases: &[u64],
    export: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let runner = open_runner(path)?;
    let channel = load_channel(runner.store(), channel_id)?;
    if !channel.is_two_way() {
        println!("{} [{}] is not a two-way channel", channel.name, channel.id);
        return Ok(());
    }

    let cases: Vec<CaseId> = cases.iter().copied().map(CaseId::new).collect();
    let tickets = runner.apply_case_edits(&channel, &cases)?;
    println!("{} ticket(s) marked for export", tickets.len());
    if !export || tickets.is_empty() {
        return Ok(());
    }

    let transport = http_transport(&channel)?;
    let queue = open_queue(path)?;
    let mut reports = vec![(
        EntityKind::Ticket,
        runner.run_export(&channel, &transport, &queue, EntityKind::Ticket, Some(&tickets))?,
    )];
    reports.extend(runner.run_jobs(&channel, &transport, &queue)?);
    print_reports(&channel, &reports);

    Ok(())
}

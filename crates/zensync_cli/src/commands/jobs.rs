//! Persisted follow-up jobs.

use super::{http_transport, load_channel, open_queue, open_runner, print_reports};
use serde::Serialize;
use std::path::Path;
use zensync_engine::ScheduledJob;

/// One queued job, as listed.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct JobSummary {
    /// Position in the queue, oldest first.
    pub position: usize,
    /// Channel id.
    pub channel: u64,
    /// Entity kind to export.
    pub kind: String,
    /// Local ids of the records.
    pub ids: Vec<u64>,
}

/// Describes the queued jobs, optionally for one channel.
pub fn summarize(jobs: &[ScheduledJob], channel_id: Option<u64>) -> Vec<JobSummary> {
    jobs.iter()
        .enumerate()
        .filter(|(_, job)| channel_id.is_none_or(|id| id == job.channel.as_u64()))
        .map(|(position, job)| JobSummary {
            position,
            channel: job.channel.as_u64(),
            kind: job.kind.to_string(),
            ids: job.payload.ids.iter().map(|id| id.as_u64()).collect(),
        })
        .collect()
}

/// Runs the jobs list command.
pub fn list(
    path: &Path,
    channel_id: Option<u64>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let _runner = open_runner(path)?;
    let queue = open_queue(path)?;
    let jobs = summarize(&queue.pending(), channel_id);

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&jobs)?),
        _ => {
            if jobs.is_empty() {
                println!("No jobs queued");
            }
            for job in &jobs {
                println!(
                    "#{} channel {} {} ({} record(s))",
                    job.position,
                    job.channel,
                    job.kind,
                    job.ids.len()
                );
            }
        }
    }

    Ok(())
}

/// Runs the queued jobs of one channel.
pub fn run(path: &Path, channel_id: u64) -> Result<(), Box<dyn std::error::Error>> {
    let runner = open_runner(path)?;
    let channel = load_channel(runner.store(), channel_id)?;
    let queue = open_queue(path)?;
    if queue.next_for(channel.id).is_none() {
        println!("{} [{}] has no queued jobs", channel.name, channel.id);
        return Ok(());
    }

    let transport = http_transport(&channel)?;
    let reports = runner.run_jobs(&channel, &transport, &queue)?;
    print_reports(&channel, &reports);

    Ok(())
}

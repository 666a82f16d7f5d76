//! Incremental sync from the remote workout events feed.

use chrono::{DateTime, Utc};
use clap::Args;

use super::CommandError;
use hevymirror::config::Config;
use hevymirror::db::RelationalMirror;
use hevymirror::sync::{DeltaSynchronizer, HevyClient, TracingProgress};

/// Apply remote workout changes since the last sync
#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Request events after this RFC 3339 timestamp instead of the mirror's cursor
    #[arg(long, value_parser = parse_since)]
    since: Option<DateTime<Utc>>,
}

impl SyncCommand {
    pub async fn run(
        &self,
        mirror: &mut RelationalMirror,
        config: &Config,
    ) -> Result<(), CommandError> {
        let client = HevyClient::from_config(&config.api)?;
        let progress = TracingProgress;

        println!("Syncing with {}...", client.base_url());
        println!();

        let mut synchronizer = DeltaSynchronizer::new(&client, mirror, &progress);
        let report = match self.since {
            Some(since) => synchronizer.sync_since(since).await?,
            None => synchronizer.sync_from_mirror().await?,
        };

        println!("  ✓ {} added", report.added);
        println!("  ✓ {} updated", report.updated);
        println!("  ✓ {} deleted", report.deleted);
        if report.skipped > 0 {
            println!("  ! {} skipped (unrecognized event type)", report.skipped);
        }
        println!();
        if report.total() == 0 {
            println!("Already up to date.");
        } else {
            println!("Sync complete.");
        }

        Ok(())
    }
}

fn parse_since(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("Invalid timestamp '{}': {}", raw, e))
}

//! Incremental reconciliation from the remote workout events feed.
//!
//! Events are applied in feed order. `updated` for an unknown workout inserts
//! it, and `deleted` for an absent workout is a no-op, so replayed or
//! duplicated events leave the mirror unchanged.

use chrono::{DateTime, Utc};

use super::client::PageSource;
use super::pagination::{PageRequest, PageWalker, WalkError};
use super::progress::{ProgressSink, UnitKind};
use crate::db::{MirrorError, RelationalMirror};
use crate::models::{ChangeEvent, Workout};

/// Errors that abort a delta sync.
#[derive(Debug)]
pub enum SyncError {
    /// The events feed could not be retrieved.
    Walk(WalkError),
    /// An event could not be applied.
    Mirror(MirrorError),
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::Walk(e) => write!(f, "{}", e),
            SyncError::Mirror(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Walk(e) => Some(e),
            SyncError::Mirror(e) => Some(e),
        }
    }
}

impl From<WalkError> for SyncError {
    fn from(e: WalkError) -> Self {
        SyncError::Walk(e)
    }
}

impl From<MirrorError> for SyncError {
    fn from(e: MirrorError) -> Self {
        SyncError::Mirror(e)
    }
}

/// Per-kind tally of applied events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Events with an unrecognized type
    pub skipped: usize,
}

impl SyncReport {
    pub fn total(&self) -> usize {
        self.added + self.updated + self.deleted + self.skipped
    }
}

impl std::fmt::Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} added, {} updated, {} deleted, {} skipped",
            self.added, self.updated, self.deleted, self.skipped
        )
    }
}

pub struct DeltaSynchronizer<'a, S, P> {
    source: &'a S,
    mirror: &'a mut RelationalMirror,
    progress: &'a P,
}

impl<'a, S: PageSource, P: ProgressSink> DeltaSynchronizer<'a, S, P> {
    pub fn new(source: &'a S, mirror: &'a mut RelationalMirror, progress: &'a P) -> Self {
        Self {
            source,
            mirror,
            progress,
        }
    }

    /// Syncs from the mirror's own cursor: the latest local `added_on`, or
    /// the Unix epoch for an empty mirror.
    pub async fn sync_from_mirror(&mut self) -> Result<SyncReport, SyncError> {
        let cursor = self
            .mirror
            .latest_added_on()
            .await?
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        self.sync_since(cursor).await
    }

    /// Fetches every event after `cursor` and applies them in feed order.
    pub async fn sync_since(&mut self, cursor: DateTime<Utc>) -> Result<SyncReport, SyncError> {
        tracing::info!("Fetching workout events since {}", cursor.to_rfc3339());
        let events: Vec<ChangeEvent> = PageWalker::new(self.source, self.progress)
            .walk(&PageRequest::events_since(cursor))
            .await?;

        let mut report = SyncReport::default();
        let total = events.len();
        for (i, event) in events.iter().enumerate() {
            self.apply(event, &mut report).await?;
            self.progress.report(UnitKind::Event, i + 1, total);
        }

        tracing::info!("Sync complete: {}", report);
        Ok(report)
    }

    async fn apply(&mut self, event: &ChangeEvent, report: &mut SyncReport) -> Result<(), SyncError> {
        tracing::debug!("Applying {} event", event.kind());
        match event {
            ChangeEvent::Added { workout } | ChangeEvent::Updated { workout } => {
                self.upsert(workout, report).await
            }
            ChangeEvent::Deleted { id } => {
                match self.mirror.delete_workout(id).await {
                    Ok(()) => {}
                    Err(MirrorError::NotFound { .. }) => {
                        tracing::debug!("Workout {} already absent, delete is a no-op", id);
                    }
                    Err(e) => return Err(e.into()),
                }
                report.deleted += 1;
                Ok(())
            }
            ChangeEvent::Unknown => {
                tracing::warn!("Skipping workout event with unrecognized type");
                report.skipped += 1;
                Ok(())
            }
        }
    }

    async fn upsert(&mut self, workout: &Workout, report: &mut SyncReport) -> Result<(), SyncError> {
        if self.mirror.workout_exists(&workout.id).await? {
            self.mirror
                .update_workout(&workout.id, &workout.fields())
                .await?;
            report.updated += 1;
        } else {
            self.mirror.insert_workout_tree(workout).await?;
            tracing::debug!(
                "Added workout {} with {} set(s)",
                workout.id,
                workout.set_count()
            );
            report.added += 1;
        }
        Ok(())
    }
}

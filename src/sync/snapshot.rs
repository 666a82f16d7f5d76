//! Full bootstrap: walk every workout and exercise template, then ingest them.

use super::client::PageSource;
use super::pagination::{PageRequest, PageWalker, WalkError};
use super::progress::{ProgressSink, UnitKind};
use crate::db::{MirrorCounts, MirrorError, RelationalMirror};
use crate::models::{ExerciseTemplate, Workout};

/// A complete point-in-time copy of the remote collections, in remote order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub workouts: Vec<Workout>,
    pub templates: Vec<ExerciseTemplate>,
}

pub struct SnapshotBuilder<'a, S, P> {
    walker: PageWalker<'a, S, P>,
}

impl<'a, S: PageSource, P: ProgressSink> SnapshotBuilder<'a, S, P> {
    pub fn new(source: &'a S, progress: &'a P) -> Self {
        Self {
            walker: PageWalker::new(source, progress),
        }
    }

    /// Walks the workouts resource, then the exercise templates resource.
    /// Either walk failing fails the whole snapshot.
    pub async fn build_full_snapshot(&self) -> Result<Snapshot, WalkError> {
        let workouts = self.walker.walk(&PageRequest::workouts()).await?;
        let templates = self.walker.walk(&PageRequest::exercise_templates()).await?;
        Ok(Snapshot {
            workouts,
            templates,
        })
    }
}

/// Writes a snapshot into the mirror: templates with their muscle groups
/// first, then each workout followed by its exercises and their sets.
///
/// Any error aborts the run and leaves already written rows in place;
/// re-running requires [`RelationalMirror::reset`].
pub async fn populate<P: ProgressSink>(
    mirror: &mut RelationalMirror,
    snapshot: &Snapshot,
    progress: &P,
) -> Result<(), MirrorError> {
    let total = snapshot.templates.len();
    for (i, template) in snapshot.templates.iter().enumerate() {
        mirror.insert_template_tree(template).await?;
        progress.report(UnitKind::ExerciseTemplate, i + 1, total);
    }

    let total = snapshot.workouts.len();
    for (i, workout) in snapshot.workouts.iter().enumerate() {
        mirror.insert_workout_tree(workout).await?;
        progress.report(UnitKind::Workout, i + 1, total);
    }

    tracing::info!(
        "Populated mirror with {} workout(s) and {} exercise template(s)",
        snapshot.workouts.len(),
        snapshot.templates.len()
    );
    Ok(())
}

/// Errors that abort a bootstrap run.
#[derive(Debug)]
pub enum BootstrapError {
    /// The mirror already holds rows and no reset was requested.
    MirrorNotEmpty,
    Walk(WalkError),
    Mirror(MirrorError),
}

impl std::fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BootstrapError::MirrorNotEmpty => write!(
                f,
                "Mirror already contains data. Re-run with --reset to rebuild it from scratch."
            ),
            BootstrapError::Walk(e) => write!(f, "{}", e),
            BootstrapError::Mirror(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for BootstrapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BootstrapError::MirrorNotEmpty => None,
            BootstrapError::Walk(e) => Some(e),
            BootstrapError::Mirror(e) => Some(e),
        }
    }
}

impl From<WalkError> for BootstrapError {
    fn from(e: WalkError) -> Self {
        BootstrapError::Walk(e)
    }
}

impl From<MirrorError> for BootstrapError {
    fn from(e: MirrorError) -> Self {
        BootstrapError::Mirror(e)
    }
}

/// Builds a full snapshot and populates the mirror from it.
///
/// A populated mirror is refused unless `reset` is set. The reset runs only
/// after the snapshot has been fetched, so a failed walk keeps the old rows.
pub async fn bootstrap<S: PageSource, P: ProgressSink>(
    source: &S,
    mirror: &mut RelationalMirror,
    reset: bool,
    progress: &P,
) -> Result<MirrorCounts, BootstrapError> {
    let populated = !mirror.is_empty().await?;
    if populated && !reset {
        return Err(BootstrapError::MirrorNotEmpty);
    }

    let snapshot = SnapshotBuilder::new(source, progress)
        .build_full_snapshot()
        .await?;

    if populated {
        mirror.reset().await?;
    }
    populate(mirror, &snapshot, progress).await?;

    Ok(mirror.counts().await?)
}

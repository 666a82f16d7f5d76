//! Progress reporting for page walks and mirror ingestion.
//!
//! Sinks are purely observational: nothing they do can fail a run.

use std::fmt;

/// What a progress tick counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// A page of the named remote resource was retrieved.
    Page(&'static str),
    /// A workout (with its exercises and sets) was written to the mirror.
    Workout,
    /// An exercise template (with its muscle groups) was written to the mirror.
    ExerciseTemplate,
    /// A change event was applied.
    Event,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKind::Page(resource) => write!(f, "{} page", resource),
            UnitKind::Workout => write!(f, "workout"),
            UnitKind::ExerciseTemplate => write!(f, "exercise template"),
            UnitKind::Event => write!(f, "event"),
        }
    }
}

/// Observer invoked after each unit of work with a 1-based position.
pub trait ProgressSink {
    fn report(&self, unit: UnitKind, current: usize, total: usize);
}

/// Logs progress through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn report(&self, unit: UnitKind, current: usize, total: usize) {
        tracing::info!("{} {}/{}", unit, current, total);
    }
}

/// Discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _unit: UnitKind, _current: usize, _total: usize) {}
}

impl<P: ProgressSink + ?Sized> ProgressSink for &P {
    fn report(&self, unit: UnitKind, current: usize, total: usize) {
        (**self).report(unit, current, total)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every tick for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingProgress {
        pub ticks: Mutex<Vec<(UnitKind, usize, usize)>>,
    }

    impl RecordingProgress {
        pub fn ticks_for(&self, unit: UnitKind) -> Vec<(usize, usize)> {
            self.ticks
                .lock()
                .unwrap()
                .iter()
                .filter(|(u, _, _)| *u == unit)
                .map(|(_, c, t)| (*c, *t))
                .collect()
        }
    }

    impl ProgressSink for RecordingProgress {
        fn report(&self, unit: UnitKind, current: usize, total: usize) {
            self.ticks.lock().unwrap().push((unit, current, total));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_kind_display() {
        assert_eq!(UnitKind::Page("workouts").to_string(), "workouts page");
        assert_eq!(UnitKind::ExerciseTemplate.to_string(), "exercise template");
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::set_type::SetType;

/// A workout as delivered by the remote API, including its exercises.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workout {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

/// One exercise performed within a workout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub index: i64,
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub exercise_template_id: Option<String>,
    #[serde(default)]
    pub sets: Vec<WorkoutSet>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSet {
    pub index: i64,
    #[serde(rename = "type")]
    pub set_type: SetType,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub reps: Option<i64>,
    #[serde(default)]
    pub distance_meters: Option<f64>,
    #[serde(default)]
    pub duration_seconds: Option<i64>,
    #[serde(default)]
    pub rpe: Option<f64>,
}

/// The workout columns overwritten by an update. Exercises are not part of it.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutFields {
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Workout {
    pub fn fields(&self) -> WorkoutFields {
        WorkoutFields {
            title: self.title.clone(),
            description: self.description.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            updated_at: self.updated_at,
            created_at: self.created_at,
        }
    }

    /// Total number of sets across every exercise.
    pub fn set_count(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }
}

impl WorkoutSet {
    pub fn new(index: i64, set_type: SetType) -> Self {
        Self {
            index,
            set_type,
            weight_kg: None,
            reps: None,
            distance_meters: None,
            duration_seconds: None,
            rpe: None,
        }
    }

    pub fn with_weight_reps(mut self, weight_kg: f64, reps: i64) -> Self {
        self.weight_kg = Some(weight_kg);
        self.reps = Some(reps);
        self
    }
}

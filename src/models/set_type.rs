use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a set is measured. Determines which numeric fields of a
/// [`WorkoutSet`](super::WorkoutSet) are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetType {
    WeightReps,
    RepsOnly,
    Duration,
    BodyweightWeighted,
    BodyweightAssisted,
}

impl SetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetType::WeightReps => "weight_reps",
            SetType::RepsOnly => "reps_only",
            SetType::Duration => "duration",
            SetType::BodyweightWeighted => "bodyweight_weighted",
            SetType::BodyweightAssisted => "bodyweight_assisted",
        }
    }
}

impl fmt::Display for SetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weight_reps" => Ok(SetType::WeightReps),
            "reps_only" => Ok(SetType::RepsOnly),
            "duration" => Ok(SetType::Duration),
            "bodyweight_weighted" => Ok(SetType::BodyweightWeighted),
            "bodyweight_assisted" => Ok(SetType::BodyweightAssisted),
            _ => Err(format!(
                "Invalid set type '{}'. Valid options: weight_reps, reps_only, duration, \
                 bodyweight_weighted, bodyweight_assisted",
                s
            )),
        }
    }
}

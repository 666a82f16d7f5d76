use serde::{Deserialize, Serialize};

/// An exercise definition from the remote template catalogue.
///
/// Muscle groups arrive as names; the mirror resolves them to surrogate ids.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExerciseTemplate {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub exercise_type: String,
    pub primary_muscle_group: String,
    #[serde(default)]
    pub secondary_muscle_groups: Vec<String>,
    pub is_custom: bool,
}

impl ExerciseTemplate {
    /// Secondary group names with duplicates removed, first occurrence kept.
    pub fn distinct_secondary_groups(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::with_capacity(self.secondary_muscle_groups.len());
        for name in &self.secondary_muscle_groups {
            if !seen.contains(&name.as_str()) {
                seen.push(name.as_str());
            }
        }
        seen
    }
}

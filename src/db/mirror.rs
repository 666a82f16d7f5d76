//! The local relational copy of the remote dataset.
//!
//! Row hierarchy: workout → exercise → set, and exercise template →
//! muscle groups. Exercise and set ids come from monotonic counters held in
//! memory and persisted to `id_sequences` alongside each insert, so an id is
//! never handed out twice even after its row is deleted.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;
use std::str::FromStr;

use crate::models::{Exercise, ExerciseTemplate, SetType, Workout, WorkoutFields, WorkoutSet};

const EXERCISE_SEQUENCE: &str = "exercise";
const SET_SEQUENCE: &str = "set";

/// Errors raised by mirror operations.
#[derive(Debug)]
pub enum MirrorError {
    /// Primary key already present.
    DuplicateKey { entity: &'static str, id: String },
    /// Child inserted before its parent.
    UnknownParent {
        entity: &'static str,
        parent_id: String,
    },
    /// Update or delete target absent.
    NotFound { entity: &'static str, id: String },
    /// SQLite error.
    Database(sqlx::Error),
}

impl std::fmt::Display for MirrorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MirrorError::DuplicateKey { entity, id } => {
                write!(f, "Duplicate {}: '{}' is already mirrored", entity, id)
            }
            MirrorError::UnknownParent { entity, parent_id } => {
                write!(f, "Cannot insert {}: parent '{}' not found", entity, parent_id)
            }
            MirrorError::NotFound { entity, id } => write!(f, "{} not found: {}", entity, id),
            MirrorError::Database(e) => write!(f, "SQLite error: {}", e),
        }
    }
}

impl std::error::Error for MirrorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MirrorError::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for MirrorError {
    fn from(e: sqlx::Error) -> Self {
        MirrorError::Database(e)
    }
}

/// A mirrored workout with its local bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredWorkout {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Set once at first local insertion
    pub added_on: DateTime<Utc>,
    /// Re-stamped on every local write
    pub touched_on: DateTime<Utc>,
    pub exercises: Vec<StoredExercise>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredExercise {
    pub exercise_id: i64,
    pub index: i64,
    pub title: String,
    pub notes: Option<String>,
    pub exercise_template_id: Option<String>,
    pub sets: Vec<StoredSet>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredSet {
    pub set_id: i64,
    pub set: WorkoutSet,
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorCounts {
    pub workouts: i64,
    pub exercises: i64,
    pub sets: i64,
    pub exercise_templates: i64,
    pub muscle_groups: i64,
    pub secondary_muscle_groups: i64,
}

// Row types for database queries
#[derive(sqlx::FromRow)]
struct WorkoutRow {
    id: String,
    title: String,
    description: Option<String>,
    start_time: String,
    end_time: String,
    updated_at: String,
    created_at: String,
    added_on: String,
    touched_on: String,
}

#[derive(sqlx::FromRow)]
struct ExerciseRow {
    exercise_id: i64,
    idx: i64,
    title: String,
    notes: Option<String>,
    exercise_template_id: Option<String>,
}

#[derive(sqlx::FromRow)]
struct SetRow {
    set_id: i64,
    idx: i64,
    set_type: String,
    weight_kg: Option<f64>,
    reps: Option<i64>,
    distance_meters: Option<f64>,
    duration_seconds: Option<i64>,
    rpe: Option<f64>,
}

pub struct RelationalMirror {
    pool: SqlitePool,
    next_exercise_id: i64,
    next_set_id: i64,
    next_muscle_group_id: i64,
    muscle_groups: HashMap<String, i64>,
}

impl RelationalMirror {
    /// Opens the mirror over an initialized pool, reloading id counters and
    /// the muscle-group lookup from what is already stored.
    pub async fn open(pool: SqlitePool) -> Result<Self, MirrorError> {
        let sequences: Vec<(String, i64)> =
            sqlx::query_as("SELECT name, last_value FROM id_sequences")
                .fetch_all(&pool)
                .await?;
        let sequences: HashMap<String, i64> = sequences.into_iter().collect();

        let max_exercise: i64 =
            sqlx::query_scalar("SELECT COALESCE(MAX(exercise_id), 0) FROM exercises")
                .fetch_one(&pool)
                .await?;
        let max_set: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(set_id), 0) FROM sets")
            .fetch_one(&pool)
            .await?;

        let groups: Vec<(i64, String)> = sqlx::query_as("SELECT id, name FROM muscle_groups")
            .fetch_all(&pool)
            .await?;
        let next_muscle_group_id = groups.iter().map(|(id, _)| *id).max().unwrap_or(0) + 1;
        let muscle_groups = groups.into_iter().map(|(id, name)| (name, id)).collect();

        let last_exercise = sequences
            .get(EXERCISE_SEQUENCE)
            .copied()
            .unwrap_or(0)
            .max(max_exercise);
        let last_set = sequences.get(SET_SEQUENCE).copied().unwrap_or(0).max(max_set);

        Ok(Self {
            pool,
            next_exercise_id: last_exercise + 1,
            next_set_id: last_set + 1,
            next_muscle_group_id,
            muscle_groups,
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn insert_workout(&mut self, workout: &Workout) -> Result<(), MirrorError> {
        let mut tx = self.pool.begin().await?;

        if row_exists(&mut tx, "SELECT 1 FROM workouts WHERE id = ?", &workout.id).await? {
            return Err(MirrorError::DuplicateKey {
                entity: "workout",
                id: workout.id.clone(),
            });
        }

        let now = timestamp(Utc::now());
        sqlx::query(
            r#"
            INSERT INTO workouts (id, title, description, start_time, end_time, updated_at, created_at, added_on, touched_on)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&workout.id)
        .bind(&workout.title)
        .bind(&workout.description)
        .bind(timestamp(workout.start_time))
        .bind(timestamp(workout.end_time))
        .bind(timestamp(workout.updated_at))
        .bind(timestamp(workout.created_at))
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Inserts an exercise under `workout_id` and returns its new exercise id.
    pub async fn insert_exercise(
        &mut self,
        workout_id: &str,
        exercise: &Exercise,
    ) -> Result<i64, MirrorError> {
        let mut tx = self.pool.begin().await?;

        if !row_exists(&mut tx, "SELECT 1 FROM workouts WHERE id = ?", workout_id).await? {
            return Err(MirrorError::UnknownParent {
                entity: "exercise",
                parent_id: workout_id.to_string(),
            });
        }

        let exercise_id = self.next_exercise_id;
        sqlx::query(
            r#"
            INSERT INTO exercises (exercise_id, workout_id, idx, title, notes, exercise_template_id)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(exercise_id)
        .bind(workout_id)
        .bind(exercise.index)
        .bind(&exercise.title)
        .bind(&exercise.notes)
        .bind(&exercise.exercise_template_id)
        .execute(&mut *tx)
        .await?;
        record_sequence(&mut tx, EXERCISE_SEQUENCE, exercise_id).await?;

        tx.commit().await?;
        self.next_exercise_id += 1;
        Ok(exercise_id)
    }

    /// Inserts a set under `exercise_id` and returns its new set id.
    pub async fn insert_set(
        &mut self,
        exercise_id: i64,
        set: &WorkoutSet,
    ) -> Result<i64, MirrorError> {
        let mut tx = self.pool.begin().await?;

        let parent: Option<i64> =
            sqlx::query_scalar("SELECT exercise_id FROM exercises WHERE exercise_id = ?")
                .bind(exercise_id)
                .fetch_optional(&mut *tx)
                .await?;
        if parent.is_none() {
            return Err(MirrorError::UnknownParent {
                entity: "set",
                parent_id: exercise_id.to_string(),
            });
        }

        let set_id = self.next_set_id;
        sqlx::query(
            r#"
            INSERT INTO sets (set_id, exercise_id, idx, set_type, weight_kg, reps, distance_meters, duration_seconds, rpe)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(set_id)
        .bind(exercise_id)
        .bind(set.index)
        .bind(set.set_type.as_str())
        .bind(set.weight_kg)
        .bind(set.reps)
        .bind(set.distance_meters)
        .bind(set.duration_seconds)
        .bind(set.rpe)
        .execute(&mut *tx)
        .await?;
        record_sequence(&mut tx, SET_SEQUENCE, set_id).await?;

        tx.commit().await?;
        self.next_set_id += 1;
        Ok(set_id)
    }

    /// Inserts a workout, then each of its exercises, then each exercise's
    /// sets. Not atomic as a whole: a failure leaves earlier rows in place.
    pub async fn insert_workout_tree(&mut self, workout: &Workout) -> Result<(), MirrorError> {
        self.insert_workout(workout).await?;
        for exercise in &workout.exercises {
            let exercise_id = self.insert_exercise(&workout.id, exercise).await?;
            for set in &exercise.sets {
                self.insert_set(exercise_id, set).await?;
            }
        }
        Ok(())
    }

    /// Returns the id for `name`, assigning the next surrogate id on first sighting.
    pub async fn upsert_muscle_group(&mut self, name: &str) -> Result<i64, MirrorError> {
        if let Some(id) = self.muscle_groups.get(name) {
            return Ok(*id);
        }

        let id = self.next_muscle_group_id;
        sqlx::query("INSERT INTO muscle_groups (id, name) VALUES (?, ?)")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await?;

        self.muscle_groups.insert(name.to_string(), id);
        self.next_muscle_group_id += 1;
        Ok(id)
    }

    pub fn muscle_group_id(&self, name: &str) -> Option<i64> {
        self.muscle_groups.get(name).copied()
    }

    /// Inserts a template row referencing an already upserted primary group.
    pub async fn insert_exercise_template(
        &mut self,
        template: &ExerciseTemplate,
        primary_muscle_group_id: i64,
    ) -> Result<(), MirrorError> {
        let mut tx = self.pool.begin().await?;

        if row_exists(
            &mut tx,
            "SELECT 1 FROM exercise_templates WHERE id = ?",
            &template.id,
        )
        .await?
        {
            return Err(MirrorError::DuplicateKey {
                entity: "exercise template",
                id: template.id.clone(),
            });
        }
        if !muscle_group_exists(&mut tx, primary_muscle_group_id).await? {
            return Err(MirrorError::UnknownParent {
                entity: "exercise template",
                parent_id: primary_muscle_group_id.to_string(),
            });
        }

        sqlx::query(
            r#"
            INSERT INTO exercise_templates (id, title, exercise_type, primary_muscle_group_id, is_custom)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&template.id)
        .bind(&template.title)
        .bind(&template.exercise_type)
        .bind(primary_muscle_group_id)
        .bind(template.is_custom)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn insert_secondary_muscle_group(
        &mut self,
        template_id: &str,
        muscle_group_id: i64,
    ) -> Result<(), MirrorError> {
        let mut tx = self.pool.begin().await?;

        if !row_exists(
            &mut tx,
            "SELECT 1 FROM exercise_templates WHERE id = ?",
            template_id,
        )
        .await?
        {
            return Err(MirrorError::UnknownParent {
                entity: "secondary muscle group",
                parent_id: template_id.to_string(),
            });
        }
        if !muscle_group_exists(&mut tx, muscle_group_id).await? {
            return Err(MirrorError::UnknownParent {
                entity: "secondary muscle group",
                parent_id: muscle_group_id.to_string(),
            });
        }

        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT muscle_group_id FROM secondary_muscle_groups WHERE template_id = ? AND muscle_group_id = ?",
        )
        .bind(template_id)
        .bind(muscle_group_id)
        .fetch_optional(&mut *tx)
        .await?;
        if existing.is_some() {
            return Err(MirrorError::DuplicateKey {
                entity: "secondary muscle group",
                id: format!("{}/{}", template_id, muscle_group_id),
            });
        }

        sqlx::query(
            "INSERT INTO secondary_muscle_groups (template_id, muscle_group_id) VALUES (?, ?)",
        )
        .bind(template_id)
        .bind(muscle_group_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Upserts the template's primary group, inserts the template, then
    /// upserts and links each distinct secondary group.
    ///
    /// A duplicate template id is rejected before any muscle group is written.
    pub async fn insert_template_tree(
        &mut self,
        template: &ExerciseTemplate,
    ) -> Result<(), MirrorError> {
        if self.template_exists(&template.id).await? {
            return Err(MirrorError::DuplicateKey {
                entity: "exercise template",
                id: template.id.clone(),
            });
        }

        let primary_id = self
            .upsert_muscle_group(&template.primary_muscle_group)
            .await?;
        self.insert_exercise_template(template, primary_id).await?;

        for name in template.distinct_secondary_groups() {
            let group_id = self.upsert_muscle_group(name).await?;
            self.insert_secondary_muscle_group(&template.id, group_id)
                .await?;
        }
        Ok(())
    }

    /// Overwrites the remote fields of a workout. `added_on` is preserved and
    /// `touched_on` re-stamped.
    pub async fn update_workout(&self, id: &str, fields: &WorkoutFields) -> Result<(), MirrorError> {
        let result = sqlx::query(
            r#"
            UPDATE workouts
            SET title = ?, description = ?, start_time = ?, end_time = ?,
                updated_at = ?, created_at = ?, touched_on = ?
            WHERE id = ?
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(timestamp(fields.start_time))
        .bind(timestamp(fields.end_time))
        .bind(timestamp(fields.updated_at))
        .bind(timestamp(fields.created_at))
        .bind(timestamp(Utc::now()))
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(MirrorError::NotFound {
                entity: "workout",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Removes a workout together with its exercises and their sets.
    pub async fn delete_workout(&self, id: &str) -> Result<(), MirrorError> {
        let mut tx = self.pool.begin().await?;

        if !row_exists(&mut tx, "SELECT 1 FROM workouts WHERE id = ?", id).await? {
            return Err(MirrorError::NotFound {
                entity: "workout",
                id: id.to_string(),
            });
        }

        sqlx::query(
            "DELETE FROM sets WHERE exercise_id IN (SELECT exercise_id FROM exercises WHERE workout_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM exercises WHERE workout_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM workouts WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn workout_exists(&self, id: &str) -> Result<bool, MirrorError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM workouts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    pub async fn template_exists(&self, id: &str) -> Result<bool, MirrorError> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM exercise_templates WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    /// MAX(added_on) over all workouts: the cursor for the next delta sync.
    pub async fn latest_added_on(&self) -> Result<Option<DateTime<Utc>>, MirrorError> {
        let latest: Option<String> = sqlx::query_scalar("SELECT MAX(added_on) FROM workouts")
            .fetch_one(&self.pool)
            .await?;
        latest.as_deref().map(parse_timestamp).transpose()
    }

    pub async fn get_workout(&self, id: &str) -> Result<Option<StoredWorkout>, MirrorError> {
        let row: Option<WorkoutRow> = sqlx::query_as("SELECT * FROM workouts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => self.hydrate_workout(row).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn counts(&self) -> Result<MirrorCounts, MirrorError> {
        Ok(MirrorCounts {
            workouts: self.count("SELECT COUNT(*) FROM workouts").await?,
            exercises: self.count("SELECT COUNT(*) FROM exercises").await?,
            sets: self.count("SELECT COUNT(*) FROM sets").await?,
            exercise_templates: self.count("SELECT COUNT(*) FROM exercise_templates").await?,
            muscle_groups: self.count("SELECT COUNT(*) FROM muscle_groups").await?,
            secondary_muscle_groups: self
                .count("SELECT COUNT(*) FROM secondary_muscle_groups")
                .await?,
        })
    }

    /// Number of rows whose parent row is missing. Zero in a consistent mirror.
    pub async fn orphan_count(&self) -> Result<i64, MirrorError> {
        self.count(
            r#"
            SELECT
                (SELECT COUNT(*) FROM exercises e
                    WHERE NOT EXISTS (SELECT 1 FROM workouts w WHERE w.id = e.workout_id))
              + (SELECT COUNT(*) FROM sets s
                    WHERE NOT EXISTS (SELECT 1 FROM exercises e WHERE e.exercise_id = s.exercise_id))
              + (SELECT COUNT(*) FROM exercise_templates t
                    WHERE NOT EXISTS (SELECT 1 FROM muscle_groups m WHERE m.id = t.primary_muscle_group_id))
              + (SELECT COUNT(*) FROM secondary_muscle_groups g
                    WHERE NOT EXISTS (SELECT 1 FROM exercise_templates t WHERE t.id = g.template_id)
                       OR NOT EXISTS (SELECT 1 FROM muscle_groups m WHERE m.id = g.muscle_group_id))
            "#,
        )
        .await
    }

    pub async fn is_empty(&self) -> Result<bool, MirrorError> {
        let counts = self.counts().await?;
        Ok(counts == MirrorCounts::default())
    }

    /// Deletes every mirrored row and resets all id counters to 1.
    pub async fn reset(&mut self) -> Result<(), MirrorError> {
        let mut tx = self.pool.begin().await?;
        for table in [
            "sets",
            "exercises",
            "workouts",
            "secondary_muscle_groups",
            "exercise_templates",
            "muscle_groups",
            "id_sequences",
        ] {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        self.next_exercise_id = 1;
        self.next_set_id = 1;
        self.next_muscle_group_id = 1;
        self.muscle_groups.clear();
        tracing::info!("Mirror reset");
        Ok(())
    }

    async fn count(&self, sql: &str) -> Result<i64, MirrorError> {
        let count: i64 = sqlx::query_scalar(sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn hydrate_workout(&self, row: WorkoutRow) -> Result<StoredWorkout, MirrorError> {
        let exercise_rows: Vec<ExerciseRow> = sqlx::query_as(
            "SELECT exercise_id, idx, title, notes, exercise_template_id FROM exercises WHERE workout_id = ? ORDER BY idx, exercise_id",
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        let mut exercises = Vec::with_capacity(exercise_rows.len());
        for exercise in exercise_rows {
            let set_rows: Vec<SetRow> = sqlx::query_as(
                "SELECT set_id, idx, set_type, weight_kg, reps, distance_meters, duration_seconds, rpe FROM sets WHERE exercise_id = ? ORDER BY idx, set_id",
            )
            .bind(exercise.exercise_id)
            .fetch_all(&self.pool)
            .await?;

            let sets = set_rows
                .into_iter()
                .map(|s| -> Result<StoredSet, MirrorError> {
                    let set_type = SetType::from_str(&s.set_type)
                        .map_err(|e| sqlx::Error::Decode(e.into()))?;
                    Ok(StoredSet {
                        set_id: s.set_id,
                        set: WorkoutSet {
                            index: s.idx,
                            set_type,
                            weight_kg: s.weight_kg,
                            reps: s.reps,
                            distance_meters: s.distance_meters,
                            duration_seconds: s.duration_seconds,
                            rpe: s.rpe,
                        },
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            exercises.push(StoredExercise {
                exercise_id: exercise.exercise_id,
                index: exercise.idx,
                title: exercise.title,
                notes: exercise.notes,
                exercise_template_id: exercise.exercise_template_id,
                sets,
            });
        }

        Ok(StoredWorkout {
            id: row.id,
            title: row.title,
            description: row.description,
            start_time: parse_timestamp(&row.start_time)?,
            end_time: parse_timestamp(&row.end_time)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            created_at: parse_timestamp(&row.created_at)?,
            added_on: parse_timestamp(&row.added_on)?,
            touched_on: parse_timestamp(&row.touched_on)?,
            exercises,
        })
    }
}

/// Fixed-width UTC rendering so that text comparison orders chronologically.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, MirrorError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| MirrorError::Database(sqlx::Error::Decode(Box::new(e))))
}

async fn row_exists(
    tx: &mut Transaction<'_, Sqlite>,
    sql: &str,
    id: &str,
) -> Result<bool, sqlx::Error> {
    let found: Option<i64> = sqlx::query_scalar(sql)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(found.is_some())
}

async fn muscle_group_exists(
    tx: &mut Transaction<'_, Sqlite>,
    id: i64,
) -> Result<bool, sqlx::Error> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM muscle_groups WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(found.is_some())
}

async fn record_sequence(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
    value: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO id_sequences (name, last_value) VALUES (?, ?)
        ON CONFLICT(name) DO UPDATE SET last_value = excluded.last_value
        "#,
    )
    .bind(name)
    .bind(value)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

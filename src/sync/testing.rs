//! In-memory page source and payload builders for tests.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use tempfile::TempDir;

use super::client::{FetchFailure, PageSource};
use super::pagination::PageRequest;
use crate::db::{init_db, RelationalMirror};

/// Serves canned pages keyed by `(path, page)` and records every request.
#[derive(Debug, Default)]
pub struct FakeSource {
    pages: Mutex<HashMap<(String, u32), Result<Value, FetchFailure>>>,
    requests: Mutex<Vec<(String, u32, Option<DateTime<Utc>>)>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_page(&self, path: &str, page: u32, body: Value) {
        self.pages
            .lock()
            .unwrap()
            .insert((path.to_string(), page), Ok(body));
    }

    pub fn fail_page(&self, path: &str, page: u32, failure: FetchFailure) {
        self.pages
            .lock()
            .unwrap()
            .insert((path.to_string(), page), Err(failure));
    }

    /// Splits `items` into consecutive pages of `items_key` under `path`.
    pub fn set_pages(&self, path: &str, items_key: &str, pages: Vec<Vec<Value>>) {
        let count = pages.len() as u32;
        for (i, items) in pages.into_iter().enumerate() {
            self.set_page(path, i as u32 + 1, page_body(items_key, count, Value::Array(items)));
        }
    }

    pub fn requested_pages(&self, path: &str) -> Vec<u32> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _, _)| p == path)
            .map(|(_, page, _)| *page)
            .collect()
    }

    /// The `since` cursor of every request made so far, in order.
    pub fn requested_since(&self) -> Vec<Option<DateTime<Utc>>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, _, since)| *since)
            .collect()
    }
}

impl PageSource for FakeSource {
    async fn fetch_page(&self, request: &PageRequest, page: u32) -> Result<Value, FetchFailure> {
        self.requests
            .lock()
            .unwrap()
            .push((request.path.to_string(), page, request.since));
        self.pages
            .lock()
            .unwrap()
            .get(&(request.path.to_string(), page))
            .cloned()
            .unwrap_or(Err(FetchFailure::Status(404)))
    }
}

pub fn page_body(items_key: &str, page_count: u32, items: Value) -> Value {
    let mut body = json!({ "page": 1, "page_count": page_count });
    body[items_key] = items;
    body
}

/// A remote workout payload with `exercises` exercises of `sets_each` sets.
pub fn workout_json(id: &str, title: &str, exercises: usize, sets_each: usize) -> Value {
    let exercises: Vec<Value> = (0..exercises)
        .map(|e| {
            let sets: Vec<Value> = (0..sets_each)
                .map(|s| json!({"index": s, "type": "weight_reps", "weight_kg": 60.0, "reps": 8}))
                .collect();
            json!({
                "index": e,
                "title": format!("Exercise {}", e),
                "notes": null,
                "exercise_template_id": "D04AC939",
                "sets": sets
            })
        })
        .collect();

    json!({
        "id": id,
        "title": title,
        "description": "",
        "start_time": "2024-08-14T12:00:00Z",
        "end_time": "2024-08-14T13:00:00Z",
        "updated_at": "2024-08-14T13:05:00Z",
        "created_at": "2024-08-14T13:01:00Z",
        "exercises": exercises
    })
}

pub fn template_json(id: &str, primary: &str, secondary: &[&str]) -> Value {
    json!({
        "id": id,
        "title": format!("Template {}", id),
        "type": "weight_reps",
        "primary_muscle_group": primary,
        "secondary_muscle_groups": secondary,
        "is_custom": false
    })
}

/// A fresh mirror over a migrated SQLite file. Keep the `TempDir` alive.
pub async fn temp_mirror() -> (RelationalMirror, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_db(&temp_dir.path().join("mirror.db")).await.unwrap();
    (RelationalMirror::open(pool).await.unwrap(), temp_dir)
}

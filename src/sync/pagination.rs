//! Exhaustive retrieval of a remote paged collection.
//!
//! `page_count` is read from the first page and trusted for the rest of the
//! walk. Any failure aborts the walk without returning what was collected.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::client::{FetchFailure, PageSource};
use super::progress::{ProgressSink, UnitKind};

pub const WORKOUTS_PAGE_SIZE: u32 = 10;
pub const EXERCISE_TEMPLATES_PAGE_SIZE: u32 = 100;
pub const EVENTS_PAGE_SIZE: u32 = 10;

/// Describes one remote collection and how its pages are shaped.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    /// Path below the API base URL
    pub path: &'static str,
    /// Key of the item array in each page body
    pub items_key: &'static str,
    pub page_size: u32,
    /// Only return changes after this instant (events feed)
    pub since: Option<DateTime<Utc>>,
}

impl PageRequest {
    pub fn workouts() -> Self {
        Self {
            path: "workouts",
            items_key: "workouts",
            page_size: WORKOUTS_PAGE_SIZE,
            since: None,
        }
    }

    pub fn exercise_templates() -> Self {
        Self {
            path: "exercise_templates",
            items_key: "exercise_templates",
            page_size: EXERCISE_TEMPLATES_PAGE_SIZE,
            since: None,
        }
    }

    pub fn events_since(since: DateTime<Utc>) -> Self {
        Self {
            path: "workouts/events",
            items_key: "events",
            page_size: EVENTS_PAGE_SIZE,
            since: Some(since),
        }
    }
}

/// Errors that abort a page walk.
#[derive(Debug)]
pub enum WalkError {
    /// A page body lacked a required field or held an invalid item
    MalformedResponse {
        resource: &'static str,
        page: u32,
        detail: String,
    },
    /// A page could not be fetched
    Fetch {
        resource: &'static str,
        page: u32,
        failure: FetchFailure,
    },
}

impl WalkError {
    pub fn page(&self) -> u32 {
        match self {
            WalkError::MalformedResponse { page, .. } | WalkError::Fetch { page, .. } => *page,
        }
    }
}

impl std::fmt::Display for WalkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalkError::MalformedResponse {
                resource,
                page,
                detail,
            } => write!(
                f,
                "Malformed response for {} page {}: {}",
                resource, page, detail
            ),
            WalkError::Fetch {
                resource,
                page,
                failure,
            } => write!(f, "Failed to fetch {} page {}: {}", resource, page, failure),
        }
    }
}

impl std::error::Error for WalkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WalkError::Fetch { failure, .. } => Some(failure),
            WalkError::MalformedResponse { .. } => None,
        }
    }
}

/// Collects every item of a paged resource, fetching pages strictly in order.
pub struct PageWalker<'a, S, P> {
    source: &'a S,
    progress: &'a P,
}

impl<'a, S: PageSource, P: ProgressSink> PageWalker<'a, S, P> {
    pub fn new(source: &'a S, progress: &'a P) -> Self {
        Self { source, progress }
    }

    /// Walks pages `1..=page_count` and returns their items concatenated in
    /// page order.
    pub async fn walk<T: DeserializeOwned>(&self, request: &PageRequest) -> Result<Vec<T>, WalkError> {
        let first = self.fetch(request, 1).await?;
        let page_count = first
            .get("page_count")
            .and_then(Value::as_u64)
            .ok_or_else(|| malformed(request, 1, "missing or non-integer `page_count`"))?;
        let page_count = u32::try_from(page_count)
            .map_err(|_| malformed(request, 1, "`page_count` out of range"))?;
        let total = page_count.max(1) as usize;

        let mut items: Vec<T> = take_items(request, 1, first)?;
        self.progress.report(UnitKind::Page(request.items_key), 1, total);

        for page in 2..=page_count {
            let body = self.fetch(request, page).await?;
            items.extend(take_items::<T>(request, page, body)?);
            self.progress
                .report(UnitKind::Page(request.items_key), page as usize, total);
        }

        tracing::info!(
            "Fetched {} {} across {} page(s)",
            items.len(),
            request.items_key,
            total
        );
        Ok(items)
    }

    async fn fetch(&self, request: &PageRequest, page: u32) -> Result<Value, WalkError> {
        tracing::debug!("Fetching {} page {}", request.items_key, page);
        match self.source.fetch_page(request, page).await {
            Ok(body) => Ok(body),
            Err(FetchFailure::Decode(detail)) => Err(malformed(request, page, detail)),
            Err(failure) => Err(WalkError::Fetch {
                resource: request.items_key,
                page,
                failure,
            }),
        }
    }
}

fn malformed(request: &PageRequest, page: u32, detail: impl Into<String>) -> WalkError {
    WalkError::MalformedResponse {
        resource: request.items_key,
        page,
        detail: detail.into(),
    }
}

fn take_items<T: DeserializeOwned>(
    request: &PageRequest,
    page: u32,
    mut body: Value,
) -> Result<Vec<T>, WalkError> {
    let raw = match body.get_mut(request.items_key).map(Value::take) {
        Some(Value::Array(raw)) => raw,
        _ => {
            return Err(malformed(
                request,
                page,
                format!("missing `{}` array", request.items_key),
            ))
        }
    };

    raw.into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value(item)
                .map_err(|e| malformed(request, page, format!("item {}: {}", i, e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::progress::testing::RecordingProgress;
    use crate::sync::progress::NoProgress;
    use crate::sync::testing::{page_body, FakeSource};
    use serde_json::json;

    fn numbers_request() -> PageRequest {
        PageRequest {
            path: "numbers",
            items_key: "numbers",
            page_size: 3,
            since: None,
        }
    }

    #[tokio::test]
    async fn test_walk_concatenates_pages_in_order() {
        let request = numbers_request();
        // Uneven distribution per page, including an empty page
        let pages: Vec<Vec<i64>> = vec![vec![1, 2, 3], vec![], vec![4], vec![5, 6]];
        let source = FakeSource::new();
        for (i, items) in pages.iter().enumerate() {
            source.set_page(
                "numbers",
                i as u32 + 1,
                page_body("numbers", pages.len() as u32, json!(items)),
            );
        }

        let walked: Vec<i64> = PageWalker::new(&source, &NoProgress)
            .walk(&request)
            .await
            .unwrap();

        assert_eq!(walked, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(source.requested_pages("numbers"), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_walk_trusts_first_page_count() {
        let source = FakeSource::new();
        source.set_page("numbers", 1, page_body("numbers", 2, json!([1])));
        // A later page claiming a different count does not extend the walk
        source.set_page("numbers", 2, page_body("numbers", 5, json!([2])));
        source.set_page("numbers", 3, page_body("numbers", 5, json!([3])));

        let walked: Vec<i64> = PageWalker::new(&source, &NoProgress)
            .walk(&numbers_request())
            .await
            .unwrap();

        assert_eq!(walked, vec![1, 2]);
        assert_eq!(source.requested_pages("numbers"), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_walk_zero_page_count_returns_first_page_only() {
        let source = FakeSource::new();
        source.set_page("numbers", 1, page_body("numbers", 0, json!([])));

        let walked: Vec<i64> = PageWalker::new(&source, &NoProgress)
            .walk(&numbers_request())
            .await
            .unwrap();

        assert!(walked.is_empty());
        assert_eq!(source.requested_pages("numbers"), vec![1]);
    }

    #[tokio::test]
    async fn test_missing_page_count_is_malformed() {
        let source = FakeSource::new();
        source.set_page("numbers", 1, json!({"numbers": [1, 2]}));

        let err = PageWalker::new(&source, &NoProgress)
            .walk::<i64>(&numbers_request())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WalkError::MalformedResponse { page: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_items_on_first_page_is_malformed() {
        let source = FakeSource::new();
        source.set_page("numbers", 1, json!({"page_count": 1, "other": []}));

        let err = PageWalker::new(&source, &NoProgress)
            .walk::<i64>(&numbers_request())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("missing `numbers` array"));
    }

    #[tokio::test]
    async fn test_invalid_item_is_malformed_with_page() {
        let source = FakeSource::new();
        source.set_page("numbers", 1, page_body("numbers", 2, json!([1])));
        source.set_page("numbers", 2, page_body("numbers", 2, json!([2, "three"])));

        let err = PageWalker::new(&source, &NoProgress)
            .walk::<i64>(&numbers_request())
            .await
            .unwrap_err();

        assert_eq!(err.page(), 2);
        assert!(err.to_string().contains("item 1"));
    }

    #[tokio::test]
    async fn test_failed_later_page_aborts_with_page_number() {
        let source = FakeSource::new();
        source.set_page("numbers", 1, page_body("numbers", 3, json!([1])));
        source.set_page("numbers", 2, page_body("numbers", 3, json!([2])));
        source.fail_page("numbers", 3, FetchFailure::Status(502));

        let err = PageWalker::new(&source, &NoProgress)
            .walk::<i64>(&numbers_request())
            .await
            .unwrap_err();

        match err {
            WalkError::Fetch {
                resource,
                page,
                failure,
            } => {
                assert_eq!(resource, "numbers");
                assert_eq!(page, 3);
                assert_eq!(failure, FetchFailure::Status(502));
            }
            other => panic!("expected fetch error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_undecodable_body_is_malformed() {
        let source = FakeSource::new();
        source.fail_page("numbers", 1, FetchFailure::Decode("expected value".into()));

        let err = PageWalker::new(&source, &NoProgress)
            .walk::<i64>(&numbers_request())
            .await
            .unwrap_err();

        assert!(matches!(err, WalkError::MalformedResponse { page: 1, .. }));
    }

    #[tokio::test]
    async fn test_progress_reported_per_page() {
        let source = FakeSource::new();
        for page in 1..=3 {
            source.set_page("numbers", page, page_body("numbers", 3, json!([page])));
        }
        let progress = RecordingProgress::default();

        let _: Vec<i64> = PageWalker::new(&source, &progress)
            .walk(&numbers_request())
            .await
            .unwrap();

        assert_eq!(
            progress.ticks_for(UnitKind::Page("numbers")),
            vec![(1, 3), (2, 3), (3, 3)]
        );
    }
}

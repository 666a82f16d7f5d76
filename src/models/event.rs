use serde::Deserialize;

use super::workout::Workout;

/// One entry of the remote "workout events since" feed.
///
/// Unrecognized `type` tags deserialize to [`ChangeEvent::Unknown`] so the
/// feed can grow without breaking a sync run.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChangeEvent {
    Added { workout: Workout },
    Updated { workout: Workout },
    Deleted { id: String },
    #[serde(other)]
    Unknown,
}

impl ChangeEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ChangeEvent::Added { .. } => "added",
            ChangeEvent::Updated { .. } => "updated",
            ChangeEvent::Deleted { .. } => "deleted",
            ChangeEvent::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_deleted_event() {
        let json = r#"{"type": "deleted", "id": "W1", "deleted_at": "2024-08-14T12:00:00Z"}"#;
        let event: ChangeEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, ChangeEvent::Deleted { id: "W1".into() });
        assert_eq!(event.kind(), "deleted");
    }

    #[test]
    fn test_parse_updated_event() {
        let json = r#"{
            "type": "updated",
            "workout": {
                "id": "W3",
                "title": "New",
                "start_time": "2024-08-14T12:00:00Z",
                "end_time": "2024-08-14T13:00:00Z",
                "updated_at": "2024-08-14T13:00:00Z",
                "created_at": "2024-08-14T13:00:00Z",
                "exercises": []
            }
        }"#;
        let event: ChangeEvent = serde_json::from_str(json).unwrap();
        match event {
            ChangeEvent::Updated { workout } => assert_eq!(workout.id, "W3"),
            other => panic!("expected updated event, got {:?}", other),
        }
    }

    #[test]
    fn test_unrecognized_type_is_unknown() {
        let json = r#"{"type": "archived", "id": "W9"}"#;
        let event: ChangeEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, ChangeEvent::Unknown);
    }

    #[test]
    fn test_updated_without_payload_is_rejected() {
        let json = r#"{"type": "updated", "id": "W3"}"#;
        let parsed: Result<ChangeEvent, _> = serde_json::from_str(json);
        assert!(parsed.is_err());
    }
}

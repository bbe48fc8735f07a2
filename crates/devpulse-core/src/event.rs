use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::EntityId;
use crate::CoreError;

/// Kind of a discrete, causally significant milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    TitleChange,
    TagsChange,
    StaffCurated,
    VelocitySpike,
    Deleted,
    Manual,
}

impl EventType {
    pub const ALL: [EventType; 6] = [
        EventType::TitleChange,
        EventType::TagsChange,
        EventType::StaffCurated,
        EventType::VelocitySpike,
        EventType::Deleted,
        EventType::Manual,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::TitleChange => "title_change",
            EventType::TagsChange => "tags_change",
            EventType::StaffCurated => "staff_curated",
            EventType::VelocitySpike => "velocity_spike",
            EventType::Deleted => "deleted",
            EventType::Manual => "manual",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        EventType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| CoreError::InvalidEventType(s.to_string()))
    }
}

/// A named, timestamped occurrence used as an anchor for before/after comparisons.
///
/// Immutable once created. `entity_id` is `None` for account-wide events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneEvent {
    pub entity_id: Option<EntityId>,
    pub event_type: EventType,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

impl MilestoneEvent {
    /// Returns `true` when both events describe the same logged occurrence.
    ///
    /// This is the idempotency key for milestone appends.
    #[must_use]
    pub fn same_occurrence(&self, other: &MilestoneEvent) -> bool {
        self.entity_id == other.entity_id
            && self.event_type == other.event_type
            && self.description == other.description
            && self.occurred_at == other.occurred_at
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn event_type_round_trips_through_str() {
        for t in EventType::ALL {
            assert_eq!(t.as_str().parse::<EventType>().unwrap(), t);
        }
    }

    #[test]
    fn event_type_parse_accepts_dashes_and_case() {
        assert_eq!(
            "Staff-Curated".parse::<EventType>().unwrap(),
            EventType::StaffCurated
        );
    }

    #[test]
    fn event_type_parse_rejects_unknown() {
        let err = "went_viral".parse::<EventType>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidEventType(ref s) if s == "went_viral"));
    }

    #[test]
    fn event_type_serializes_snake_case() {
        let json = serde_json::to_string(&EventType::TitleChange).unwrap();
        assert_eq!(json, "\"title_change\"");
    }

    #[test]
    fn same_occurrence_ignores_nothing_but_identity() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let a = MilestoneEvent {
            entity_id: Some(7),
            event_type: EventType::StaffCurated,
            description: "Featured in the weekly digest".to_string(),
            occurred_at: at,
        };
        let mut b = a.clone();
        assert!(a.same_occurrence(&b));
        b.occurred_at = at + chrono::Duration::seconds(1);
        assert!(!a.same_occurrence(&b));
    }
}

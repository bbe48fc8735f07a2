//! Content-change detection for tracked articles.

use chrono::{DateTime, Utc};
use devpulse_core::{ContentVersion, EntityId, EventType, MilestoneEvent};
use sha2::{Digest, Sha256};

/// SHA-256 hex digest of a title and its tags.
///
/// Tags are sorted first so reordering them does not count as a change.
#[must_use]
pub fn content_hash(title: &str, tags: &[String]) -> String {
    let mut sorted: Vec<&str> = tags.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    let input = format!("{title}\n{}", sorted.join(","));
    format!("{:x}", Sha256::digest(input.as_bytes()))
}

/// Outcome of comparing an article's current content with its last recorded version.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentChange {
    Unchanged,
    /// No version on record yet. The version is stored without a milestone.
    FirstSeen(ContentVersion),
    TitleChanged {
        version: ContentVersion,
        milestone: MilestoneEvent,
    },
    /// Tags are not significant enough for a milestone.
    TagsChanged(ContentVersion),
}

impl ContentChange {
    /// The version to persist, if any.
    #[must_use]
    pub fn version(&self) -> Option<&ContentVersion> {
        match self {
            ContentChange::Unchanged => None,
            ContentChange::FirstSeen(v)
            | ContentChange::TagsChanged(v)
            | ContentChange::TitleChanged { version: v, .. } => Some(v),
        }
    }

    #[must_use]
    pub fn milestone(&self) -> Option<&MilestoneEvent> {
        match self {
            ContentChange::TitleChanged { milestone, .. } => Some(milestone),
            _ => None,
        }
    }
}

#[must_use]
pub fn title_change_description(old: &str, new: &str) -> String {
    format!("Title change: '{old}' → '{new}'")
}

/// Compare current title and tags against the last known version.
#[must_use]
pub fn detect_content_change(
    entity_id: EntityId,
    current_title: &str,
    current_tags: &[String],
    last_known: Option<&ContentVersion>,
    now: DateTime<Utc>,
) -> ContentChange {
    let hash = content_hash(current_title, current_tags);
    let version = || ContentVersion {
        entity_id,
        title: current_title.to_string(),
        tags: current_tags.to_vec(),
        content_hash: hash.clone(),
        changed_at: now,
    };

    let Some(previous) = last_known else {
        return ContentChange::FirstSeen(version());
    };

    if previous.title != current_title {
        return ContentChange::TitleChanged {
            version: version(),
            milestone: MilestoneEvent {
                entity_id: Some(entity_id),
                event_type: EventType::TitleChange,
                description: title_change_description(&previous.title, current_title),
                occurred_at: now,
            },
        };
    }

    if previous.content_hash != hash {
        return ContentChange::TagsChanged(version());
    }

    ContentChange::Unchanged
}

use devpulse_core::EntityId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A required time-window match could not be found.
    ///
    /// Callers skip the affected entity for that report; never fatal.
    #[error("insufficient data{}: {reason}", entity_label(.entity_id))]
    InsufficientData {
        entity_id: Option<EntityId>,
        reason: String,
    },

    /// Daily values fit neither (or both) cumulative and incremental readings.
    #[error(
        "ambiguous semantics for counter {counter}: max={max}, sum={sum}, lifetime={lifetime}"
    )]
    AmbiguousSemantics {
        counter: String,
        max: i64,
        sum: i64,
        lifetime: i64,
    },
}

impl EngineError {
    pub(crate) fn insufficient(reason: impl Into<String>) -> Self {
        Self::InsufficientData {
            entity_id: None,
            reason: reason.into(),
        }
    }

    /// Attach an entity to an `InsufficientData` error that was raised without one.
    #[must_use]
    pub fn for_entity(self, id: EntityId) -> Self {
        match self {
            Self::InsufficientData {
                entity_id: None,
                reason,
            } => Self::InsufficientData {
                entity_id: Some(id),
                reason,
            },
            other => other,
        }
    }
}

#[allow(clippy::ref_option)] // called from the derived Display impl with a field reference
fn entity_label(id: &Option<EntityId>) -> String {
    id.map(|id| format!(" for article {id}")).unwrap_or_default()
}

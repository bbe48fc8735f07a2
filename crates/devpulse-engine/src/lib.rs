//! Irregular time-series reconciliation and attribution.
//!
//! Every function here is a synchronous, deterministic computation over
//! snapshot data that has already been loaded. Windows and tolerances come
//! from [`devpulse_core::EngineConfig`]; data comes through the
//! [`SnapshotSource`] capability.

pub mod attribution;
pub mod content;
pub mod delta;
pub mod error;
pub mod impact;
pub mod matcher;
pub mod reconcile;
pub mod report;
pub mod semantics;
pub mod series;
pub mod source;
pub mod velocity;

pub use attribution::{attribute, attribute_window, AttributionResult};
pub use content::{content_hash, detect_content_change, ContentChange};
pub use delta::{compute_delta, compute_windowed_delta, WindowedDelta};
pub use error::EngineError;
pub use impact::{impact, impact_pct, summarize_by_event_type, ImpactResult, ImpactSummary};
pub use matcher::find_nearest;
pub use reconcile::{reconcile, windowed_sum, CounterPair, LikelyCause, Reconciliation};
pub use report::{Report, SkippedEntity};
pub use semantics::{infer_semantics, CounterSemantics};
pub use series::{Sample, Series, TimeRange};
pub use source::{MemoryStore, MilestoneSink, SnapshotSource};
pub use velocity::{
    average_velocity, period_velocity, retention_adjusted_weekly_rate, sampling_cadence,
    velocity_profile, SamplingCadence, VelocityProfile,
};

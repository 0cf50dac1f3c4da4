//! Domain layer: entity snapshots, field tables, event records and notices.
//!
//! Everything here is pure data and pure functions, apart from the
//! [`OutcomeBus`] broadcast channel.

pub mod backfill_kind;
pub mod entity;
pub mod event_id;
pub mod event_record;
pub mod field_diff;
pub mod notice;
pub mod outcome_bus;

pub use backfill_kind::BackfillKind;
pub use entity::{Channel, ChannelType, Emoji, Guild, Member, Role, User, VerificationLevel};
pub use event_id::EventId;
pub use event_record::{
    ActionType, AttributionState, AttributionUpdate, DisplayRef, EventChange, EventOption,
    EventRecord, NewEventRecord, TargetType,
};
pub use field_diff::{FieldDiff, FieldSpec, FieldValue, TrackedEntity};
pub use notice::EventlogNotice;
pub use outcome_bus::{FailureTally, OutcomeBus};

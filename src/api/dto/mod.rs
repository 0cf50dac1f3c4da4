//! Data Transfer Objects for REST request/response serialization.

pub mod backfill_dto;
pub mod common_dto;
pub mod event_dto;
pub mod notification_dto;

pub use backfill_dto::*;
pub use common_dto::*;
pub use event_dto::*;
pub use notification_dto::*;

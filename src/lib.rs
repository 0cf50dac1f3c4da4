//! # guild-eventlog
//!
//! Audit trail for guild administration events.
//!
//! Change notifications (channels, roles, members, bans, emoji, guild
//! settings) are turned into event records with field-level diffs, posted
//! to every configured event-log channel, persisted, and later attributed
//! to the acting user from the platform's delayed audit log.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── EventlogDispatcher ── OutcomeBus (domain/)
//!     │       │
//!     │   EventlogHandlers ── BackfillQueue ── BackfillSetStore
//!     │       │                    │
//!     │   EventSink           BackfillReconciler ── AttributionFeed (feed/)
//!     │       │
//!     ├── FieldDiff + render (domain/, display/)
//!     ├── GuildSettingsProvider, UserDirectory (guild/)
//!     ├── DisplaySurface (display/)
//!     │
//!     └── EventStore: in-memory or PostgreSQL (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod display;
pub mod domain;
pub mod error;
pub mod feed;
pub mod guild;
pub mod persistence;
pub mod runtime;
pub mod service;

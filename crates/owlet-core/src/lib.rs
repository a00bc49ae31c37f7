//! # Owlet Core Library
//!
//! Core business logic for Owlet, a child-facing learning app built from
//! sequential content units. The library decides which stage buttons are
//! locked and when the next unit opens, while resisting local-clock
//! tampering and tolerating intermittent connectivity. Rendering, scene
//! loading, audio, and asset handling live in the app shell above this
//! crate.
//!
//! ## Architecture
//!
//! - **Time**: timezone-aware "now" with a network-authoritative fallback
//!   for unlock-date comparisons
//! - **Connectivity**: reachability probing, reconnect events, and the
//!   single-flight guard around network operations
//! - **Progress**: fetch-once-per-session cache over the remote progress
//!   document, decoded into a typed tree at the store boundary
//! - **Unlock**: fail-closed stage lock derivation and the write-once
//!   next-unit latch
//! - **Level**: pure XP → level math for presentation
//!
//! ## Key Components
//!
//! - [`SessionContext`]: per-session ownership and teardown
//! - [`ProgressStore`]: the session-scoped document cache
//! - [`ConnectivityGate`]: connectivity state and single-flight
//! - [`TimeAuthority`]: authoritative time resolution
//! - [`UnlockResolver`]: per-button lock booleans plus the unit latch

pub mod config;
pub mod connectivity;
pub mod error;
pub mod level;
pub mod progress;
pub mod session;
pub mod time;
pub mod unlock;

pub use config::{Config, ConfigError};
pub use connectivity::{ConnectivityGate, HttpProbe, NetworkProbe, Reconnected};
pub use error::{CoreError, Result};
pub use level::{compute_level, XpState};
pub use progress::{
    spawn_reconnect_retry, DocPath, DocumentStore, FieldValue, HttpDocumentStore,
    ProgressDocument, ProgressStore, StoreError, UnitStatusMap,
};
pub use session::SessionContext;
pub use time::{
    HttpTimeService, NetworkTimeClient, TimeAuthority, TimeError, TimeSample, TimeSource,
};
pub use unlock::{
    parse_unlock_date, resolve_stage_locks, StageLockState, UnlockReport, UnlockResolver,
};

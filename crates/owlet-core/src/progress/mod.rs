//! Remote progress document: typed tree, store seam, and session cache.
//!
//! The remote record holds per-unit stage completion flags and unlock-date
//! metadata for one learner. It is fetched at most once per authenticated
//! session and held as an immutable snapshot; an explicit refresh (logout or
//! a manual refresh action) is the only way to replace it.

pub mod document;
pub mod remote;
pub mod store;


pub use document::{
    DecodeError, DocPath, FieldValue, ProgressDocument, UnitStatusMap, FIELD_NEXT_UNIT_DATE,
    FIELD_UNIT_STAGE_STATUS,
};
pub use remote::{DocumentStore, HttpDocumentStore};
pub use store::{spawn_reconnect_retry, ProgressStore, StoreError};

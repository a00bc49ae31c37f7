//! Authoritative time resolution.
//!
//! Unlock-date comparisons must not trust the device clock alone: a user can
//! set the clock forward to open content early. The primary path converts the
//! local clock into the learner's timezone; when that zone cannot be
//! resolved, a trusted network time source breaks the tie.

pub mod authority;
pub mod network;

pub use authority::{TimeAuthority, TimeSample, TimeSource};
pub use network::{HttpTimeService, NetworkTimeClient};

use thiserror::Error;

/// Time resolution errors.
#[derive(Debug, Error)]
pub enum TimeError {
    /// The network time service could not be reached.
    #[error("Time service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The network time service answered with an unusable payload.
    #[error("Time service returned a malformed payload: {0}")]
    Malformed(String),

    /// Both the local zone conversion and the network fallback failed.
    /// There is no safe default for an unlock-date decision; callers must
    /// defer the decision rather than treat this as locked or unlocked.
    #[error("Time unavailable: zone '{zone}' could not be resolved and the network source failed: {source}")]
    Unavailable {
        zone: String,
        #[source]
        source: Box<TimeError>,
    },
}

//! Timezone-aware "now" with a network-authoritative fallback.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use super::network::NetworkTimeClient;
use super::TimeError;

/// Where a [`TimeSample`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeSource {
    /// Local device clock converted into the requested zone.
    LocalAdjusted,
    /// Trusted network time source; used when the zone conversion failed.
    NetworkAuthoritative,
}

/// A point in time tagged with its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeSample {
    pub at: DateTime<FixedOffset>,
    pub source: TimeSource,
}

impl TimeSample {
    /// Calendar date of the sample, used for unlock comparisons.
    pub fn date(&self) -> NaiveDate {
        self.at.date_naive()
    }
}

/// Resolves the current time in a target timezone.
///
/// The local device clock is the primary source; when the zone id cannot be
/// resolved the network source is queried instead and the sample is tagged
/// [`TimeSource::NetworkAuthoritative`]. If that call also fails, the whole
/// operation fails with [`TimeError::Unavailable`] -- there is no further
/// fallback and no default.
pub struct TimeAuthority<C: NetworkTimeClient> {
    client: C,
}

impl<C: NetworkTimeClient> TimeAuthority<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Resolve "now" in the given IANA zone (e.g. `"Asia/Tokyo"`).
    pub async fn now(&self, zone: &str) -> Result<TimeSample, TimeError> {
        self.sample_at(zone, Utc::now()).await
    }

    /// Resolution against an explicit local instant; `now` delegates here so
    /// tests can pin the clock.
    async fn sample_at(&self, zone: &str, local_utc: DateTime<Utc>) -> Result<TimeSample, TimeError> {
        match zone.parse::<Tz>() {
            Ok(tz) => Ok(TimeSample {
                at: local_utc.with_timezone(&tz).fixed_offset(),
                source: TimeSource::LocalAdjusted,
            }),
            Err(_) => {
                tracing::debug!(zone, "zone unresolvable, querying network time source");
                let remote = self
                    .client
                    .fetch_utc_now()
                    .await
                    .map_err(|source| TimeError::Unavailable {
                        zone: zone.to_string(),
                        source: Box::new(source),
                    })?;
                Ok(TimeSample {
                    at: remote.fixed_offset(),
                    source: TimeSource::NetworkAuthoritative,
                })
            }
        }
    }
}

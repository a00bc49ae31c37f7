//! Network time source client.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::Url;

use super::TimeError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A trusted external source of the current UTC instant.
pub trait NetworkTimeClient: Send + Sync {
    /// Fetch the current UTC time. Fails with a transport error if the
    /// source is unreachable; there is no retry policy at this layer.
    fn fetch_utc_now(
        &self,
    ) -> impl std::future::Future<Output = Result<DateTime<Utc>, TimeError>> + Send;
}

/// Response shape of the time endpoint: a JSON object carrying the current
/// UTC instant as an RFC 3339 string.
#[derive(Debug, Deserialize)]
struct TimePayload {
    utc_datetime: String,
}

/// HTTP client for a worldtimeapi-style endpoint.
pub struct HttpTimeService {
    endpoint: Url,
    client: reqwest::Client,
}

impl HttpTimeService {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            client: reqwest::Client::new(),
        }
    }
}

impl NetworkTimeClient for HttpTimeService {
    async fn fetch_utc_now(&self) -> Result<DateTime<Utc>, TimeError> {
        let payload: TimePayload = self
            .client
            .get(self.endpoint.clone())
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let at = DateTime::parse_from_rfc3339(&payload.utc_datetime)
            .map_err(|e| TimeError::Malformed(format!("'{}': {e}", payload.utc_datetime)))?;
        Ok(at.with_timezone(&Utc))
    }
}

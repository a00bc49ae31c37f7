//! Reachability probe seam.

use std::time::Duration;

use url::Url;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Answers "is the network reachable right now?".
///
/// Implementations must not fail in a way that blocks the caller: any
/// transport error is reported as unreachable.
pub trait NetworkProbe: Send + Sync {
    /// Probe reachability. `force` is a hint that the caller wants a fresh
    /// answer; implementations holding their own short-lived state should
    /// bypass it.
    fn is_reachable(&self, force: bool) -> impl std::future::Future<Output = bool> + Send;
}

/// HTTP reachability probe against a generate-204 style endpoint.
pub struct HttpProbe {
    endpoint: Url,
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            client: reqwest::Client::new(),
        }
    }
}

impl NetworkProbe for HttpProbe {
    async fn is_reachable(&self, _force: bool) -> bool {
        match self
            .client
            .get(self.endpoint.clone())
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(err) => {
                tracing::debug!(error = %err, "reachability probe failed");
                false
            }
        }
    }
}

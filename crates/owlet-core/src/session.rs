//! Explicit session lifecycle.
//!
//! One `SessionContext` per authenticated learner session. It owns the
//! connectivity gate, the progress store, the time authority, and the
//! unlock resolver, and it tears all of them down deterministically on
//! logout -- no ambient statics, no fire-and-forget tasks outliving the
//! session.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use url::Url;
use uuid::Uuid;

use crate::config::{Config, ConfigError};
use crate::connectivity::{ConnectivityGate, HttpProbe, NetworkProbe};
use crate::progress::{
    spawn_reconnect_retry, DocPath, DocumentStore, HttpDocumentStore, ProgressDocument,
    ProgressStore,
};
use crate::time::{HttpTimeService, NetworkTimeClient, TimeAuthority, TimeError, TimeSample};
use crate::unlock::{UnlockReport, UnlockResolver};

/// Per-session ownership of the core components.
pub struct SessionContext<S, P, C>
where
    S: DocumentStore,
    P: NetworkProbe,
    C: NetworkTimeClient,
{
    id: Uuid,
    gate: Arc<ConnectivityGate<P>>,
    store: Arc<ProgressStore<S, P>>,
    time: TimeAuthority<C>,
    resolver: Mutex<UnlockResolver>,
    shutdown: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<S, P, C> std::fmt::Debug for SessionContext<S, P, C>
where
    S: DocumentStore,
    P: NetworkProbe,
    C: NetworkTimeClient,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext").field("id", &self.id).finish()
    }
}

impl<S, P, C> SessionContext<S, P, C>
where
    S: DocumentStore + 'static,
    P: NetworkProbe + 'static,
    C: NetworkTimeClient,
{
    pub fn new(remote: S, probe: P, time_client: C) -> Self {
        Self::with_gate(remote, Arc::new(ConnectivityGate::new(probe)), time_client)
    }

    /// Construct around a pre-built gate, e.g. one with a custom probe
    /// cache window.
    pub fn with_gate(remote: S, gate: Arc<ConnectivityGate<P>>, time_client: C) -> Self {
        let store = Arc::new(ProgressStore::new(remote, gate.clone()));
        let (shutdown, _) = watch::channel(false);
        Self {
            id: Uuid::new_v4(),
            gate,
            store,
            time: TimeAuthority::new(time_client),
            resolver: Mutex::new(UnlockResolver::new()),
            shutdown,
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn gate(&self) -> &Arc<ConnectivityGate<P>> {
        &self.gate
    }

    pub fn store(&self) -> &Arc<ProgressStore<S, P>> {
        &self.store
    }

    /// Start the supervised background work: the periodic reachability
    /// monitor and the fetch-retry-on-reconnect task for `path`. Both stop
    /// when [`logout`](Self::logout) runs.
    pub fn start_supervision(&self, path: DocPath, probe_every: Duration) {
        let mut tasks = self.tasks.lock().unwrap();
        tasks.push(ConnectivityGate::spawn_monitor(
            self.gate.clone(),
            probe_every,
            self.shutdown.subscribe(),
        ));
        tasks.push(spawn_reconnect_retry(
            self.store.clone(),
            path,
            self.shutdown.subscribe(),
        ));
    }

    /// Authoritative "now" in the learner's zone.
    pub async fn authoritative_now(&self, zone: &str) -> Result<TimeSample, TimeError> {
        self.time.now(zone).await
    }

    /// Evaluate one unit's locks against the loaded document. The resolver
    /// (and its next-unit latch) lives exactly as long as the snapshot.
    pub fn evaluate_unit(
        &self,
        doc: &ProgressDocument,
        unit_key: &str,
        layout: &[&str],
        now: &TimeSample,
    ) -> UnlockReport {
        self.resolver
            .lock()
            .unwrap()
            .evaluate(doc, unit_key, layout, now)
    }

    /// Drop the snapshot and reset the latch; the next read fetches again.
    pub fn refresh(&self) {
        self.store.refresh();
        *self.resolver.lock().unwrap() = UnlockResolver::new();
    }

    /// Tear the session down: signal supervised tasks, abort anything still
    /// in flight so late results are discarded, and clear session state.
    pub fn logout(&self) {
        let _ = self.shutdown.send(true);
        for task in self.tasks.lock().unwrap().drain(..) {
            task.abort();
        }
        self.refresh();
        tracing::debug!(session = %self.id, "session torn down");
    }
}

impl SessionContext<HttpDocumentStore, HttpProbe, HttpTimeService> {
    /// Wire a session from configuration using the production HTTP
    /// implementations of every seam.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let base = parse_endpoint("progress.base_url", &config.progress.base_url)?;
        let probe = parse_endpoint("network.probe_url", &config.network.probe_url)?;
        let service = parse_endpoint("time.service_url", &config.time.service_url)?;

        let gate = Arc::new(ConnectivityGate::with_cache_window(
            HttpProbe::new(probe),
            Duration::from_secs(config.network.probe_cache_secs),
        ));
        Ok(Self::with_gate(
            HttpDocumentStore::new(base),
            gate,
            HttpTimeService::new(service),
        ))
    }
}

fn parse_endpoint(key: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_wires_from_default_config() {
        let session = SessionContext::from_config(&Config::default()).unwrap();
        assert!(!session.store().is_loaded());
    }

    #[test]
    fn test_bad_endpoint_is_an_invalid_value() {
        let mut config = Config::default();
        config.progress.base_url = "not a url".to_string();

        let err = SessionContext::from_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}

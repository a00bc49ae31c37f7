//! Session-scoped cache over the remote progress document.

use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::connectivity::{ConnectivityGate, NetworkProbe};

use super::document::{DecodeError, DocPath, ProgressDocument};
use super::remote::DocumentStore;

/// Progress store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The reachability probe reports offline. Recoverable: the caller
    /// presents a retry affordance and the reconnect task retries.
    #[error("Device is offline")]
    Offline,

    /// Another fetch is already in flight. Try again shortly; this is not
    /// a permanent failure.
    #[error("Another fetch is already in flight")]
    Busy,

    /// The remote call itself failed.
    #[error("Document request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("Document endpoint returned HTTP {0}")]
    Http(u16),

    /// The payload does not fit the document schema.
    #[error("Document decode failed: {0}")]
    Decode(#[from] DecodeError),
}

/// Fetch-once-per-session cache of the remote progress document.
///
/// The snapshot and its loaded flag are owned here and mutated only by
/// these operations. The loaded flag is set only after a completed fetch,
/// so no concurrent fetch can be in flight once a read hits the cache.
pub struct ProgressStore<S: DocumentStore, P: NetworkProbe> {
    remote: S,
    gate: Arc<ConnectivityGate<P>>,
    snapshot: Mutex<Option<Arc<ProgressDocument>>>,
}

impl<S: DocumentStore, P: NetworkProbe> ProgressStore<S, P> {
    pub fn new(remote: S, gate: Arc<ConnectivityGate<P>>) -> Self {
        Self {
            remote,
            gate,
            snapshot: Mutex::new(None),
        }
    }

    pub fn gate(&self) -> &Arc<ConnectivityGate<P>> {
        &self.gate
    }

    /// The cached snapshot, if this session has loaded one.
    pub fn cached(&self) -> Option<Arc<ProgressDocument>> {
        self.snapshot.lock().unwrap().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.lock().unwrap().is_some()
    }

    /// Read the progress document, fetching it on the first call of the
    /// session. Offline and busy outcomes are distinct errors so the caller
    /// can tell "retry when reconnected" from "retry shortly".
    pub async fn document(&self, path: &DocPath) -> Result<Arc<ProgressDocument>, StoreError> {
        if let Some(doc) = self.cached() {
            return Ok(doc);
        }

        if !self.gate.check_now(false).await {
            return Err(StoreError::Offline);
        }

        let outcome = self
            .gate
            .single_flight(async {
                // A retry task may have filled the cache while this caller
                // was waiting on the probe.
                if let Some(doc) = self.cached() {
                    return Ok(doc);
                }
                let raw = self.remote.get(path).await?;
                let doc = Arc::new(ProgressDocument::decode(&raw)?);
                Ok::<_, StoreError>(doc)
            })
            .await;

        match outcome {
            None => Err(StoreError::Busy),
            Some(Err(err)) => {
                tracing::warn!(error = %err, %path, "progress fetch failed");
                Err(err)
            }
            Some(Ok(doc)) => {
                *self.snapshot.lock().unwrap() = Some(doc.clone());
                tracing::debug!(%path, "progress document loaded");
                Ok(doc)
            }
        }
    }

    /// Write fields through to the remote document. Connectivity is
    /// re-checked on every call; failures are logged and reported as
    /// `false`, never raised.
    pub async fn save_fields(&self, path: &DocPath, fields: &Map<String, Value>) -> bool {
        if !self.gate.check_now(false).await {
            tracing::warn!(%path, "save skipped: device is offline");
            return false;
        }

        match self.remote.save(path, fields).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, %path, "save failed");
                false
            }
        }
    }

    /// Drop the snapshot and loaded flag. The next read fetches again.
    pub fn refresh(&self) {
        *self.snapshot.lock().unwrap() = None;
    }
}

/// Supervised retry: re-attempts the initial fetch once per reconnect event
/// until the session shuts down. Late events after a successful load are
/// absorbed by the cache; concurrent attempts are refused by single-flight.
pub fn spawn_reconnect_retry<S, P>(
    store: Arc<ProgressStore<S, P>>,
    path: DocPath,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    S: DocumentStore + 'static,
    P: NetworkProbe + 'static,
{
    let mut reconnects = store.gate().subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                event = reconnects.recv() => match event {
                    Ok(_) => {
                        if store.is_loaded() {
                            continue;
                        }
                        match store.document(&path).await {
                            Ok(_) => tracing::debug!(%path, "progress loaded after reconnect"),
                            Err(StoreError::Busy) => {}
                            Err(err) => {
                                tracing::warn!(error = %err, %path, "reconnect fetch failed");
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    })
}

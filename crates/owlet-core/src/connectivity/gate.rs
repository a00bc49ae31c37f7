//! Connectivity state, transition events, and the single-flight guard.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::probe::NetworkProbe;

/// How long a probe verdict stays fresh before `check_now(false)` probes again.
const DEFAULT_CACHE_WINDOW: Duration = Duration::from_secs(2);

/// Published once per observed Offline→Online transition.
#[derive(Debug, Clone, Copy)]
pub struct Reconnected;

/// Link state as last observed by a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    Unknown,
    Online,
    Offline,
}

#[derive(Debug)]
struct ProbeState {
    link: Link,
    checked_at: Option<Instant>,
}

/// Gates network-dependent operations on reachability.
///
/// Owns the connectivity boolean; nothing outside this type mutates it.
/// Offline→Online transitions are published on a broadcast channel --
/// Online→Offline is silent, since no consumer retries on loss.
pub struct ConnectivityGate<P: NetworkProbe> {
    probe: P,
    cache_window: Duration,
    state: Mutex<ProbeState>,
    transitions: broadcast::Sender<Reconnected>,
    flight: tokio::sync::Mutex<()>,
}

impl<P: NetworkProbe> ConnectivityGate<P> {
    pub fn new(probe: P) -> Self {
        Self::with_cache_window(probe, DEFAULT_CACHE_WINDOW)
    }

    pub fn with_cache_window(probe: P, cache_window: Duration) -> Self {
        let (transitions, _) = broadcast::channel(8);
        Self {
            probe,
            cache_window,
            state: Mutex::new(ProbeState {
                link: Link::Unknown,
                checked_at: None,
            }),
            transitions,
            flight: tokio::sync::Mutex::new(()),
        }
    }

    /// Probe reachability now. `force` bypasses the short-lived cached
    /// verdict. Never fails: a probe error reads as offline.
    pub async fn check_now(&self, force: bool) -> bool {
        if !force {
            let state = self.state.lock().unwrap();
            if state.link != Link::Unknown {
                if let Some(at) = state.checked_at {
                    if at.elapsed() < self.cache_window {
                        return state.link == Link::Online;
                    }
                }
            }
        }

        let reachable = self.probe.is_reachable(force).await;

        let was = {
            let mut state = self.state.lock().unwrap();
            let was = state.link;
            state.link = if reachable { Link::Online } else { Link::Offline };
            state.checked_at = Some(Instant::now());
            was
        };

        if was == Link::Offline && reachable {
            tracing::debug!("connectivity restored");
            // No receivers is fine; retry consumers come and go.
            let _ = self.transitions.send(Reconnected);
        }

        reachable
    }

    /// Last observed verdict without probing. `false` until a probe has run.
    pub fn is_online(&self) -> bool {
        self.state.lock().unwrap().link == Link::Online
    }

    /// Subscribe to Offline→Online transition events.
    pub fn subscribe(&self) -> broadcast::Receiver<Reconnected> {
        self.transitions.subscribe()
    }

    /// Run `op` unless another guarded operation is already in flight.
    ///
    /// Returns `None` immediately for a caller that arrives while one is
    /// running -- refused, not queued. `None` means "in flight elsewhere,
    /// try again shortly", not a permanent failure.
    pub async fn single_flight<F, T>(&self, op: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let _guard = self.flight.try_lock().ok()?;
        Some(op.await)
    }

    /// Supervised probe loop: re-checks reachability every `every` until the
    /// shutdown channel flips. Transition events fall out of `check_now`.
    pub fn spawn_monitor(
        gate: Arc<Self>,
        every: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()>
    where
        P: 'static,
    {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        gate.check_now(false).await;
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Probe scripted by an atomic flag, counting how often it actually runs.
    struct ScriptedProbe {
        reachable: Arc<AtomicBool>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedProbe {
        fn new(reachable: bool) -> (Self, Arc<AtomicBool>, Arc<AtomicUsize>) {
            let flag = Arc::new(AtomicBool::new(reachable));
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    reachable: flag.clone(),
                    calls: calls.clone(),
                },
                flag,
                calls,
            )
        }
    }

    impl NetworkProbe for ScriptedProbe {
        async fn is_reachable(&self, _force: bool) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reachable.load(Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn test_probe_error_reads_as_offline() {
        let (probe, flag, _) = ScriptedProbe::new(false);
        let gate = ConnectivityGate::new(probe);

        assert!(!gate.check_now(true).await);
        assert!(!gate.is_online());

        flag.store(true, Ordering::SeqCst);
        assert!(gate.check_now(true).await);
        assert!(gate.is_online());
    }

    #[tokio::test]
    async fn test_cached_verdict_skips_probe() {
        let (probe, _, calls) = ScriptedProbe::new(true);
        let gate = ConnectivityGate::with_cache_window(probe, Duration::from_secs(60));

        assert!(gate.check_now(false).await);
        assert!(gate.check_now(false).await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // force bypasses the window.
        assert!(gate.check_now(true).await);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_reconnect_event_fires_once_per_transition() {
        let (probe, flag, _) = ScriptedProbe::new(false);
        let gate = ConnectivityGate::with_cache_window(probe, Duration::ZERO);
        let mut events = gate.subscribe();

        // Unknown → Offline, then Offline → Offline: nothing published.
        gate.check_now(true).await;
        gate.check_now(true).await;
        assert!(events.try_recv().is_err());

        // Offline → Online publishes exactly one event.
        flag.store(true, Ordering::SeqCst);
        gate.check_now(true).await;
        assert!(events.try_recv().is_ok());
        assert!(events.try_recv().is_err());

        // Online → Online stays silent.
        gate.check_now(true).await;
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_first_online_probe_is_not_a_reconnect() {
        let (probe, _, _) = ScriptedProbe::new(true);
        let gate = ConnectivityGate::new(probe);
        let mut events = gate.subscribe();

        gate.check_now(true).await;
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_single_flight_refuses_concurrent_caller() {
        let (probe, _, _) = ScriptedProbe::new(true);
        let gate = Arc::new(ConnectivityGate::new(probe));

        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let slow_gate = gate.clone();
        let slow = tokio::spawn(async move {
            slow_gate
                .single_flight(async {
                    let _ = release_rx.await;
                    42
                })
                .await
        });

        // Give the slow operation time to take the guard.
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        let refused = gate.single_flight(async { 7 }).await;
        assert_eq!(refused, None);

        release_tx.send(()).unwrap();
        assert_eq!(slow.await.unwrap(), Some(42));

        // Guard released; the next caller runs.
        assert_eq!(gate.single_flight(async { 7 }).await, Some(7));
    }
}

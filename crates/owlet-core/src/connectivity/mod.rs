//! Reachability probing and connectivity-gated operations.
//!
//! Everything that touches the network funnels through [`ConnectivityGate`]:
//! it caches the probe verdict briefly, publishes Offline→Online transitions
//! for retry consumers, and enforces the single-flight discipline that keeps
//! flapping connectivity from spawning duplicate fetches.

pub mod gate;
pub mod probe;

pub use gate::{ConnectivityGate, Reconnected};
pub use probe::{HttpProbe, NetworkProbe};

//! Lightweight activity counters.
//!
//! No dashboard cache, no Prometheus exporter — just the atomics a log
//! line or an operator's `kill -USR1` dump can read without touching the
//! world directories.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct ServerMetrics {
    connections_accepted: AtomicU64,
    connections_rejected: AtomicU64,
    logins_succeeded: AtomicU64,
    logins_failed: AtomicU64,
    packets_parsed: AtomicU64,
    parse_errors: AtomicU64,
    disconnects: AtomicU64,
}

impl ServerMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_connection_accepted(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connection_rejected(&self) {
        self.connections_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_login_succeeded(&self) {
        self.logins_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_login_failed(&self) {
        self.logins_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_packet_parsed(&self) {
        self.packets_parsed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            connections_rejected: self.connections_rejected.load(Ordering::Relaxed),
            logins_succeeded: self.logins_succeeded.load(Ordering::Relaxed),
            logins_failed: self.logins_failed.load(Ordering::Relaxed),
            packets_parsed: self.packets_parsed.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            disconnects: self.disconnects.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct MetricsSnapshot {
    pub connections_accepted: u64,
    pub connections_rejected: u64,
    pub logins_succeeded: u64,
    pub logins_failed: u64,
    pub packets_parsed: u64,
    pub parse_errors: u64,
    pub disconnects: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero_and_increment() {
        let metrics = ServerMetrics::new();
        assert_eq!(metrics.snapshot().connections_accepted, 0);
        metrics.record_connection_accepted();
        metrics.record_connection_accepted();
        assert_eq!(metrics.snapshot().connections_accepted, 2);
    }
}

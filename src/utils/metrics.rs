//! Observability and Metrics
//!
//! Packet-level counters for the channel layer. The core builders and parsers
//! stay free of shared state; `SecureChannel` records what passes through it.
//!
//! Uses atomic counters for thread-safe metrics collection.

use crate::error::ProtocolError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Metrics collector for packet traffic
#[derive(Debug)]
pub struct Metrics {
    /// Packets built and handed to the transport
    pub packets_sent: AtomicU64,
    /// Packets received and parsed successfully
    pub packets_received: AtomicU64,
    /// Wire bytes sent
    pub bytes_sent: AtomicU64,
    /// Wire bytes received
    pub bytes_received: AtomicU64,
    /// Encrypted packets built
    pub encryptions: AtomicU64,
    /// Encrypted packets opened
    pub decryptions: AtomicU64,
    /// Packets dropped for a bad checksum
    pub checksum_failures: AtomicU64,
    /// Packets dropped for bad padding
    pub padding_failures: AtomicU64,
    /// Any other parse failure
    pub parse_errors: AtomicU64,
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            packets_sent: AtomicU64::new(0),
            packets_received: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            encryptions: AtomicU64::new(0),
            decryptions: AtomicU64::new(0),
            checksum_failures: AtomicU64::new(0),
            padding_failures: AtomicU64::new(0),
            parse_errors: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a packet written to the transport
    pub fn packet_sent(&self, byte_count: u64, encrypted: bool) {
        self.packets_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(byte_count, Ordering::Relaxed);
        if encrypted {
            self.encryptions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a packet read and parsed
    pub fn packet_received(&self, byte_count: u64, encrypted: bool) {
        self.packets_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(byte_count, Ordering::Relaxed);
        if encrypted {
            self.decryptions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Classify and record a parse failure
    pub fn parse_failed(&self, error: &ProtocolError) {
        let counter = match error {
            ProtocolError::ChecksumMismatch { .. } => &self.checksum_failures,
            ProtocolError::PaddingOrIntegrityError => &self.padding_failures,
            _ => &self.parse_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            packets_sent: self.packets_sent.load(Ordering::Relaxed),
            packets_received: self.packets_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            encryptions: self.encryptions.load(Ordering::Relaxed),
            decryptions: self.decryptions.load(Ordering::Relaxed),
            checksum_failures: self.checksum_failures.load(Ordering::Relaxed),
            padding_failures: self.padding_failures.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            packets_sent = snapshot.packets_sent,
            packets_received = snapshot.packets_received,
            bytes_sent = snapshot.bytes_sent,
            bytes_received = snapshot.bytes_received,
            encryptions = snapshot.encryptions,
            decryptions = snapshot.decryptions,
            checksum_failures = snapshot.checksum_failures,
            padding_failures = snapshot.padding_failures,
            parse_errors = snapshot.parse_errors,
            uptime_seconds = snapshot.uptime_seconds,
            "Packet metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub packets_sent: u64,
    pub packets_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub encryptions: u64,
    pub decryptions: u64,
    pub checksum_failures: u64,
    pub padding_failures: u64,
    pub parse_errors: u64,
    pub uptime_seconds: u64,
}

static METRICS: once_cell::sync::Lazy<Metrics> = once_cell::sync::Lazy::new(Metrics::new);

/// Get the global metrics instance
pub fn global_metrics() -> &'static Metrics {
    &METRICS
}

/// Timer for measuring operation duration
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    /// Start timing an operation
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        debug!(
            operation = self.operation,
            duration_us = duration.as_micros() as u64,
            "Operation completed"
        );
    }
}

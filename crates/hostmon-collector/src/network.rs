use crate::Collector;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hostmon_common::keys;
use hostmon_common::types::{MetricReading, Unit};
use std::fs;
use std::io;
use sysinfo::Networks;

/// Which network categories to sample.
#[derive(Debug, Clone)]
pub struct NetworkOptions {
    pub traffic: bool,
    pub connections: bool,
}

/// Computes throughput rates from two temporally-separated counter
/// samples. The previous sample is private state; the very first call
/// has no baseline and yields `None`.
#[derive(Debug, Default)]
pub struct ThroughputTracker {
    prev: Option<(u64, u64, DateTime<Utc>)>,
}

/// Inbound/outbound rates in megabits per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Throughput {
    pub in_mbps: f64,
    pub out_mbps: f64,
}

impl ThroughputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current cumulative counters and return the rate since
    /// the previous sample, or `None` when no usable baseline exists —
    /// never a spurious zero-or-huge value on startup.
    pub fn update(&mut self, rx_bytes: u64, tx_bytes: u64, now: DateTime<Utc>) -> Option<Throughput> {
        let rates = match self.prev {
            Some((prev_rx, prev_tx, prev_at)) => {
                let elapsed = (now - prev_at).num_milliseconds() as f64 / 1000.0;
                if elapsed > 0.0 {
                    Some(Throughput {
                        in_mbps: mbps(rx_bytes.saturating_sub(prev_rx), elapsed),
                        out_mbps: mbps(tx_bytes.saturating_sub(prev_tx), elapsed),
                    })
                } else {
                    None
                }
            }
            None => None,
        };
        self.prev = Some((rx_bytes, tx_bytes, now));
        rates
    }
}

fn mbps(delta_bytes: u64, elapsed_secs: f64) -> f64 {
    delta_bytes as f64 * 8.0 / elapsed_secs / 1e6
}

/// Samples aggregate interface throughput and the inet socket count.
pub struct NetworkCollector {
    options: NetworkOptions,
    networks: Networks,
    tracker: ThroughputTracker,
}

impl NetworkCollector {
    pub fn new(options: NetworkOptions) -> Self {
        Self {
            options,
            networks: Networks::new_with_refreshed_list(),
            tracker: ThroughputTracker::new(),
        }
    }

    fn sample_traffic(&mut self, readings: &mut Vec<MetricReading>) {
        self.networks.refresh();
        let now = Utc::now();

        let mut rx_total = 0u64;
        let mut tx_total = 0u64;
        for (_name, data) in self.networks.iter() {
            rx_total += data.total_received();
            tx_total += data.total_transmitted();
        }

        match self.tracker.update(rx_total, tx_total, now) {
            Some(rates) => {
                readings.push(MetricReading::gauge(
                    keys::NET_IN,
                    "Inbound traffic",
                    rates.in_mbps,
                    Unit::Mbps,
                    now,
                ));
                readings.push(MetricReading::gauge(
                    keys::NET_OUT,
                    "Outbound traffic",
                    rates.out_mbps,
                    Unit::Mbps,
                    now,
                ));
            }
            None => {
                tracing::debug!("no traffic baseline yet, rates unavailable this tick");
                readings.push(MetricReading::unavailable(
                    keys::NET_IN,
                    "Inbound traffic",
                    Unit::Mbps,
                    now,
                ));
                readings.push(MetricReading::unavailable(
                    keys::NET_OUT,
                    "Outbound traffic",
                    Unit::Mbps,
                    now,
                ));
            }
        }
    }

    fn sample_connections(&self, readings: &mut Vec<MetricReading>) {
        let now = Utc::now();
        match count_inet_sockets() {
            Ok(count) => readings.push(MetricReading::gauge(
                keys::NET_CONNS,
                "Network connections",
                count as f64,
                Unit::Count,
                now,
            )),
            Err(e) => {
                tracing::warn!(error = %e, "failed to count inet sockets");
                readings.push(MetricReading::unavailable(
                    keys::NET_CONNS,
                    "Network connections",
                    Unit::Count,
                    now,
                ));
            }
        }
    }
}

#[async_trait]
impl Collector for NetworkCollector {
    fn name(&self) -> &str {
        "network"
    }

    async fn sample(&mut self) -> Vec<MetricReading> {
        let mut readings = Vec::new();
        if self.options.traffic {
            self.sample_traffic(&mut readings);
        }
        if self.options.connections {
            self.sample_connections(&mut readings);
        }
        readings
    }
}

/// Count open inet sockets from the /proc/net tables (TCP and UDP, both
/// address families), one socket per non-header line.
fn count_inet_sockets() -> io::Result<usize> {
    let mut count = 0;
    for table in ["/proc/net/tcp", "/proc/net/tcp6", "/proc/net/udp", "/proc/net/udp6"] {
        let content = fs::read_to_string(table)?;
        count += content.lines().skip(1).filter(|l| !l.trim().is_empty()).count();
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + Duration::seconds(secs)
    }

    #[test]
    fn first_sample_has_no_rate() {
        let mut tracker = ThroughputTracker::new();
        assert_eq!(tracker.update(1_000_000, 500_000, at(0)), None);
    }

    #[test]
    fn computes_rate_from_two_samples() {
        let mut tracker = ThroughputTracker::new();
        tracker.update(1_000_000, 0, at(0));

        // 1,000,000 bytes over 10 s = 0.8 Mbps.
        let rates = tracker.update(2_000_000, 0, at(10)).unwrap();
        assert!((rates.in_mbps - 0.8).abs() < 1e-9);
        assert_eq!(rates.out_mbps, 0.0);
    }

    #[test]
    fn counter_reset_does_not_produce_a_huge_rate() {
        let mut tracker = ThroughputTracker::new();
        tracker.update(5_000_000, 5_000_000, at(0));

        // Counters went backwards (interface reset): deltas saturate to 0.
        let rates = tracker.update(1_000, 1_000, at(10)).unwrap();
        assert_eq!(rates.in_mbps, 0.0);
        assert_eq!(rates.out_mbps, 0.0);
    }

    #[test]
    fn zero_elapsed_time_yields_no_rate() {
        let mut tracker = ThroughputTracker::new();
        tracker.update(1_000_000, 0, at(0));
        assert_eq!(tracker.update(2_000_000, 0, at(0)), None);
    }
}

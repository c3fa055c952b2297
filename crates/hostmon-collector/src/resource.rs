use crate::Collector;
use async_trait::async_trait;
use chrono::Utc;
use hostmon_common::keys;
use hostmon_common::types::{MetricReading, Unit};
use std::path::Path;
use std::time::Duration;
use sysinfo::{Disks, System};

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Which resource categories to sample, mapped from the validated
/// configuration by the agent.
#[derive(Debug, Clone)]
pub struct ResourceOptions {
    pub memory: bool,
    pub swap: bool,
    pub cpu: bool,
    /// Length of the blocking CPU sampling window. Bounded and known in
    /// advance; the control loop accounts for it in the tick budget.
    pub cpu_sample_window: Duration,
    /// Mount paths to report disk usage for; empty disables disk sampling.
    pub disk_paths: Vec<String>,
}

/// Samples CPU, memory, swap and disk usage via sysinfo.
pub struct ResourceCollector {
    options: ResourceOptions,
    system: System,
    disks: Disks,
}

impl ResourceCollector {
    pub fn new(options: ResourceOptions) -> Self {
        Self {
            options,
            system: System::new(),
            disks: Disks::new_with_refreshed_list(),
        }
    }

    async fn sample_cpu(&mut self, readings: &mut Vec<MetricReading>) {
        // CPU usage is a delta between two refreshes; the window between
        // them is the configured sample interval.
        self.system.refresh_cpu_all();
        tokio::time::sleep(self.options.cpu_sample_window).await;
        self.system.refresh_cpu_all();

        let usage = self.system.global_cpu_usage() as f64;
        readings.push(MetricReading::gauge(
            keys::CPU,
            "CPU usage",
            usage,
            Unit::Percent,
            Utc::now(),
        ));
    }

    fn sample_memory(&mut self, readings: &mut Vec<MetricReading>) {
        self.system.refresh_memory();
        let now = Utc::now();

        if self.options.memory {
            let total = self.system.total_memory();
            let used = self.system.used_memory();
            let percent = if total > 0 {
                (used as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            readings.push(MetricReading::gauge(
                keys::MEMORY,
                "Memory usage",
                percent,
                Unit::Percent,
                now,
            ));
            readings.push(MetricReading::gauge(
                keys::MEMORY_USED_GB,
                "Memory used",
                used as f64 / BYTES_PER_GIB,
                Unit::Gibibytes,
                now,
            ));
            readings.push(MetricReading::gauge(
                keys::MEMORY_TOTAL_GB,
                "Memory total",
                total as f64 / BYTES_PER_GIB,
                Unit::Gibibytes,
                now,
            ));
        }

        if self.options.swap {
            let total = self.system.total_swap();
            let used = self.system.used_swap();
            let percent = if total > 0 {
                (used as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            readings.push(MetricReading::gauge(
                keys::SWAP,
                "Swap usage",
                percent,
                Unit::Percent,
                now,
            ));
        }
    }

    fn sample_disks(&mut self, readings: &mut Vec<MetricReading>) {
        self.disks.refresh();
        let now = Utc::now();

        for path in &self.options.disk_paths {
            let label = format!("Disk usage ({path})");
            let disk = self
                .disks
                .iter()
                .find(|d| d.mount_point() == Path::new(path));

            let Some(disk) = disk else {
                tracing::warn!(path = %path, "no mounted disk matches configured path");
                readings.push(MetricReading::unavailable(
                    keys::disk(path),
                    label,
                    Unit::Percent,
                    now,
                ));
                continue;
            };

            let total = disk.total_space();
            let available = disk.available_space();
            let used = total.saturating_sub(available);
            let percent = if total > 0 {
                (used as f64 / total as f64) * 100.0
            } else {
                0.0
            };

            readings.push(MetricReading::gauge(
                keys::disk(path),
                label,
                percent,
                Unit::Percent,
                now,
            ));
            readings.push(MetricReading::gauge(
                keys::disk_used_gb(path),
                format!("Disk used ({path})"),
                used as f64 / BYTES_PER_GIB,
                Unit::Gibibytes,
                now,
            ));
            readings.push(MetricReading::gauge(
                keys::disk_total_gb(path),
                format!("Disk total ({path})"),
                total as f64 / BYTES_PER_GIB,
                Unit::Gibibytes,
                now,
            ));
        }
    }
}

#[async_trait]
impl Collector for ResourceCollector {
    fn name(&self) -> &str {
        "resource"
    }

    async fn sample(&mut self) -> Vec<MetricReading> {
        let mut readings = Vec::new();

        if self.options.cpu {
            self.sample_cpu(&mut readings).await;
        }
        if self.options.memory || self.options.swap {
            self.sample_memory(&mut readings);
        }
        if !self.options.disk_paths.is_empty() {
            self.sample_disks(&mut readings);
        }

        readings
    }
}

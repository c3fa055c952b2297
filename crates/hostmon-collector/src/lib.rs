//! Metric collection for the hostmon agent.
//!
//! Each [`Collector`] implementation samples one category of host health
//! (system resources, network, containers) and returns it as a vector of
//! [`MetricReading`]s. Collectors are called sequentially, in a fixed
//! order, once per tick.

pub mod container;
pub mod network;
pub mod resource;

use async_trait::async_trait;
use hostmon_common::types::MetricReading;

/// A metric collector running on the monitored host.
///
/// Sampling is infallible by contract: a collector must not abort the tick
/// when its underlying source is unreachable. Partial failure is expressed
/// as readings with `available: false` (and a log line), so the control
/// loop never special-cases a degraded collector. Instances may keep
/// private mutable state across calls (sysinfo handles, previous byte
/// counters); that state is owned exclusively by the instance.
#[async_trait]
pub trait Collector: Send {
    /// Collector name used for logging (e.g. `"resource"`, `"network"`).
    fn name(&self) -> &str;

    /// Sample the collector's category once.
    async fn sample(&mut self) -> Vec<MetricReading>;
}

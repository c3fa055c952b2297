use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single observation produced by a collector during one tick.
///
/// Readings are created fresh every tick and never mutated afterwards.
/// A reading with `available: false` means the underlying source could not
/// be sampled this tick; its `value` carries no meaning and downstream
/// consumers must not treat it as data.
#[derive(Debug, Clone)]
pub struct MetricReading {
    /// Stable identifier for the metric on its resource (e.g. `disk:/`,
    /// `container:nginx:status`). See [`crate::keys`].
    pub key: String,
    /// Human-readable label used in notifications (e.g. "Disk usage (/)").
    pub label: String,
    pub value: MetricValue,
    pub unit: Unit,
    pub sampled_at: DateTime<Utc>,
    pub available: bool,
}

impl MetricReading {
    pub fn gauge(
        key: impl Into<String>,
        label: impl Into<String>,
        value: f64,
        unit: Unit,
        sampled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            value: MetricValue::Gauge(value),
            unit,
            sampled_at,
            available: true,
        }
    }

    pub fn state(
        key: impl Into<String>,
        label: impl Into<String>,
        state: impl Into<String>,
        sampled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            value: MetricValue::State(state.into()),
            unit: Unit::None,
            sampled_at,
            available: true,
        }
    }

    /// A well-formed reading for a source that could not be sampled this
    /// tick. Carries a zero gauge that nothing downstream is allowed to
    /// interpret.
    pub fn unavailable(
        key: impl Into<String>,
        label: impl Into<String>,
        unit: Unit,
        sampled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            value: MetricValue::Gauge(0.0),
            unit,
            sampled_at,
            available: false,
        }
    }

    /// Value rendered for humans, `n/a` when the reading is unavailable.
    pub fn display_value(&self) -> String {
        if !self.available {
            return "n/a".to_string();
        }
        format_value(&self.value, self.unit)
    }
}

/// A metric value: either a numeric gauge or an enumerated state.
///
/// Serializes untagged so persisted `last_value` fields read as a bare
/// number or string in the state file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Gauge(f64),
    State(String),
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricValue::Gauge(v) => write!(f, "{v:.1}"),
            MetricValue::State(s) => write!(f, "{s}"),
        }
    }
}

/// Display unit attached to a gauge reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Percent,
    Mbps,
    Gibibytes,
    Count,
    None,
}

/// Format a gauge value with its unit the way notifications print it.
///
/// # Examples
///
/// ```
/// use hostmon_common::types::{format_gauge, Unit};
///
/// assert_eq!(format_gauge(85.25, Unit::Percent), "85.2%");
/// assert_eq!(format_gauge(0.8, Unit::Mbps), "0.8 Mbps");
/// assert_eq!(format_gauge(1234.0, Unit::Count), "1234");
/// ```
pub fn format_gauge(value: f64, unit: Unit) -> String {
    match unit {
        Unit::Percent => format!("{value:.1}%"),
        Unit::Mbps => format!("{value:.1} Mbps"),
        Unit::Gibibytes => format!("{value:.1} GiB"),
        Unit::Count => format!("{value:.0}"),
        Unit::None => format!("{value:.1}"),
    }
}

/// Format any metric value with its unit; enumerated states render as-is.
pub fn format_value(value: &MetricValue, unit: Unit) -> String {
    match value {
        MetricValue::Gauge(v) => format_gauge(*v, unit),
        MetricValue::State(s) => s.clone(),
    }
}

/// Container runtime state as reported for a monitored container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Running,
    Exited,
    Paused,
    Unknown,
}

impl ContainerState {
    pub fn as_str(self) -> &'static str {
        match self {
            ContainerState::Running => "running",
            ContainerState::Exited => "exited",
            ContainerState::Paused => "paused",
            ContainerState::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ContainerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health-check verdict for a monitored container. `None` means the
/// container has no health check configured or the check has not produced
/// a verdict yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerHealth {
    Healthy,
    Unhealthy,
    None,
}

impl ContainerHealth {
    pub fn as_str(self) -> &'static str {
        match self {
            ContainerHealth::Healthy => "healthy",
            ContainerHealth::Unhealthy => "unhealthy",
            ContainerHealth::None => "none",
        }
    }
}

impl std::fmt::Display for ContainerHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

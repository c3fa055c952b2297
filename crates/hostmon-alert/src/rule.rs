use hostmon_common::types::{format_gauge, MetricValue, Unit};

/// One configured alert rule, bound to a single alert key.
///
/// Rules are built once at startup from the validated configuration and
/// are immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct AlertRule {
    pub key: String,
    pub label: String,
    pub condition: AlertCondition,
}

/// The comparator half of a rule.
///
/// Numeric rules breach when the value is at or above the threshold
/// (inclusive); enumerated rules breach when the observed state differs
/// from the expected one.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertCondition {
    AtLeast(f64),
    NotState(String),
}

impl AlertCondition {
    /// Whether `value` breaches this condition. A gauge never breaches an
    /// enumerated condition and vice versa.
    pub fn breaches(&self, value: &MetricValue) -> bool {
        match (self, value) {
            (AlertCondition::AtLeast(threshold), MetricValue::Gauge(v)) => v >= threshold,
            (AlertCondition::NotState(expected), MetricValue::State(s)) => s != expected,
            _ => false,
        }
    }

    /// The threshold or expected value rendered for notifications.
    pub fn display(&self, unit: Unit) -> String {
        match self {
            AlertCondition::AtLeast(threshold) => format_gauge(*threshold, unit),
            AlertCondition::NotState(expected) => expected.clone(),
        }
    }
}

use crate::rule::{AlertCondition, AlertRule};
use hostmon_common::types::{MetricReading, MetricValue, Unit};

/// The verdict for one (reading, rule) pair on one tick.
#[derive(Debug, Clone)]
pub struct AlertCandidate {
    pub key: String,
    pub label: String,
    pub breached: bool,
    /// Carried through from the reading so the control loop can withhold
    /// unavailable candidates from the state machine.
    pub available: bool,
    pub value: MetricValue,
    pub unit: Unit,
    pub condition: AlertCondition,
}

/// Evaluate one reading against its configured rule.
///
/// Pure and stateless. A reading marked unavailable never breaches:
/// absence of data is not itself an alert condition.
pub fn evaluate(reading: &MetricReading, rule: &AlertRule) -> AlertCandidate {
    let breached = reading.available && rule.condition.breaches(&reading.value);
    AlertCandidate {
        key: rule.key.clone(),
        label: rule.label.clone(),
        breached,
        available: reading.available,
        value: reading.value.clone(),
        unit: reading.unit,
        condition: rule.condition.clone(),
    }
}

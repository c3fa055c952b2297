use crate::evaluator::{evaluate, AlertCandidate};
use crate::rule::{AlertCondition, AlertRule};
use crate::state::{decide, AlertStateMachine, AlertStatus, NotifyKind};
use chrono::{DateTime, Duration, TimeZone, Utc};
use hostmon_common::types::{MetricReading, MetricValue, Unit};
use std::collections::BTreeMap;
use std::time::Duration as StdDuration;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + Duration::seconds(secs)
}

fn gauge_reading(key: &str, value: f64) -> MetricReading {
    MetricReading::gauge(key, "Memory usage", value, Unit::Percent, at(0))
}

fn memory_rule(threshold: f64) -> AlertRule {
    AlertRule {
        key: "memory".into(),
        label: "Memory usage".into(),
        condition: AlertCondition::AtLeast(threshold),
    }
}

fn candidate(key: &str, breached: bool) -> AlertCandidate {
    AlertCandidate {
        key: key.into(),
        label: key.into(),
        breached,
        available: true,
        value: MetricValue::Gauge(if breached { 95.0 } else { 50.0 }),
        unit: Unit::Percent,
        condition: AlertCondition::AtLeast(80.0),
    }
}

fn machine(cooldown_secs: u64, send_recovery: bool) -> AlertStateMachine {
    AlertStateMachine::new(
        StdDuration::from_secs(cooldown_secs),
        send_recovery,
        BTreeMap::new(),
    )
}

#[test]
fn threshold_is_inclusive_at_the_boundary() {
    let rule = memory_rule(80.0);
    assert!(evaluate(&gauge_reading("memory", 80.0), &rule).breached);
    assert!(!evaluate(&gauge_reading("memory", 79.9), &rule).breached);
}

#[test]
fn unavailable_reading_never_breaches() {
    let rule = memory_rule(80.0);
    let reading = MetricReading::unavailable("memory", "Memory usage", Unit::Percent, at(0));
    let c = evaluate(&reading, &rule);
    assert!(!c.breached);
    assert!(!c.available);

    // Same for enumerated rules.
    let rule = AlertRule {
        key: "container:nginx:status".into(),
        label: "Container nginx status".into(),
        condition: AlertCondition::NotState("running".into()),
    };
    let reading = MetricReading::unavailable(
        "container:nginx:status",
        "Container nginx status",
        Unit::None,
        at(0),
    );
    assert!(!evaluate(&reading, &rule).breached);
}

#[test]
fn enumerated_rule_breaches_on_unexpected_state() {
    let rule = AlertRule {
        key: "container:nginx:status".into(),
        label: "Container nginx status".into(),
        condition: AlertCondition::NotState("running".into()),
    };
    let running = MetricReading::state("container:nginx:status", "Container nginx status", "running", at(0));
    let exited = MetricReading::state("container:nginx:status", "Container nginx status", "exited", at(0));
    assert!(!evaluate(&running, &rule).breached);
    assert!(evaluate(&exited, &rule).breached);
}

#[test]
fn gauge_never_breaches_an_enumerated_condition() {
    // A type mismatch between reading and rule must not alert.
    let condition = AlertCondition::NotState("running".into());
    assert!(!condition.breaches(&MetricValue::Gauge(95.0)));
    let condition = AlertCondition::AtLeast(80.0);
    assert!(!condition.breaches(&MetricValue::State("exited".into())));
}

#[test]
fn decide_covers_the_transition_table() {
    let cooldown = Duration::seconds(300);

    // OK + no breach: no-op.
    assert_eq!(
        decide(AlertStatus::Ok, false, at(0), cooldown, None),
        (AlertStatus::Ok, None)
    );
    // OK + breach: alert.
    assert_eq!(
        decide(AlertStatus::Ok, true, at(0), cooldown, None),
        (AlertStatus::Alerting, Some(NotifyKind::Alert))
    );
    // OK + breach shortly after a previous notification: the transition
    // happens but the alert is withheld until the cooldown elapses.
    assert_eq!(
        decide(AlertStatus::Ok, true, at(100), cooldown, Some(at(0))),
        (AlertStatus::Alerting, None)
    );
    // ALERTING + breach, cooldown not elapsed: suppressed.
    assert_eq!(
        decide(AlertStatus::Alerting, true, at(100), cooldown, Some(at(0))),
        (AlertStatus::Alerting, None)
    );
    // ALERTING + breach, cooldown elapsed: reminder.
    assert_eq!(
        decide(AlertStatus::Alerting, true, at(300), cooldown, Some(at(0))),
        (AlertStatus::Alerting, Some(NotifyKind::Alert))
    );
    // ALERTING + no breach: recovery, regardless of cooldown.
    assert_eq!(
        decide(AlertStatus::Alerting, false, at(10), cooldown, Some(at(0))),
        (AlertStatus::Ok, Some(NotifyKind::Recovery))
    );
}

#[test]
fn cooldown_spaces_out_repeat_alerts() {
    let mut m = machine(300, true);

    let n = m.observe(&candidate("memory", true), at(0));
    assert_eq!(n.map(|n| n.kind), Some(NotifyKind::Alert));

    // Within the cooldown: suppressed.
    assert!(m.observe(&candidate("memory", true), at(100)).is_none());
    assert!(m.observe(&candidate("memory", true), at(299)).is_none());

    // Cooldown elapsed: reminder fires and restarts the window.
    let n = m.observe(&candidate("memory", true), at(300));
    assert_eq!(n.map(|n| n.kind), Some(NotifyKind::Alert));
    assert!(m.observe(&candidate("memory", true), at(400)).is_none());
}

#[test]
fn recovery_is_immediate_regardless_of_cooldown() {
    let mut m = machine(300, true);

    m.observe(&candidate("memory", true), at(0));
    // One second later the condition clears; cooldown must not delay this.
    let n = m.observe(&candidate("memory", false), at(1));
    assert_eq!(n.map(|n| n.kind), Some(NotifyKind::Recovery));
    assert_eq!(m.status("memory"), Some(AlertStatus::Ok));
}

#[test]
fn recovery_suppressed_when_disabled_but_state_still_transitions() {
    let mut m = machine(300, false);

    m.observe(&candidate("memory", true), at(0));
    assert!(m.observe(&candidate("memory", false), at(1)).is_none());
    assert_eq!(m.status("memory"), Some(AlertStatus::Ok));

    // A fresh breach after the silent recovery alerts again only once the
    // cooldown from the original alert has elapsed.
    assert!(m.observe(&candidate("memory", true), at(2)).is_none());
    let n = m.observe(&candidate("memory", true), at(300));
    assert_eq!(n.map(|n| n.kind), Some(NotifyKind::Alert));
}

#[test]
fn flapping_condition_cannot_bypass_the_cooldown() {
    let mut m = machine(300, true);

    let n = m.observe(&candidate("memory", true), at(0));
    assert_eq!(n.map(|n| n.kind), Some(NotifyKind::Alert));

    // Clears and re-breaches within the cooldown window: the recovery is
    // immediate, the fresh alert is not.
    let n = m.observe(&candidate("memory", false), at(10));
    assert_eq!(n.map(|n| n.kind), Some(NotifyKind::Recovery));
    assert!(m.observe(&candidate("memory", true), at(20)).is_none());
    assert_eq!(m.status("memory"), Some(AlertStatus::Alerting));

    // The withheld alert surfaces as a reminder once the window closes,
    // measured from the recovery notification.
    let n = m.observe(&candidate("memory", true), at(310));
    assert_eq!(n.map(|n| n.kind), Some(NotifyKind::Alert));
}

#[test]
fn restored_state_honors_cooldown_across_restart() {
    // Simulates a restart: the persisted record says we alerted at t=0,
    // the new process sees the breach continuing at t=100.
    let mut restored = BTreeMap::new();
    restored.insert(
        "memory".to_string(),
        crate::state::AlertState {
            status: AlertStatus::Alerting,
            last_notified_at: Some(at(0)),
            last_value: Some(MetricValue::Gauge(95.0)),
        },
    );
    let mut m = AlertStateMachine::new(StdDuration::from_secs(300), true, restored);

    assert!(m.observe(&candidate("memory", true), at(100)).is_none());
    let n = m.observe(&candidate("memory", true), at(301));
    assert_eq!(n.map(|n| n.kind), Some(NotifyKind::Alert));
}

#[test]
fn states_are_created_lazily_and_tracked_per_key() {
    let mut m = machine(300, true);
    assert_eq!(m.status("memory"), None);

    m.observe(&candidate("memory", true), at(0));
    m.observe(&candidate("swap", false), at(0));

    assert_eq!(m.status("memory"), Some(AlertStatus::Alerting));
    assert_eq!(m.status("swap"), Some(AlertStatus::Ok));

    let snapshot = m.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert!(snapshot["memory"].last_notified_at.is_some());
    // Never notified for swap, so the timestamp stays empty.
    assert!(snapshot["swap"].last_notified_at.is_none());
}

#[test]
fn dirty_flag_set_by_observation_and_cleared_on_take() {
    let mut m = machine(300, true);
    assert!(!m.take_dirty());

    m.observe(&candidate("memory", false), at(0));
    assert!(m.take_dirty());
    assert!(!m.take_dirty());
}

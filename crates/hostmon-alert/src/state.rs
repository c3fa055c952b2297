use crate::evaluator::AlertCandidate;
use crate::rule::AlertCondition;
use chrono::{DateTime, Duration, Utc};
use hostmon_common::types::{MetricValue, Unit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle status of one alert key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Ok,
    Alerting,
}

/// Which notification this tick's decision asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyKind {
    Alert,
    Recovery,
}

/// Per-key alert state, persisted between runs so cooldown and
/// already-notified status survive a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertState {
    pub status: AlertStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_notified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_value: Option<MetricValue>,
}

impl Default for AlertState {
    fn default() -> Self {
        Self {
            status: AlertStatus::Ok,
            last_notified_at: None,
            last_value: None,
        }
    }
}

/// A notification the state machine decided to emit this tick.
#[derive(Debug, Clone)]
pub struct AlertNotification {
    pub kind: NotifyKind,
    pub key: String,
    pub label: String,
    pub value: MetricValue,
    pub unit: Unit,
    pub condition: AlertCondition,
    pub at: DateTime<Utc>,
}

/// The transition decision for one key on one tick.
///
/// Deterministic pure function of its arguments. The cooldown, measured
/// from `last_notified_at`, gates every alert notification — the first
/// breach, reminders while ALERTING, and a re-breach shortly after a
/// recovery — so no two alerts for a key are ever emitted closer than the
/// cooldown. The recovery notification is never gated: a condition that
/// clears is always reported immediately.
pub fn decide(
    status: AlertStatus,
    breached: bool,
    now: DateTime<Utc>,
    cooldown: Duration,
    last_notified_at: Option<DateTime<Utc>>,
) -> (AlertStatus, Option<NotifyKind>) {
    match (status, breached) {
        (AlertStatus::Ok, false) => (AlertStatus::Ok, None),
        (AlertStatus::Alerting, false) => (AlertStatus::Ok, Some(NotifyKind::Recovery)),
        (_, true) => {
            let elapsed = last_notified_at.map_or(true, |t| now - t >= cooldown);
            if elapsed {
                (AlertStatus::Alerting, Some(NotifyKind::Alert))
            } else {
                (AlertStatus::Alerting, None)
            }
        }
    }
}

/// Owns the per-key alert lifecycle.
///
/// States are created lazily on the first evaluation of a key and never
/// evicted. The machine is the only writer of this map; the control loop
/// snapshots it into the state store after each tick that changed it.
pub struct AlertStateMachine {
    cooldown: Duration,
    send_recovery: bool,
    states: BTreeMap<String, AlertState>,
    dirty: bool,
}

impl AlertStateMachine {
    pub fn new(
        cooldown: std::time::Duration,
        send_recovery: bool,
        restored: BTreeMap<String, AlertState>,
    ) -> Self {
        Self {
            cooldown: Duration::from_std(cooldown).unwrap_or(Duration::zero()),
            send_recovery,
            states: restored,
            dirty: false,
        }
    }

    /// Feed one tick's candidate for a key through the transition table.
    ///
    /// `last_notified_at` advances only when a notification is emitted —
    /// the attempt counts as notified even if delivery later fails, which
    /// is what bounds notification storms against a broken endpoint.
    pub fn observe(&mut self, candidate: &AlertCandidate, now: DateTime<Utc>) -> Option<AlertNotification> {
        let state = self.states.entry(candidate.key.clone()).or_default();

        let (next, mut kind) = decide(
            state.status,
            candidate.breached,
            now,
            self.cooldown,
            state.last_notified_at,
        );

        if kind == Some(NotifyKind::Recovery) && !self.send_recovery {
            // The transition to OK still happens; only the message is
            // withheld, and last_notified_at stays untouched.
            kind = None;
        }

        if next != state.status {
            tracing::info!(key = %candidate.key, from = ?state.status, to = ?next, "alert state transition");
        } else if candidate.breached && kind.is_none() {
            tracing::debug!(key = %candidate.key, "alert suppressed (cooldown)");
        }

        state.status = next;
        if kind.is_some() {
            state.last_notified_at = Some(now);
        }
        state.last_value = Some(candidate.value.clone());
        self.dirty = true;

        kind.map(|kind| AlertNotification {
            kind,
            key: candidate.key.clone(),
            label: candidate.label.clone(),
            value: candidate.value.clone(),
            unit: candidate.unit,
            condition: candidate.condition.clone(),
            at: now,
        })
    }

    pub fn status(&self, key: &str) -> Option<AlertStatus> {
        self.states.get(key).map(|s| s.status)
    }

    /// Snapshot of all per-key states for persistence.
    pub fn snapshot(&self) -> BTreeMap<String, AlertState> {
        self.states.clone()
    }

    /// True when any state mutated since the last call; resets the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

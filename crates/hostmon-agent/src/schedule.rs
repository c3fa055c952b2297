//! The cron-driven report gate.
//!
//! Independent of alert state: each tick the gate answers whether a
//! full-status digest is due, based on the parsed schedule and the
//! persisted `last_fired_at` instant.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use cron::Schedule;
use std::str::FromStr;

/// Decides when the scheduled full-status report fires.
///
/// A slot is due when a schedule instant exists strictly after
/// `last_fired_at` and at or before `now`. Firing records `now`, so a
/// backlog of slots missed while the process was down collapses to a
/// single fire, and a slot already recorded as fired is never re-fired
/// after a restart.
pub struct ReportGate {
    schedule: Schedule,
    last_fired_at: DateTime<Utc>,
    dirty: bool,
}

impl ReportGate {
    /// Parse and validate a schedule expression.
    ///
    /// Standard five-field cron (minute, hour, day-of-month, month,
    /// day-of-week) is accepted and normalized by prepending a zero
    /// seconds field; six- and seven-field expressions pass through.
    pub fn parse(expr: &str) -> Result<Schedule> {
        let normalized = if expr.split_whitespace().count() == 5 {
            format!("0 {expr}")
        } else {
            expr.to_string()
        };
        Schedule::from_str(&normalized).with_context(|| format!("invalid cron expression '{expr}'"))
    }

    /// Build the gate from the configured expression and the restored
    /// schedule state. When no state was ever persisted, `last_fired_at`
    /// seeds to `now`: a fresh install reports at the next scheduled slot
    /// rather than immediately.
    pub fn new(expr: &str, restored: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Result<Self> {
        let schedule = Self::parse(expr)?;
        Ok(Self {
            schedule,
            last_fired_at: restored.unwrap_or(now),
            dirty: restored.is_none(),
        })
    }

    /// Whether the report is due this tick; records the fire when it is.
    pub fn check(&mut self, now: DateTime<Utc>) -> bool {
        let due = self
            .schedule
            .after(&self.last_fired_at)
            .next()
            .is_some_and(|instant| instant <= now);
        if due {
            self.last_fired_at = now;
            self.dirty = true;
        }
        due
    }

    pub fn last_fired_at(&self) -> DateTime<Utc> {
        self.last_fired_at
    }

    /// True when `last_fired_at` changed since the last call; resets the
    /// flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const DAILY_AT_NINE: &str = "0 9 * * *";

    fn instant(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, hour, minute, 0).unwrap()
    }

    #[test]
    fn five_field_expressions_are_accepted() {
        assert!(ReportGate::parse("0 9 * * *").is_ok());
        assert!(ReportGate::parse("*/15 * * * *").is_ok());
    }

    #[test]
    fn six_field_expressions_pass_through() {
        assert!(ReportGate::parse("0 0 9 * * *").is_ok());
    }

    #[test]
    fn invalid_expressions_are_rejected() {
        assert!(ReportGate::parse("not a schedule").is_err());
        assert!(ReportGate::parse("99 * * * *").is_err());
    }

    #[test]
    fn fires_when_a_slot_passed_since_last_fire() {
        // Last fired yesterday after the slot; today's 09:00 has passed.
        let mut gate =
            ReportGate::new(DAILY_AT_NINE, Some(instant(1, 9, 0)), instant(2, 9, 5)).unwrap();
        assert!(gate.check(instant(2, 9, 5)));
        assert_eq!(gate.last_fired_at(), instant(2, 9, 5));

        // Same slot must not fire twice.
        assert!(!gate.check(instant(2, 9, 20)));
    }

    #[test]
    fn does_not_fire_before_the_slot() {
        let mut gate =
            ReportGate::new(DAILY_AT_NINE, Some(instant(1, 9, 0)), instant(2, 8, 0)).unwrap();
        assert!(!gate.check(instant(2, 8, 0)));
        assert!(!gate.check(instant(2, 8, 59)));
        assert!(gate.check(instant(2, 9, 0)));
    }

    #[test]
    fn restart_within_a_fired_slot_does_not_refire() {
        // The persisted last_fired_at equals the most recent due slot:
        // a restart moments later must not fire again.
        let mut gate =
            ReportGate::new(DAILY_AT_NINE, Some(instant(2, 9, 0)), instant(2, 9, 1)).unwrap();
        assert!(!gate.check(instant(2, 9, 1)));
    }

    #[test]
    fn missed_slots_collapse_to_one_fire() {
        // Process was down for three days: exactly one report, not three.
        let mut gate =
            ReportGate::new(DAILY_AT_NINE, Some(instant(1, 9, 0)), instant(4, 12, 0)).unwrap();
        assert!(gate.check(instant(4, 12, 0)));
        assert!(!gate.check(instant(4, 12, 15)));
        // The next fire is the following day's slot.
        assert!(gate.check(instant(5, 9, 0)));
    }

    #[test]
    fn fresh_state_waits_for_the_next_slot() {
        // No persisted state: seeded at process start, so nothing fires
        // until the next scheduled instant.
        let mut gate = ReportGate::new(DAILY_AT_NINE, None, instant(2, 12, 0)).unwrap();
        assert!(!gate.check(instant(2, 12, 0)));
        assert!(!gate.check(instant(2, 23, 45)));
        assert!(gate.check(instant(3, 9, 0)));
    }

    #[test]
    fn dirty_tracks_fires_and_seeding() {
        let mut gate = ReportGate::new(DAILY_AT_NINE, None, instant(2, 12, 0)).unwrap();
        // Seeding itself is a state change worth persisting.
        assert!(gate.take_dirty());
        assert!(!gate.take_dirty());

        assert!(gate.check(instant(3, 9, 0)));
        assert!(gate.take_dirty());
    }
}

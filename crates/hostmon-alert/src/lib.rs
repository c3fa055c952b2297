//! Threshold evaluation and the per-key alert state machine.
//!
//! [`evaluator::evaluate`] maps one reading plus its configured rule to a
//! breach/no-breach verdict; [`state::AlertStateMachine`] owns the
//! OK/ALERTING lifecycle per alert key, enforcing the notification
//! cooldown and deciding whether the current tick should emit an alert,
//! a reminder, or a recovery.

pub mod evaluator;
pub mod rule;
pub mod state;

#[cfg(test)]
mod tests;

pub use evaluator::{evaluate, AlertCandidate};
pub use rule::{AlertCondition, AlertRule};
pub use state::{AlertNotification, AlertState, AlertStateMachine, AlertStatus, NotifyKind};

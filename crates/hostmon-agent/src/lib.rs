//! The hostmon agent binary's building blocks: configuration, rule
//! construction, the cron report gate, and the control loop.

pub mod app;
pub mod config;
pub mod rules;
pub mod schedule;

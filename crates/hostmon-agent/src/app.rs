//! The agent's control loop.
//!
//! One tokio task drives the tick cadence. Each tick, in fixed order:
//! sample every collector sequentially, evaluate every rule, feed the
//! candidates through the alert state machine, ask the report gate, send
//! the outbound messages, and persist state. Every runtime failure inside
//! a tick is isolated to its step; only startup errors are fatal.

use crate::config::Config;
use crate::rules::build_rules;
use crate::schedule::ReportGate;
use anyhow::Result;
use chrono::{DateTime, Utc};
use hostmon_alert::{evaluate, AlertRule, AlertStateMachine, NotifyKind};
use hostmon_collector::container::{ContainerCollector, ContainerOptions, ContainerTarget};
use hostmon_collector::network::{NetworkCollector, NetworkOptions};
use hostmon_collector::resource::{ResourceCollector, ResourceOptions};
use hostmon_collector::Collector;
use hostmon_common::types::MetricReading;
use hostmon_notify::{message, DisabledNotifier, Notifier};
use hostmon_notify::wecom::WeComChannel;
use hostmon_storage::{ScheduleState, StateDocument, StateStore, REPORT_SCHEDULE_ID};
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};

pub struct Agent {
    hostname: String,
    check_interval: Duration,
    collectors: Vec<Box<dyn Collector>>,
    rules: Vec<AlertRule>,
    machine: AlertStateMachine,
    gate: Option<ReportGate>,
    notifier: Box<dyn Notifier>,
    store: StateStore,
    /// Set when in-memory state is ahead of the file; a failed save is
    /// retried on the next tick.
    persist_pending: bool,
}

impl Agent {
    /// Wire up every component from the validated configuration and the
    /// restored state document.
    pub async fn from_config(config: Config) -> Result<Self> {
        let hostname = config.hostname();
        let store = StateStore::new(&config.general.state_file);
        let document = store.load();
        let now = Utc::now();

        let machine = AlertStateMachine::new(
            Duration::from_secs(config.general.alert_cooldown_secs),
            config.general.send_recovery,
            document.alerts,
        );

        let gate = if config.report.enabled {
            let restored = document
                .schedules
                .get(REPORT_SCHEDULE_ID)
                .map(|s| s.last_fired_at);
            Some(ReportGate::new(&config.report.cron, restored, now)?)
        } else {
            None
        };

        // Fixed, configuration-independent collector order.
        let mut collectors: Vec<Box<dyn Collector>> = Vec::new();
        collectors.push(Box::new(ResourceCollector::new(ResourceOptions {
            memory: config.system.memory.enabled,
            swap: config.system.swap.enabled,
            cpu: config.system.cpu.enabled,
            cpu_sample_window: Duration::from_secs(config.system.cpu.sample_interval_secs),
            disk_paths: if config.system.disk.enabled {
                config.system.disk.paths.clone()
            } else {
                Vec::new()
            },
        })));
        collectors.push(Box::new(NetworkCollector::new(NetworkOptions {
            traffic: config.network.traffic.enabled,
            connections: config.network.connections.enabled,
        })));
        if config.docker.enabled && !config.docker.containers.is_empty() {
            collectors.push(Box::new(
                ContainerCollector::connect(ContainerOptions {
                    socket: config.docker.socket.clone(),
                    timeout_secs: config.docker.timeout_secs,
                    targets: config
                        .docker
                        .containers
                        .iter()
                        .map(|c| ContainerTarget {
                            name: c.name.clone(),
                            check_health: c.check_health,
                        })
                        .collect(),
                })
                .await,
            ));
        }

        let notifier: Box<dyn Notifier> = if config.notify.webhook_url.is_empty() {
            Box::new(DisabledNotifier)
        } else {
            Box::new(WeComChannel::new(
                &config.notify.webhook_url,
                Duration::from_secs(config.notify.timeout_secs),
            )?)
        };

        Ok(Self::new(
            hostname,
            Duration::from_secs(config.general.check_interval_secs),
            collectors,
            build_rules(&config),
            machine,
            gate,
            notifier,
            store,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        hostname: String,
        check_interval: Duration,
        collectors: Vec<Box<dyn Collector>>,
        rules: Vec<AlertRule>,
        machine: AlertStateMachine,
        gate: Option<ReportGate>,
        notifier: Box<dyn Notifier>,
        store: StateStore,
    ) -> Self {
        Self {
            hostname,
            check_interval,
            collectors,
            rules,
            machine,
            gate,
            notifier,
            store,
            persist_pending: false,
        }
    }

    /// Run ticks until a termination signal arrives. The signal is
    /// honored at the select boundary: a tick already in flight finishes,
    /// no new tick starts.
    pub async fn run(&mut self) -> Result<()> {
        let mut term = signal(SignalKind::terminate())?;
        let mut tick = tokio::time::interval(self.check_interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::info!(
            host = %self.hostname,
            interval_secs = self.check_interval.as_secs(),
            rules = self.rules.len(),
            "agent started"
        );

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.run_tick(Utc::now()).await;
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("interrupt received, stopping");
                    break;
                }
                _ = term.recv() => {
                    tracing::info!("termination signal received, stopping");
                    break;
                }
            }
        }

        tracing::info!("agent stopped");
        Ok(())
    }

    /// One pass of the sampling-evaluate-notify sequence.
    pub async fn run_tick(&mut self, now: DateTime<Utc>) {
        tracing::debug!("tick started");
        let readings = self.sample_all().await;

        let mut outbound = Vec::new();
        for rule in &self.rules {
            let Some(reading) = readings.iter().find(|r| r.key == rule.key) else {
                continue;
            };
            let candidate = evaluate(reading, rule);
            if !candidate.available {
                // Absence of data neither breaches nor recovers: the
                // key's alert state is held as-is for this tick.
                tracing::debug!(key = %candidate.key, "reading unavailable, alert state held");
                continue;
            }
            if let Some(notification) = self.machine.observe(&candidate, now) {
                outbound.push(match notification.kind {
                    NotifyKind::Alert => message::render_alert(&self.hostname, &notification),
                    NotifyKind::Recovery => message::render_recovery(&self.hostname, &notification),
                });
            }
        }

        let report_due = self.gate.as_mut().is_some_and(|gate| gate.check(now));
        if report_due {
            tracing::info!("scheduled report due");
            let snapshot = self.sample_all().await;
            outbound.push(message::render_digest(&self.hostname, &snapshot, now));
        }

        for text in &outbound {
            if let Err(e) = self.notifier.send(text).await {
                tracing::warn!(
                    channel = self.notifier.name(),
                    error = %e,
                    "notification delivery failed, message dropped"
                );
            }
        }

        self.persist();
        tracing::debug!(messages = outbound.len(), "tick finished");
    }

    async fn sample_all(&mut self) -> Vec<MetricReading> {
        let mut readings = Vec::new();
        for collector in &mut self.collectors {
            let sampled = collector.sample().await;
            tracing::debug!(collector = collector.name(), count = sampled.len(), "sampled");
            readings.extend(sampled);
        }
        readings
    }

    fn persist(&mut self) {
        let machine_dirty = self.machine.take_dirty();
        let gate_dirty = self.gate.as_mut().is_some_and(|g| g.take_dirty());
        if machine_dirty || gate_dirty {
            self.persist_pending = true;
        }
        if !self.persist_pending {
            return;
        }

        let mut document = StateDocument {
            alerts: self.machine.snapshot(),
            ..Default::default()
        };
        if let Some(gate) = &self.gate {
            document.schedules.insert(
                REPORT_SCHEDULE_ID.to_string(),
                ScheduleState {
                    last_fired_at: gate.last_fired_at(),
                },
            );
        }

        match self.store.save(&document) {
            Ok(()) => {
                self.persist_pending = false;
            }
            Err(e) => {
                // In-memory state stays authoritative; retried next tick.
                tracing::warn!(error = %e, "state persist failed");
            }
        }
    }
}

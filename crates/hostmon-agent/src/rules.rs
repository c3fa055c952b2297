//! Builds the alert rule set from the validated configuration.
//!
//! Rule order is fixed and configuration-independent (system, network,
//! containers), so two ticks with identical inputs evaluate keys in the
//! same order and produce identical message ordering.

use crate::config::Config;
use hostmon_alert::{AlertCondition, AlertRule};
use hostmon_common::keys;
use hostmon_common::types::{ContainerHealth, ContainerState};

pub fn build_rules(config: &Config) -> Vec<AlertRule> {
    let mut rules = Vec::new();

    if config.system.memory.enabled {
        rules.push(AlertRule {
            key: keys::MEMORY.to_string(),
            label: "Memory usage".to_string(),
            condition: AlertCondition::AtLeast(config.system.memory.threshold),
        });
    }
    if config.system.swap.enabled {
        rules.push(AlertRule {
            key: keys::SWAP.to_string(),
            label: "Swap usage".to_string(),
            condition: AlertCondition::AtLeast(config.system.swap.threshold),
        });
    }
    if config.system.cpu.enabled {
        rules.push(AlertRule {
            key: keys::CPU.to_string(),
            label: "CPU usage".to_string(),
            condition: AlertCondition::AtLeast(config.system.cpu.threshold),
        });
    }
    if config.system.disk.enabled {
        for path in &config.system.disk.paths {
            rules.push(AlertRule {
                key: keys::disk(path),
                label: format!("Disk usage ({path})"),
                condition: AlertCondition::AtLeast(config.system.disk.threshold),
            });
        }
    }

    if config.network.traffic.enabled {
        rules.push(AlertRule {
            key: keys::NET_IN.to_string(),
            label: "Inbound traffic".to_string(),
            condition: AlertCondition::AtLeast(config.network.traffic.threshold_mbps),
        });
        rules.push(AlertRule {
            key: keys::NET_OUT.to_string(),
            label: "Outbound traffic".to_string(),
            condition: AlertCondition::AtLeast(config.network.traffic.threshold_mbps),
        });
    }
    if config.network.connections.enabled {
        rules.push(AlertRule {
            key: keys::NET_CONNS.to_string(),
            label: "Network connections".to_string(),
            condition: AlertCondition::AtLeast(config.network.connections.threshold as f64),
        });
    }

    if config.docker.enabled {
        for container in &config.docker.containers {
            rules.push(AlertRule {
                key: keys::container_status(&container.name),
                label: format!("Container {} status", container.name),
                condition: AlertCondition::NotState(ContainerState::Running.as_str().to_string()),
            });
            if container.check_health {
                rules.push(AlertRule {
                    key: keys::container_health(&container.name),
                    label: format!("Container {} health", container.name),
                    condition: AlertCondition::NotState(
                        ContainerHealth::Healthy.as_str().to_string(),
                    ),
                });
            }
        }
    }

    rules
}

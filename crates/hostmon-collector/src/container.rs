use crate::Collector;
use async_trait::async_trait;
use bollard::container::InspectContainerOptions;
use bollard::errors::Error as DockerError;
use bollard::models::{ContainerStateStatusEnum, HealthStatusEnum};
use bollard::Docker;
use chrono::Utc;
use hostmon_common::keys;
use hostmon_common::types::{ContainerHealth, ContainerState, MetricReading, Unit};

/// One container to watch.
#[derive(Debug, Clone)]
pub struct ContainerTarget {
    pub name: String,
    pub check_health: bool,
}

/// Container runtime connection settings.
#[derive(Debug, Clone)]
pub struct ContainerOptions {
    /// Docker daemon unix socket path.
    pub socket: String,
    /// Per-request timeout in seconds for runtime queries.
    pub timeout_secs: u64,
    pub targets: Vec<ContainerTarget>,
}

/// Samples status and health of the configured containers.
///
/// Runtime availability is negotiated once at construction: when the
/// daemon cannot be reached the collector still exists and emits
/// well-formed unavailable readings for every target each tick, so the
/// control loop never special-cases an absent runtime.
pub struct ContainerCollector {
    targets: Vec<ContainerTarget>,
    docker: Option<Docker>,
}

impl ContainerCollector {
    pub async fn connect(options: ContainerOptions) -> Self {
        let docker = match Docker::connect_with_socket(
            &options.socket,
            options.timeout_secs,
            bollard::API_DEFAULT_VERSION,
        ) {
            Ok(docker) => match docker.ping().await {
                Ok(_) => {
                    tracing::info!(socket = %options.socket, "container runtime connected");
                    Some(docker)
                }
                Err(e) => {
                    tracing::warn!(socket = %options.socket, error = %e, "container runtime unreachable, container checks degraded");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(socket = %options.socket, error = %e, "container runtime client unavailable, container checks degraded");
                None
            }
        };

        Self {
            targets: options.targets,
            docker,
        }
    }

    fn unavailable_readings(&self, target: &ContainerTarget) -> Vec<MetricReading> {
        let now = Utc::now();
        let mut readings = vec![MetricReading::unavailable(
            keys::container_status(&target.name),
            format!("Container {} status", target.name),
            Unit::None,
            now,
        )];
        if target.check_health {
            readings.push(MetricReading::unavailable(
                keys::container_health(&target.name),
                format!("Container {} health", target.name),
                Unit::None,
                now,
            ));
        }
        readings
    }

    async fn sample_target(&self, docker: &Docker, target: &ContainerTarget) -> Vec<MetricReading> {
        let inspected = docker
            .inspect_container(&target.name, None::<InspectContainerOptions>)
            .await;
        let now = Utc::now();

        let state = match inspected {
            Ok(info) => info.state,
            Err(DockerError::DockerResponseServerError { status_code: 404, .. }) => {
                // A container the runtime does not know is an alertable
                // condition, not missing data.
                return vec![MetricReading::state(
                    keys::container_status(&target.name),
                    format!("Container {} status", target.name),
                    ContainerState::Unknown.as_str(),
                    now,
                )];
            }
            Err(e) => {
                tracing::warn!(container = %target.name, error = %e, "container inspect failed");
                return self.unavailable_readings(target);
            }
        };

        let status = match state.as_ref().and_then(|s| s.status) {
            Some(ContainerStateStatusEnum::RUNNING) => ContainerState::Running,
            Some(ContainerStateStatusEnum::EXITED) => ContainerState::Exited,
            Some(ContainerStateStatusEnum::PAUSED) => ContainerState::Paused,
            _ => ContainerState::Unknown,
        };

        let mut readings = vec![MetricReading::state(
            keys::container_status(&target.name),
            format!("Container {} status", target.name),
            status.as_str(),
            now,
        )];

        if target.check_health {
            let label = format!("Container {} health", target.name);
            let key = keys::container_health(&target.name);
            let health = state
                .as_ref()
                .and_then(|s| s.health.as_ref())
                .and_then(|h| h.status);
            match health {
                Some(HealthStatusEnum::HEALTHY) => {
                    readings.push(MetricReading::state(key, label, ContainerHealth::Healthy.as_str(), now));
                }
                Some(HealthStatusEnum::UNHEALTHY) => {
                    readings.push(MetricReading::state(key, label, ContainerHealth::Unhealthy.as_str(), now));
                }
                // No health check configured, or no verdict yet: absence
                // of data must not breach (or recover) the health rule.
                _ => readings.push(MetricReading::unavailable(key, label, Unit::None, now)),
            }
        }

        readings
    }
}

#[async_trait]
impl Collector for ContainerCollector {
    fn name(&self) -> &str {
        "container"
    }

    async fn sample(&mut self) -> Vec<MetricReading> {
        let mut readings = Vec::new();
        match &self.docker {
            Some(docker) => {
                for target in &self.targets {
                    readings.extend(self.sample_target(docker, target).await);
                }
            }
            None => {
                for target in &self.targets {
                    readings.extend(self.unavailable_readings(target));
                }
            }
        }
        readings
    }
}

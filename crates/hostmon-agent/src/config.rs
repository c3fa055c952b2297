//! Agent configuration: the TOML document, per-field defaults, and
//! fail-fast validation.
//!
//! Everything downstream of [`Config::load`] receives an already-validated
//! structure; a malformed file, a zero check interval, or an unparsable
//! report schedule stops the process before the loop starts.

use crate::schedule::ReportGate;
use anyhow::{bail, Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub docker: DockerConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Host identifier used in notifications; defaults to the system
    /// hostname when empty.
    #[serde(default)]
    pub hostname: String,
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
    #[serde(default = "default_alert_cooldown")]
    pub alert_cooldown_secs: u64,
    #[serde(default = "default_true")]
    pub send_recovery: bool,
    #[serde(default = "default_state_file")]
    pub state_file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// WeCom robot webhook URL; notifications are disabled when empty.
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default = "default_notify_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemConfig {
    #[serde(default)]
    pub memory: GaugeRuleConfig,
    #[serde(default)]
    pub swap: GaugeRuleConfig,
    #[serde(default)]
    pub cpu: CpuRuleConfig,
    #[serde(default)]
    pub disk: DiskRuleConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GaugeRuleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CpuRuleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Length of the blocking CPU sampling window.
    #[serde(default = "default_cpu_sample_interval")]
    pub sample_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiskRuleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_disk_paths")]
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub traffic: TrafficRuleConfig,
    #[serde(default)]
    pub connections: ConnectionsRuleConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrafficRuleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Applies to inbound and outbound rates alike.
    #[serde(default = "default_traffic_threshold")]
    pub threshold_mbps: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionsRuleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_connections_threshold")]
    pub threshold: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DockerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_docker_socket")]
    pub socket: String,
    #[serde(default = "default_docker_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub containers: Vec<ContainerEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContainerEntry {
    pub name: String,
    #[serde(default)]
    pub check_health: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_report_cron")]
    pub cron: String,
}

fn default_true() -> bool {
    true
}

fn default_check_interval() -> u64 {
    900
}

fn default_alert_cooldown() -> u64 {
    300
}

fn default_state_file() -> String {
    "hostmon-state.json".to_string()
}

fn default_notify_timeout() -> u64 {
    10
}

fn default_threshold() -> f64 {
    80.0
}

fn default_cpu_sample_interval() -> u64 {
    1
}

fn default_disk_paths() -> Vec<String> {
    vec!["/".to_string()]
}

fn default_traffic_threshold() -> f64 {
    100.0
}

fn default_connections_threshold() -> u64 {
    1000
}

fn default_docker_socket() -> String {
    "/var/run/docker.sock".to_string()
}

fn default_docker_timeout() -> u64 {
    5
}

fn default_report_cron() -> String {
    "0 9 * * *".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            check_interval_secs: default_check_interval(),
            alert_cooldown_secs: default_alert_cooldown(),
            send_recovery: true,
            state_file: default_state_file(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            timeout_secs: default_notify_timeout(),
        }
    }
}

impl Default for GaugeRuleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: default_threshold(),
        }
    }
}

impl Default for CpuRuleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: default_threshold(),
            sample_interval_secs: default_cpu_sample_interval(),
        }
    }
}

impl Default for DiskRuleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: default_threshold(),
            paths: default_disk_paths(),
        }
    }
}

impl Default for TrafficRuleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_mbps: default_traffic_threshold(),
        }
    }
}

impl Default for ConnectionsRuleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: default_connections_threshold(),
        }
    }
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            socket: default_docker_socket(),
            timeout_secs: default_docker_timeout(),
            containers: Vec::new(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cron: default_report_cron(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read configuration file {path}"))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("malformed configuration in {path}"))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.general.check_interval_secs == 0 {
            bail!("general.check_interval_secs must be at least 1");
        }
        if self.report.enabled {
            ReportGate::parse(&self.report.cron)?;
        }
        if self.notify.webhook_url.is_empty() {
            tracing::warn!("notify.webhook_url is not configured, notifications will be dropped");
        }
        Ok(())
    }

    /// Host identifier for outbound messages: the configured name, or the
    /// system hostname when unset.
    pub fn hostname(&self) -> String {
        if !self.general.hostname.is_empty() {
            return self.general.hostname.clone();
        }
        sysinfo::System::host_name().unwrap_or_else(|| "unknown-host".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.general.check_interval_secs, 900);
        assert_eq!(config.general.alert_cooldown_secs, 300);
        assert!(config.general.send_recovery);
        assert_eq!(config.system.memory.threshold, 80.0);
        assert_eq!(config.system.disk.paths, vec!["/".to_string()]);
        assert_eq!(config.network.traffic.threshold_mbps, 100.0);
        assert_eq!(config.network.connections.threshold, 1000);
        assert_eq!(config.docker.socket, "/var/run/docker.sock");
        assert!(config.report.enabled);
        assert_eq!(config.report.cron, "0 9 * * *");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_unmentioned_defaults() {
        let config: Config = toml::from_str(
            r#"
            [general]
            check_interval_secs = 60

            [system.memory]
            threshold = 90.5

            [[docker.containers]]
            name = "nginx"
            check_health = true
            "#,
        )
        .unwrap();
        assert_eq!(config.general.check_interval_secs, 60);
        assert_eq!(config.general.alert_cooldown_secs, 300);
        assert_eq!(config.system.memory.threshold, 90.5);
        assert!(config.system.memory.enabled);
        assert_eq!(config.docker.containers.len(), 1);
        assert_eq!(config.docker.containers[0].name, "nginx");
        assert!(config.docker.containers[0].check_health);
    }

    #[test]
    fn invalid_report_cron_is_fatal() {
        let config: Config = toml::from_str(
            r#"
            [report]
            enabled = true
            cron = "not a schedule"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_cron_tolerated_when_reporting_disabled() {
        let config: Config = toml::from_str(
            r#"
            [report]
            enabled = false
            cron = "not a schedule"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_check_interval_is_fatal() {
        let config: Config = toml::from_str(
            r#"
            [general]
            check_interval_secs = 0
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}

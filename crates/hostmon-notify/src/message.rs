//! Outbound message rendering.
//!
//! Renders the three message kinds the agent sends: alert, recovery, and
//! the scheduled full-status digest. Layout follows the WeCom text-message
//! blocks the service has always sent.

use chrono::{DateTime, Utc};
use hostmon_alert::{AlertCondition, AlertNotification};
use hostmon_common::keys;
use hostmon_common::types::MetricReading;

const RULE: &str = "━━━━━━━━━━━━━━━━";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn timestamp(at: DateTime<Utc>) -> String {
    at.format(TIME_FORMAT).to_string()
}

/// Render an alert notification.
pub fn render_alert(hostname: &str, n: &AlertNotification) -> String {
    let requirement = match &n.condition {
        AlertCondition::AtLeast(_) => "threshold",
        AlertCondition::NotState(_) => "expected",
    };
    format!(
        "⚠️ Host alert [{host}]\n{RULE}\n📊 {label}: {value} ({requirement}: {limit})\n⏰ Time: {time}",
        host = hostname,
        label = n.label,
        value = hostmon_common::types::format_value(&n.value, n.unit),
        limit = n.condition.display(n.unit),
        time = timestamp(n.at),
    )
}

/// Render a recovery notification.
pub fn render_recovery(hostname: &str, n: &AlertNotification) -> String {
    format!(
        "✅ Host recovery [{host}]\n{RULE}\n📊 {label}: {value} (back to normal)\n⏰ Time: {time}",
        host = hostname,
        label = n.label,
        value = hostmon_common::types::format_value(&n.value, n.unit),
        time = timestamp(n.at),
    )
}

/// Render the scheduled full-status digest from a fresh snapshot of all
/// collector readings.
///
/// Sections are emitted only when the snapshot contains readings for them;
/// unavailable readings print as `n/a` rather than being dropped, so a
/// degraded collector is visible in the report.
pub fn render_digest(hostname: &str, readings: &[MetricReading], at: DateTime<Utc>) -> String {
    let mut lines = vec![format!("📊 Status report [{hostname}]"), RULE.to_string()];

    let mut system = Vec::new();
    if let Some(cpu) = find(readings, keys::CPU) {
        system.push(format!("  • CPU: {}", cpu.display_value()));
    }
    if let Some(mem) = find(readings, keys::MEMORY) {
        let detail = match (
            find(readings, keys::MEMORY_USED_GB),
            find(readings, keys::MEMORY_TOTAL_GB),
        ) {
            (Some(used), Some(total)) if used.available && total.available => {
                format!(" ({} / {})", used.display_value(), total.display_value())
            }
            _ => String::new(),
        };
        system.push(format!("  • Memory: {}{detail}", mem.display_value()));
    }
    if let Some(swap) = find(readings, keys::SWAP) {
        system.push(format!("  • Swap: {}", swap.display_value()));
    }
    for disk in readings
        .iter()
        .filter(|r| r.key.starts_with("disk:") && !r.key.ends_with(":used_gb") && !r.key.ends_with(":total_gb"))
    {
        let path = disk.key.trim_start_matches("disk:");
        let detail = match (
            find(readings, &keys::disk_used_gb(path)),
            find(readings, &keys::disk_total_gb(path)),
        ) {
            (Some(used), Some(total)) if used.available && total.available => {
                format!(" ({} / {})", used.display_value(), total.display_value())
            }
            _ => String::new(),
        };
        system.push(format!("  • Disk ({path}): {}{detail}", disk.display_value()));
    }
    if !system.is_empty() {
        lines.push("🖥️ System".to_string());
        lines.extend(system);
    }

    let mut network = Vec::new();
    if let Some(r) = find(readings, keys::NET_IN) {
        network.push(format!("  • Inbound: {}", r.display_value()));
    }
    if let Some(r) = find(readings, keys::NET_OUT) {
        network.push(format!("  • Outbound: {}", r.display_value()));
    }
    if let Some(r) = find(readings, keys::NET_CONNS) {
        network.push(format!("  • Connections: {}", r.display_value()));
    }
    if !network.is_empty() {
        lines.push(String::new());
        lines.push("🌐 Network".to_string());
        lines.extend(network);
    }

    let mut containers = Vec::new();
    for status in readings
        .iter()
        .filter(|r| r.key.starts_with("container:") && r.key.ends_with(":status"))
    {
        let name = status
            .key
            .trim_start_matches("container:")
            .trim_end_matches(":status");
        let icon = if status.available && status.display_value() == "running" {
            "✅"
        } else {
            "❌"
        };
        let health = find(readings, &keys::container_health(name))
            .filter(|h| h.available)
            .map(|h| format!(" ({})", h.display_value()))
            .unwrap_or_default();
        containers.push(format!("  • {name}: {icon} {}{health}", status.display_value()));
    }
    if !containers.is_empty() {
        lines.push(String::new());
        lines.push("🐳 Containers".to_string());
        lines.extend(containers);
    }

    lines.push(String::new());
    lines.push(format!("⏰ Time: {}", timestamp(at)));
    lines.join("\n")
}

fn find<'a>(readings: &'a [MetricReading], key: &str) -> Option<&'a MetricReading> {
    readings.iter().find(|r| r.key == key)
}

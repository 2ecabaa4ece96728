//! Formatting helpers for command output.

use slimpack_config::Config;

/// Formats a byte count into a human-readable string (e.g., "128.0 MiB").
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;

    if bytes >= GIB {
        format!("{:.1} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Renders a validated config as aligned `key: value` lines.
#[must_use]
pub fn describe_config(package: &str, config: &Config) -> String {
    let ports: Vec<String> = config.ports.iter().map(u16::to_string).collect();
    format!(
        "package: {package}\nenv:     {}\nports:   {}\nfiles:   {}\n",
        list_or_dash(&config.env_names),
        list_or_dash(&ports),
        list_or_dash(&config.files),
    )
}

fn list_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_owned()
    } else {
        items.join(", ")
    }
}

use crate::system::publish::{IconOptions, Unit};
use crate::system::snapshot::Snapshot;

pub fn format_icon(icon: &IconOptions) -> String {
    let label = icon.indicator.label();
    match icon.unit {
        Unit::Percentage => format!("{label} {:.0}%", icon.value),
        Unit::Mbs => format!("{label} {:.1} MB/s", icon.value),
    }
}

/// Menu bar title, e.g. `MEM 45%  CPU 16%  ↓ 1.2 MB/s  ↑ 0.3 MB/s`.
pub fn status_line(icons: &[IconOptions]) -> String {
    if icons.is_empty() {
        return "--".to_string();
    }
    icons
        .iter()
        .map(format_icon)
        .collect::<Vec<_>>()
        .join("  ")
}

pub fn format_megabytes(mb: f64) -> String {
    const GB: f64 = 1024.0;

    if mb >= GB {
        format!("{:.1} GB", mb / GB)
    } else {
        format!("{:.0} MB", mb)
    }
}

/// One-line memory breakdown, or `None` when memory was unavailable.
pub fn memory_detail(snapshot: &Snapshot) -> Option<String> {
    snapshot.memory.map(|m| {
        format!(
            "used {} / free {}",
            format_megabytes(m.used_mb),
            format_megabytes(m.free_mb)
        )
    })
}

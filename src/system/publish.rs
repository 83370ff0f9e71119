//! Outbound interfaces: the stats event and the menu bar icons.

use serde::Serialize;

use super::snapshot::Snapshot;

pub const STATS_UPDATED: &str = "stats-updated";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatsPayload {
    pub results: Vec<Snapshot>,
    /// Milliseconds.
    pub interval: u64,
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: &str, payload: &StatsPayload);
}

pub trait IconRenderer: Send + Sync {
    fn draw_icons(&self, icons: &[IconOptions]);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    Mem,
    Cpu,
    Dow,
    Up,
}

impl Indicator {
    pub fn label(self) -> &'static str {
        match self {
            Indicator::Mem => "MEM",
            Indicator::Cpu => "CPU",
            Indicator::Dow => "\u{2193}",
            Indicator::Up => "\u{2191}",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Percentage,
    Mbs,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct IconOptions {
    pub indicator: Indicator,
    pub value: f64,
    pub unit: Unit,
}

/// Icon entries for the metrics present in `snapshot`, in the order
/// mem, cpu, dow, up. Unavailable metrics get no entry.
pub fn icon_options(snapshot: &Snapshot) -> Vec<IconOptions> {
    let mut icons = Vec::with_capacity(4);
    if let Some(memory) = snapshot.memory {
        icons.push(IconOptions {
            indicator: Indicator::Mem,
            value: f64::from(memory.used_percentage),
            unit: Unit::Percentage,
        });
    }
    if let Some(cpu) = snapshot.cpu {
        icons.push(IconOptions {
            indicator: Indicator::Cpu,
            value: f64::from(cpu.used_percentage),
            unit: Unit::Percentage,
        });
    }
    if let Some(network) = snapshot.network {
        icons.push(IconOptions {
            indicator: Indicator::Dow,
            value: network.download_mbs,
            unit: Unit::Mbs,
        });
        icons.push(IconOptions {
            indicator: Indicator::Up,
            value: network.upload_mbs,
            unit: Unit::Mbs,
        });
    }
    icons
}

use super::snapshot::NetworkStats;

/// Deltas below this many MB/s are reported as zero.
pub const NOISE_FLOOR: f64 = 0.1;

/// Cumulative transfer normalized by the sampling interval, in MB/s.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Throughput {
    pub upload: f64,
    pub download: f64,
}

/// Turns successive cumulative readings into instantaneous rates.
#[derive(Debug, Default)]
pub struct DeltaTracker {
    last: Option<Throughput>,
}

impl DeltaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<Throughput> {
        self.last
    }

    /// Differences `cumulative` against the previous reading and stores it as
    /// the new baseline. The first reading has no baseline and yields zero.
    pub fn observe(&mut self, cumulative: Throughput) -> NetworkStats {
        let stats = match self.last {
            Some(prev) => NetworkStats {
                upload_mbs: settle(cumulative.upload - prev.upload),
                download_mbs: settle(cumulative.download - prev.download),
            },
            None => NetworkStats::default(),
        };
        self.last = Some(cumulative);
        stats
    }

    /// Scales the stored baseline by `factor`, so a reading normalized over
    /// a different interval is compared like for like.
    pub fn rebase(&mut self, factor: f64) {
        if let Some(last) = &mut self.last {
            last.upload *= factor;
            last.download *= factor;
        }
    }
}

pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn settle(delta: f64) -> f64 {
    let rounded = round_to_tenth(delta);
    if rounded < NOISE_FLOOR { 0.0 } else { rounded }
}

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
    pub used_percentage: u32,
    #[serde(rename = "usedMB")]
    pub used_mb: f64,
    #[serde(rename = "freeMB")]
    pub free_mb: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuStats {
    pub used_percentage: u32,
    pub user_percentage: u32,
    pub system_percentage: u32,
    pub idle_percentage: u32,
}

/// Throughput in MB/s, already differenced and floored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct NetworkStats {
    #[serde(rename = "uploadMBs")]
    pub upload_mbs: f64,
    #[serde(rename = "downloadMBs")]
    pub download_mbs: f64,
}

/// Result of one sampling pass. A metric that could not be sampled is `None`
/// and is left out of the serialized form.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Snapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<CpuStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkStats>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.memory.is_none() && self.cpu.is_none() && self.network.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NetworkStats {
    pub packets_sent: u64,
    pub packets_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

/// Counters kept by the replication engine on top of raw transport traffic.
#[derive(Debug, Clone, Default)]
pub struct ReplicationStats {
    pub batches_sent: u64,
    pub actions_sent: u64,
    pub actions_applied: u64,
    pub malformed_dropped: u64,
    /// Action batches that arrived while the local simulation was frozen.
    pub frozen_dropped: u64,
}

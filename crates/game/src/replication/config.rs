use std::time::Duration;

use crate::net::{DEFAULT_NAME, MAX_ACTIONS_PER_PACKET};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub name: String,
    pub flush_interval: Duration,
    pub tick_duration: Duration,
    pub max_peers: usize,
    pub hello_interval: Duration,
    /// Start policy: the master refuses to broadcast the rescue signal while
    /// fewer peers than this have joined.
    pub min_peers_to_start: usize,
    pub max_actions_per_packet: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            flush_interval: Duration::from_millis(500),
            tick_duration: Duration::from_micros(16_700),
            max_peers: 8,
            hello_interval: Duration::from_secs(1),
            min_peers_to_start: 0,
            max_actions_per_packet: MAX_ACTIONS_PER_PACKET,
        }
    }
}

impl SessionConfig {
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

use laundry_common::env_or;
use std::time::Duration;

use crate::feed::STDIN_SOURCE;

#[derive(Clone, Debug)]
pub struct DashboardConfig {
    pub port: u16,
    pub keepalive: Duration,
    pub broadcast_capacity: usize,
    pub vendor_event_capacity: usize,
    pub feed_source: String,
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        Self {
            port: env_or("PORT", 5000u16),
            keepalive: Duration::from_secs(env_or("STREAM_KEEPALIVE_SECS", 30u64).max(1)),
            broadcast_capacity: env_or("BROADCAST_CAPACITY", 256usize).max(1),
            vendor_event_capacity: env_or("VENDOR_EVENT_CAPACITY", 64usize).max(1),
            feed_source: env_or("APPLIANCE_FEED", STDIN_SOURCE.to_string()),
        }
    }
}

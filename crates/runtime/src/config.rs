//! Runtime configuration loaded from the process environment.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Session server configuration shared by the worker and the TCP gateway.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: SocketAddr,
    /// Idle time after which a regular room is swept.
    pub room_ttl: Duration,
    /// Idle time after which an invite room is swept.
    pub invite_ttl: Duration,
    pub sweep_interval: Duration,
    pub command_buffer_size: usize,
    pub event_buffer_size: usize,
    /// Directory holding `roster.toml`; the bundled roster is used when unset.
    pub roster_dir: Option<PathBuf>,
}

impl RuntimeConfig {
    pub const DEFAULT_BIND_ADDR: &'static str = "127.0.0.1:7878";
    pub const DEFAULT_ROOM_TTL_SECS: u64 = 30 * 60;
    pub const DEFAULT_INVITE_TTL_SECS: u64 = 24 * 60 * 60;
    pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `COMBAT_BIND_ADDR` - TCP listen address (default: 127.0.0.1:7878)
    /// - `COMBAT_ROOM_TTL_SECS` - Regular room idle TTL (default: 1800)
    /// - `COMBAT_INVITE_TTL_SECS` - Invite room idle TTL (default: 86400)
    /// - `COMBAT_SWEEP_INTERVAL_SECS` - TTL sweep period (default: 60)
    /// - `COMBAT_COMMAND_BUFFER` - Session worker command queue (default: 64)
    /// - `COMBAT_EVENT_BUFFER` - Event bus capacity per topic (default: 100)
    /// - `COMBAT_ROSTER_DIR` - Character roster directory (default: bundled)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(addr) = read_env::<SocketAddr>("COMBAT_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(secs) = read_env::<u64>("COMBAT_ROOM_TTL_SECS") {
            config.room_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = read_env::<u64>("COMBAT_INVITE_TTL_SECS") {
            config.invite_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = read_env::<u64>("COMBAT_SWEEP_INTERVAL_SECS") {
            config.sweep_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(size) = read_env::<usize>("COMBAT_COMMAND_BUFFER") {
            config.command_buffer_size = size.max(1);
        }
        if let Some(size) = read_env::<usize>("COMBAT_EVENT_BUFFER") {
            config.event_buffer_size = size.max(1);
        }
        if let Ok(dir) = env::var("COMBAT_ROSTER_DIR") {
            if !dir.trim().is_empty() {
                config.roster_dir = Some(PathBuf::from(dir));
            }
        }

        config
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 7878)),
            room_ttl: Duration::from_secs(Self::DEFAULT_ROOM_TTL_SECS),
            invite_ttl: Duration::from_secs(Self::DEFAULT_INVITE_TTL_SECS),
            sweep_interval: Duration::from_secs(Self::DEFAULT_SWEEP_INTERVAL_SECS),
            command_buffer_size: 64,
            event_buffer_size: 100,
            roster_dir: None,
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = RuntimeConfig::default();
        assert_eq!(
            config.bind_addr,
            RuntimeConfig::DEFAULT_BIND_ADDR.parse::<SocketAddr>().unwrap()
        );
        assert_eq!(config.room_ttl, Duration::from_secs(1800));
        assert_eq!(config.invite_ttl, Duration::from_secs(86_400));
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert!(config.roster_dir.is_none());
    }
}

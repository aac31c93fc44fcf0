//! Roster application settings
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::config_error;
use crate::error::Result;
use crate::membership::monitor::{DEFAULT_LIVENESS_TIMEOUT_SECS, DEFAULT_MONITOR_INTERVAL_SECS};
use crate::membership::schedule::{DEFAULT_MAX_DELAY_SECS, DEFAULT_MIN_DELAY_SECS};
use crate::membership::RandomSchedule;
use crate::node::NodeId;

pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const STANDARD_COORDINATOR_PORT: u16 = 9876;
pub const DEFAULT_COORDINATOR_ADDRESS: &str = "127.0.0.1:9876";
pub const DEFAULT_NODES_FILE: &str = "nodes.config";

/// Which loops a node runs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Aggregates announcements, monitors liveness, broadcasts snapshots
    Coordinator,
    /// Announces to the coordinator and applies its snapshots
    Client,
    /// Announces to every other node and monitors liveness itself
    Peer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Coordinator => write!(f, "coordinator"),
            Role::Client => write!(f, "client"),
            Role::Peer => write!(f, "peer"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "coordinator" | "server" => Ok(Role::Coordinator),
            "client" => Ok(Role::Client),
            "peer" => Ok(Role::Peer),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    // Loops to run
    pub role: Role,

    // Directory entry this process embodies
    pub node_id: NodeId,

    // Directory file location
    pub nodes_file: PathBuf,

    // IP to bind; the port always comes from the node's directory entry
    pub listen_address: IpAddr,

    // Where client announcements go
    pub coordinator_address: SocketAddr,

    // Announce/broadcast delay bounds, inclusive, in seconds
    pub announce_min_secs: u64,
    pub announce_max_secs: u64,

    // Silence after which a node is marked Offline
    pub liveness_timeout_secs: u64,

    // Liveness monitor cadence
    pub monitor_interval_secs: u64,

    // HTTP status API port; disabled when absent
    pub status_port: Option<u16>,
}

impl Settings {
    /// Defaults for the given role and node
    pub fn new(role: Role, node_id: NodeId) -> Self {
        Self {
            role,
            node_id,
            nodes_file: PathBuf::from(DEFAULT_NODES_FILE),
            listen_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            coordinator_address: SocketAddr::from(([127, 0, 0, 1], STANDARD_COORDINATOR_PORT)),
            announce_min_secs: DEFAULT_MIN_DELAY_SECS,
            announce_max_secs: DEFAULT_MAX_DELAY_SECS,
            liveness_timeout_secs: DEFAULT_LIVENESS_TIMEOUT_SECS,
            monitor_interval_secs: DEFAULT_MONITOR_INTERVAL_SECS,
            status_port: None,
        }
    }

    /// The liveness timeout must leave margin above the longest announce
    /// interval, otherwise healthy nodes flap between Online and Offline.
    pub fn validate(&self) -> Result<()> {
        let schedule = self.announce_schedule()?;
        if self.liveness_timeout() <= schedule.max_delay() {
            return Err(config_error!(
                "Liveness timeout {}s must exceed the maximum announce interval {}s",
                self.liveness_timeout_secs,
                self.announce_max_secs
            ));
        }
        if self.monitor_interval_secs == 0 {
            return Err(config_error!("Monitor interval must be at least 1s"));
        }
        Ok(())
    }

    pub fn announce_schedule(&self) -> Result<RandomSchedule> {
        RandomSchedule::new(self.announce_min_secs, self.announce_max_secs)
    }

    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_secs(self.liveness_timeout_secs)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_interval_secs)
    }

    /// Address to bind for a node registered at `registered`
    pub fn bind_address(&self, registered: SocketAddr) -> SocketAddr {
        SocketAddr::new(self.listen_address, registered.port())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::new(Role::Peer, NodeId::new(1));
        assert!(settings.validate().is_ok());
        assert_eq!(settings.coordinator_address.port(), STANDARD_COORDINATOR_PORT);
        assert_eq!(
            settings.coordinator_address,
            DEFAULT_COORDINATOR_ADDRESS.parse().unwrap()
        );
    }

    #[test]
    fn test_timeout_must_exceed_announce_max() {
        let mut settings = Settings::new(Role::Coordinator, NodeId::new(1));
        settings.liveness_timeout_secs = 30;
        assert!(settings.validate().is_err());

        settings.liveness_timeout_secs = 31;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_inverted_announce_bounds_rejected() {
        let mut settings = Settings::new(Role::Client, NodeId::new(1));
        settings.announce_min_secs = 20;
        settings.announce_max_secs = 10;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_bind_address_uses_registered_port() {
        let settings = Settings::new(Role::Peer, NodeId::new(1));
        let bind = settings.bind_address("192.168.1.20:5002".parse().unwrap());
        assert_eq!(bind, "0.0.0.0:5002".parse().unwrap());
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Coordinator".parse::<Role>().unwrap(), Role::Coordinator);
        assert_eq!("server".parse::<Role>().unwrap(), Role::Coordinator);
        assert_eq!("peer".parse::<Role>().unwrap(), Role::Peer);
        assert!("leader".parse::<Role>().is_err());
        assert_eq!(Role::Client.to_string(), "client");
    }
}

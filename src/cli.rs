//! CLI for this application
//!
use std::io::{BufRead, Write};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::config_error;
use crate::directory::Directory;
use crate::error::Result;
use crate::node::NodeId;
use crate::settings::{self, Role, Settings};

#[derive(Clone, Debug, clap::Parser)]
#[command(name = "roster", version, about = "UDP membership and file-presence announcements")]
pub struct Cli {
    // Role of this process
    #[clap(
        long,
        default_value = "peer",
        env("ROSTER_ROLE"),
        help = "role: 'coordinator', 'client', or 'peer'"
    )]
    pub role: Role,

    // Node identity; prompted for when absent
    #[clap(
        long,
        env("ROSTER_NODE_ID"),
        help = "Directory id this process runs as (prompted for if omitted)"
    )]
    pub node_id: Option<NodeId>,

    // Directory file
    #[clap(
        long,
        default_value = settings::DEFAULT_NODES_FILE,
        env("ROSTER_NODES_FILE"),
        help = "Node directory file: one 'id ip port [files]' entry per line"
    )]
    pub nodes_file: PathBuf,

    // Socket bind address
    #[clap(
        long,
        default_value = "0.0.0.0",
        env("ROSTER_LISTEN_ADDRESS"),
        help = "IP Address to bind; the port comes from the node's directory entry"
    )]
    pub listen_address: IpAddr,

    // Coordinator address for the client role
    #[clap(
        long,
        default_value = settings::DEFAULT_COORDINATOR_ADDRESS,
        env("ROSTER_COORDINATOR_ADDRESS"),
        help = "Coordinator UDP address clients announce to"
    )]
    pub coordinator_address: SocketAddr,

    #[clap(
        long,
        default_value = "1",
        env("ROSTER_ANNOUNCE_MIN_SECS"),
        help = "Shortest delay between announcements, in seconds"
    )]
    pub announce_min_secs: u64,

    #[clap(
        long,
        default_value = "30",
        env("ROSTER_ANNOUNCE_MAX_SECS"),
        help = "Longest delay between announcements, in seconds"
    )]
    pub announce_max_secs: u64,

    #[clap(
        long,
        default_value = "45",
        env("ROSTER_LIVENESS_TIMEOUT_SECS"),
        help = "Seconds of silence before a node is marked Offline"
    )]
    pub liveness_timeout_secs: u64,

    #[clap(
        long,
        default_value = "5",
        env("ROSTER_MONITOR_INTERVAL_SECS"),
        help = "Seconds between liveness checks"
    )]
    pub monitor_interval_secs: u64,

    // HTTP status API
    #[clap(
        long,
        env("ROSTER_STATUS_PORT"),
        help = "Port for the read-only HTTP status API (disabled if omitted)"
    )]
    pub status_port: Option<u16>,
}

impl Cli {
    pub fn into_settings(self, node_id: NodeId) -> Settings {
        Settings {
            role: self.role,
            node_id,
            nodes_file: self.nodes_file,
            listen_address: self.listen_address,
            coordinator_address: self.coordinator_address,
            announce_min_secs: self.announce_min_secs,
            announce_max_secs: self.announce_max_secs,
            liveness_timeout_secs: self.liveness_timeout_secs,
            monitor_interval_secs: self.monitor_interval_secs,
            status_port: self.status_port,
        }
    }
}

/// Ask the operator which node to run as until a known id is entered
pub fn prompt_for_node_id<R, W>(directory: &Directory, mut input: R, mut output: W) -> Result<NodeId>
where
    R: BufRead,
    W: Write,
{
    let known: Vec<String> = directory.ids().iter().map(|id| id.to_string()).collect();
    loop {
        write!(output, "Enter a Node ID ({}): ", known.join(", "))?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(config_error!("No node id given"));
        }
        match line.trim().parse::<NodeId>() {
            Ok(id) if directory.contains(id) => return Ok(id),
            Ok(id) => writeln!(output, "No configuration found for node {}", id)?,
            Err(e) => writeln!(output, "{}", e)?,
        }
    }
}

use crate::directory::Directory;
use crate::node::{MembershipNode, NodeId};
use crate::settings::Role;
use crate::transport::UdpTransport;

/// Read-only view of a running node shared with the HTTP handlers
#[derive(Clone, Debug)]
pub struct AppState {
    pub node_id: NodeId,
    pub role: Role,
    pub directory: Directory,
    pub transport: UdpTransport,
}

impl AppState {
    pub fn from_node(node: &MembershipNode) -> Self {
        Self {
            node_id: node.node_id(),
            role: node.role(),
            directory: node.directory().clone(),
            transport: node.transport().clone(),
        }
    }
}

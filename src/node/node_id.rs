use serde::{Deserialize, Serialize};

/// Identifier of a node in the directory
///
/// Ids are small positive integers assigned by the directory file and stay
/// stable for the lifetime of the process. Zero is reserved.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, PartialOrd, Ord, Eq, Hash,
)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

/// Validate that a node ID is not zero (reserved value)
pub fn validate_node_id(node_id: u32) -> Result<NodeId, String> {
    if node_id == 0 {
        return Err("Node ID cannot be zero (reserved value)".to_string());
    }
    Ok(NodeId(node_id))
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        NodeId(id)
    }
}

impl std::str::FromStr for NodeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("Invalid node id {:?}: {}", s, e))?;
        validate_node_id(id)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

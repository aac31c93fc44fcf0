//! All Paths are recorded here for use throughout this codebase
pub mod base {
    pub const ROOT: &str = "/";
    pub const HEALTH: &str = "/health";
    pub const ABOUT: &str = "/about";
}

pub mod membership {
    pub const NODES: &str = "/nodes";
    pub const NODE: &str = "/nodes/:node_id";
    pub const STATS: &str = "/stats";
}

pub fn node_path(node_id: u32) -> String {
    membership::NODE.replace(":node_id", &node_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_path() {
        assert_eq!(node_path(3), "/nodes/3");
    }
}

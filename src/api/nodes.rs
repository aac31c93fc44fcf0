//! Read-only views of the node directory
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::state::AppState;
use crate::directory::{NodeRecord, NodeStatus};
use crate::error::{Result, RosterError};
use crate::node::NodeId;
use crate::transport::FrozenTransportStats;

#[derive(Debug, Serialize, Deserialize)]
pub struct NodesResponse {
    pub node_id: NodeId,
    pub nodes: Vec<NodeRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub node_id: NodeId,
    pub role: String,
    pub local_address: String,
    pub online: usize,
    pub offline: usize,
    pub transport: FrozenTransportStats,
}

pub async fn list_nodes(State(state): State<AppState>) -> Json<NodesResponse> {
    Json(NodesResponse {
        node_id: state.node_id,
        nodes: state.directory.snapshot(),
    })
}

pub async fn get_node(
    State(state): State<AppState>,
    Path(node_id): Path<u32>,
) -> Result<Json<NodeRecord>> {
    let node_id = NodeId::new(node_id);
    state
        .directory
        .get(node_id)
        .map(Json)
        .ok_or(RosterError::UnknownNode(node_id))
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let records = state.directory.snapshot();
    let online = records
        .iter()
        .filter(|record| record.status == NodeStatus::Online)
        .count();
    Json(StatsResponse {
        node_id: state.node_id,
        role: state.role.to_string(),
        local_address: state.transport.local_addr().to_string(),
        online,
        offline: records.len() - online,
        transport: state.transport.stats(),
    })
}

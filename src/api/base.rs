use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::state::AppState;
use crate::settings::{APP_NAME, APP_VERSION};

pub async fn root() -> &'static str {
    "roster membership node"
}

pub async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AboutResponse {
    pub name: String,
    pub version: String,
    pub node_id: u32,
    pub role: String,
}

#[instrument(skip(state))]
pub async fn about(State(state): State<AppState>) -> axum::Json<AboutResponse> {
    axum::Json(AboutResponse {
        name: APP_NAME.to_string(),
        version: APP_VERSION.to_string(),
        node_id: state.node_id.value(),
        role: state.role.to_string(),
    })
}

//! Online Presence and Workload Stats

use axum::{extract::State, routing::get, Json, Router};
use deskline_storage::Store;
use std::collections::HashMap;

use crate::error::ApiResult;
use crate::state::AppState;
use crate::types::{AgentStatusResponse, Envelope, OnlineStatsResponse};

/// GET /api/v1/stats/online - hub connection count plus per-agent
/// online flags and ongoing-conversation load
pub async fn online_stats(
    State(state): State<AppState>,
) -> ApiResult<Json<Envelope<OnlineStatsResponse>>> {
    let connected_users = state.hub.connected_count().await;
    let agents = state.store.agent_list().await?;

    let agent_ids: Vec<String> = agents.iter().map(|a| a.agent_id.clone()).collect();
    let loads: HashMap<String, usize> = state
        .store
        .conversation_count_ongoing(&agent_ids)
        .await?
        .into_iter()
        .collect();

    let online_agents = agents.iter().filter(|a| a.online).count();
    let rows = agents
        .into_iter()
        .map(|agent| {
            let ongoing = loads.get(&agent.agent_id).copied().unwrap_or(0);
            AgentStatusResponse::from_agent(agent, ongoing)
        })
        .collect();

    Ok(Json(Envelope::ok(OnlineStatsResponse {
        connected_users,
        online_agents,
        agents: rows,
    })))
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/online", get(online_stats))
}

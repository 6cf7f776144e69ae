use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::AdminState;
use crate::storage::RedirectRecord;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub backend_enabled: bool,
}

#[derive(Serialize)]
pub struct PipelineSummary {
    pub total_requests: u64,
    pub outcomes: BTreeMap<&'static str, u64>,
    pub pending_writes: usize,
}

#[derive(Deserialize)]
pub struct LookupParams {
    pub key: String,
}

#[derive(Serialize)]
pub struct ObjectSummary {
    pub content_type: Option<String>,
    pub size: usize,
}

#[derive(Serialize)]
pub struct LookupResult {
    pub key: String,
    pub redirect: Option<RedirectRecord>,
    pub object: Option<ObjectSummary>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started.elapsed().as_secs(),
        backend_enabled: state.pipeline.settings().backend_enabled,
    })
}

pub async fn get_stats(State(state): State<AdminState>) -> Json<PipelineSummary> {
    let stats = state.pipeline.stats();
    Json(PipelineSummary {
        total_requests: stats.total(),
        outcomes: stats.snapshot(),
        pending_writes: state.pipeline.background().pending(),
    })
}

/// What the stores hold for one cache key.
pub async fn get_lookup(
    State(state): State<AdminState>,
    Query(params): Query<LookupParams>,
) -> Json<LookupResult> {
    let redirect = state.pipeline.redirects().get(&params.key).await;
    let object = state
        .pipeline
        .objects()
        .get(&params.key)
        .await
        .map(|o| ObjectSummary {
            content_type: o.content_type,
            size: o.body.len(),
        });

    Json(LookupResult {
        key: params.key,
        redirect,
        object,
    })
}

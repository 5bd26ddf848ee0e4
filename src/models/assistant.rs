use serde::{Deserialize, Serialize};

use super::tier::ActionKind;

#[derive(Debug, Deserialize)]
pub struct AssistantRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct AssistantResponse {
    pub action: String,
    pub kind: ActionKind,
    pub status: &'static str,
    pub quota: QuotaSnapshot,
}

#[derive(Debug, Serialize)]
pub struct QuotaSnapshot {
    pub limit: i64,
    pub count: u64,
    pub remaining: u64,
    pub resets_at: i64,
}

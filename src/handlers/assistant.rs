use axum::{
    extract::{Path, State},
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use crate::{
    errors::{AppError, Result},
    handlers::AppState,
    middleware::auth::AuthenticatedUser,
    models::{ActionKind, AssistantRequest, AssistantResponse, BaristaAction, QuotaSnapshot},
    services::quota::{next_day_start, seconds_until_end_of_day},
};

/// `POST /api/v1/barista/:action` for draft, outline, polish and idea.
pub async fn barista_action(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(action): Path<String>,
    Json(request): Json<AssistantRequest>,
) -> Result<Response> {
    let action: BaristaAction = action.parse().map_err(|_| AppError::NotFound)?;
    gate_action(&state, &user, ActionKind::Barista, action.as_str(), &request).await
}

/// `POST /api/v1/images/generate`.
pub async fn generate_image(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<AssistantRequest>,
) -> Result<Response> {
    gate_action(&state, &user, ActionKind::Image, "generate", &request).await
}

async fn gate_action(
    state: &AppState,
    user: &AuthenticatedUser,
    kind: ActionKind,
    action: &str,
    request: &AssistantRequest,
) -> Result<Response> {
    // Malformed requests are turned away before they cost any quota.
    if request.prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt must not be empty".to_string()));
    }

    let limit = state.config.tiers.daily_limit(user.tier, kind);
    let quota = state.quota.take_daily(&user.id, kind.as_str(), limit).await?;
    state.metrics.record_quota_decision(kind.as_str(), &quota);

    let now = state.quota.now();

    if !quota.ok {
        info!(
            user_id = %user.id,
            tier = %user.tier,
            kind = %kind,
            count = quota.count,
            limit,
            "daily limit reached"
        );
        return Err(AppError::DailyLimitReached {
            kind: kind.to_string(),
            limit,
            count: quota.count,
            retry_after_secs: seconds_until_end_of_day(now),
            upgrade_hint: state.config.tiers.upgrade_hint(user.tier, kind),
        });
    }

    let resets_at = next_day_start(now)
        .map(|midnight| midnight.timestamp())
        .unwrap_or_default();

    let body = AssistantResponse {
        action: action.to_string(),
        kind,
        status: "accepted",
        quota: QuotaSnapshot {
            limit,
            count: quota.count,
            remaining: quota.remaining,
            resets_at,
        },
    };

    let mut headers = HeaderMap::new();
    headers.insert("x-quota-daily-limit", HeaderValue::from(limit));
    headers.insert("x-quota-daily-used", HeaderValue::from(quota.count));
    headers.insert("x-quota-daily-remaining", HeaderValue::from(quota.remaining));
    headers.insert("x-quota-reset", HeaderValue::from(resets_at));

    Ok((headers, Json(body)).into_response())
}

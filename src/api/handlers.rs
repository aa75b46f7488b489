//! HTTP API handlers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::coordinator::{AppCoordinator, DerivedView};
use crate::error::WagerError;
use crate::ledger::{LedgerSnapshot, Wager};
use crate::limits::BetLimits;
use crate::payout::{self, Odds};
use crate::session::{OptionSide, Session, SessionDraft, SessionId};
use crate::share::ShareMetadata;

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Session coordinator.
    pub coordinator: Arc<AppCoordinator>,
    /// Public base URL for share links.
    pub base_url: Url,
    /// Whether the service accepts traffic.
    pub ready: Arc<AtomicBool>,
    /// Prometheus render handle, if a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state.
    pub fn new(coordinator: Arc<AppCoordinator>, base_url: Url) -> Self {
        Self {
            coordinator,
            base_url,
            ready: Arc::new(AtomicBool::new(false)),
            metrics: None,
        }
    }

    /// Attach a Prometheus handle for `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Set ready state.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Check if ready.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

/// Error body returned for every failed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error kind: "validation", "not_found" or "transient".
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

impl IntoResponse for WagerError {
    fn into_response(self) -> Response {
        let status = match &self {
            WagerError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WagerError::NotFound { .. } => StatusCode::NOT_FOUND,
            WagerError::TransientStore(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, WagerError>;

fn parse_id(raw: &str) -> ApiResult<SessionId> {
    raw.parse().map_err(|_| WagerError::not_found(raw))
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Whether service is ready.
    pub ready: bool,
    /// Sessions held by the store.
    pub sessions: usize,
    /// Sessions with live observers.
    pub observed_sessions: usize,
}

/// Body of a percentage update.
#[derive(Debug, Deserialize)]
pub struct UpdateLimitsRequest {
    /// Display name claiming ownership.
    pub requester: String,
    /// New minimum percentage.
    #[serde(default)]
    pub min_bet_percentage: Option<u32>,
    /// New maximum percentage.
    #[serde(default)]
    pub max_bet_percentage: Option<u32>,
}

/// Body of a wager submission.
#[derive(Debug, Deserialize)]
pub struct PlaceWagerRequest {
    /// Self-asserted display name.
    pub player_name: String,
    /// 0 or 1.
    pub option_index: u8,
    /// Stake.
    pub amount: Decimal,
}

/// `?amount=` query.
#[derive(Debug, Deserialize)]
pub struct AmountQuery {
    /// Candidate amount.
    pub amount: Decimal,
}

/// `?side=&amount=` query.
#[derive(Debug, Deserialize)]
pub struct PotentialQuery {
    /// Option index, 0 or 1.
    pub side: u8,
    /// Candidate amount.
    pub amount: Decimal,
}

/// Advisory validation result.
#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    /// Always true; failures are returned as errors.
    pub valid: bool,
    /// Limits the amount was checked against.
    pub limits: BetLimits,
}

/// Live payout estimate.
#[derive(Debug, Serialize)]
pub struct PotentialResponse {
    /// Option the estimate is for.
    pub option_index: OptionSide,
    /// Candidate amount.
    pub amount: Decimal,
    /// Estimated winnings at the current pool sizes.
    pub potential_win: Decimal,
    /// Current odds of the option.
    pub odds: Odds,
}

/// A player's current winnings.
#[derive(Debug, Serialize)]
pub struct WinningsResponse {
    /// Player the figures are for.
    pub player_name: String,
    /// Sum over both options.
    pub current_winnings: Decimal,
    /// Per-option payout if that option wins.
    pub by_option: [Decimal; 2],
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Readiness check handler - returns 200 if ready, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let is_ready = state.is_ready();
    let response = ReadyResponse {
        ready: is_ready,
        sessions: state.coordinator.store().session_count(),
        observed_sessions: state.coordinator.observed_sessions().len(),
    };

    if is_ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Prometheus exposition, 404 when no recorder is installed.
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Create a live session from a draft.
pub async fn create_session(
    State(state): State<AppState>,
    Json(draft): Json<SessionDraft>,
) -> ApiResult<(StatusCode, Json<DerivedView>)> {
    let session = state.coordinator.create_session(draft).await?;
    let ledger = LedgerSnapshot::empty(session.id);
    Ok((StatusCode::CREATED, Json(DerivedView::build(session, ledger))))
}

/// Derived view by id.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DerivedView>> {
    let id = parse_id(&id)?;
    Ok(Json(state.coordinator.derived_view(id).await?))
}

/// Derived view by share slug.
pub async fn get_session_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<DerivedView>> {
    Ok(Json(state.coordinator.derived_view_by_slug(&slug).await?))
}

/// Change the bet limit percentages.
pub async fn update_limits(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateLimitsRequest>,
) -> ApiResult<Json<Session>> {
    let id = parse_id(&id)?;
    let session = state
        .coordinator
        .update_percentages(id, &req.requester, req.min_bet_percentage, req.max_bet_percentage)
        .await?;
    Ok(Json(session))
}

/// Place a wager.
pub async fn place_wager(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<PlaceWagerRequest>,
) -> ApiResult<(StatusCode, Json<Wager>)> {
    let id = parse_id(&id)?;
    let side = OptionSide::try_from(req.option_index)?;
    let wager = state
        .coordinator
        .place_wager(id, &req.player_name, side, req.amount)
        .await?;
    Ok((StatusCode::CREATED, Json(wager)))
}

/// Advisory validation of an amount.
pub async fn validate_amount(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<AmountQuery>,
) -> ApiResult<Json<ValidateResponse>> {
    let id = parse_id(&id)?;
    let limits = state.coordinator.validate(id, query.amount).await?;
    Ok(Json(ValidateResponse { valid: true, limits }))
}

/// Live estimate for a hypothetical wager.
pub async fn potential_win(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PotentialQuery>,
) -> ApiResult<Json<PotentialResponse>> {
    let id = parse_id(&id)?;
    let side = OptionSide::try_from(query.side)?;
    let view = state.coordinator.derived_view(id).await?;

    Ok(Json(PotentialResponse {
        option_index: side,
        amount: query.amount,
        potential_win: view.potential_win(side, query.amount),
        odds: view.odds(side),
    }))
}

/// A player's current winnings.
pub async fn winnings(
    State(state): State<AppState>,
    Path((id, player)): Path<(String, String)>,
) -> ApiResult<Json<WinningsResponse>> {
    let id = parse_id(&id)?;
    let view = state.coordinator.derived_view(id).await?;

    Ok(Json(WinningsResponse {
        current_winnings: view.current_winnings(&player),
        by_option: payout::winnings_by_side(view.ledger(), &player),
        player_name: player,
    }))
}

/// Link-preview metadata.
pub async fn share(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ShareMetadata>> {
    let id = parse_id(&id)?;
    let view = state.coordinator.derived_view(id).await?;
    Ok(Json(ShareMetadata::for_view(&state.base_url, &view)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::session::BetPercentages;
    use crate::store::MemoryStore;

    fn state() -> AppState {
        let coordinator = Arc::new(AppCoordinator::new(
            Arc::new(MemoryStore::new()),
            BetPercentages::default(),
        ));
        AppState::new(coordinator, Url::parse("http://localhost:8080").unwrap())
    }

    #[test]
    fn app_state_ready_toggle() {
        let state = state();
        assert!(!state.is_ready());

        state.set_ready(true);
        assert!(state.is_ready());

        state.set_ready(false);
        assert!(!state.is_ready());
    }

    #[test]
    fn errors_map_to_status_codes() {
        let cases = [
            (
                WagerError::Validation(ValidationError::NonPositiveAmount),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (WagerError::not_found("abc"), StatusCode::NOT_FOUND),
            (
                WagerError::TransientStore("down".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn malformed_id_is_not_found() {
        assert!(matches!(
            parse_id("not-a-uuid"),
            Err(WagerError::NotFound { .. })
        ));
    }
}

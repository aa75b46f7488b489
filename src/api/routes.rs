//! HTTP API route definitions.

use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers::{
    create_session, get_session, get_session_by_slug, health, metrics, place_wager,
    potential_win, ready, share, update_limits, validate_amount, winnings, AppState,
};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/metrics", get(metrics))
        // Sessions
        .route("/api/v1/sessions", post(create_session))
        .route("/api/v1/sessions/:id", get(get_session))
        .route("/api/v1/sessions/:id/limits", put(update_limits))
        .route("/api/v1/sessions/:id/wagers", post(place_wager))
        .route("/api/v1/sessions/:id/validate", get(validate_amount))
        .route("/api/v1/sessions/:id/potential", get(potential_win))
        .route("/api/v1/sessions/:id/winnings/:player", get(winnings))
        .route("/api/v1/sessions/:id/share", get(share))
        // Share links
        .route("/api/v1/slugs/:slug", get(get_session_by_slug))
        .with_state(state)
}

use super::health;
use axum::Router;
use axum::routing::get;

/// The non-feature system router: health checks and anything else that isn't
/// owned by a specific feature slice.
pub fn system_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health::health_handler))
}

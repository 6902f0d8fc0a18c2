use axum::Router;
use axum::middleware::from_fn_with_state;
use keeper::kernel::prelude::ApiState;
use keeper_identity::auth_middleware;
use tower_http::trace::TraceLayer;

/// Builds the full Axum router: unauthenticated system/identity routes plus
/// the secrets routes behind the session-cookie middleware.
#[allow(unreachable_pub)]
pub fn init(state: ApiState) -> Router {
    let authenticated =
        keeper_secrets::router().route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(keeper::server::router::system_router())
        .merge(keeper_identity::router())
        .merge(authenticated)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub mod auth;
pub mod health;
pub mod orders;
pub mod trade_methods;
pub mod users;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
    Router,
};

use crate::{
    middleware::{
        auth::{require_auth, require_superuser},
        timing::process_time,
    },
    AppState,
};

pub fn router(state: AppState) -> Router {
    let authenticated = Router::new()
        .route("/trade-methods/payout", get(trade_methods::payout))
        .route("/trade-methods/payin", get(trade_methods::payin))
        .route("/create_order", post(orders::create_order))
        .route("/orders", get(orders::list_orders))
        .route("/users/me", get(users::me))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let superuser = Router::new()
        .route("/users/:id/superuser", patch(users::set_superuser))
        .route_layer(from_fn(require_superuser))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/auth/registration", post(auth::registration))
        .route("/auth/authorization", post(auth::authorization))
        .route("/auth/refresh", post(auth::refresh))
        .route("/order_callback", post(orders::order_callback))
        .merge(authenticated)
        .merge(superuser)
        .layer(from_fn(process_time))
        .with_state(state)
}

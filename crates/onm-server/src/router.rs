use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::handler;
use crate::message::endpoints;
use crate::state::AppState;

/// Build the axum router with every onm endpoint, mounted under the
/// configured prefix.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let mut routes = Router::new()
        .route(endpoints::META, get(handler::meta_handler))
        .route(endpoints::MODELS, get(handler::models_handler))
        .route(endpoints::STORES, get(handler::stores_handler))
        .route(endpoints::ADDRESSES, get(handler::addresses_handler))
        .route(endpoints::ADDRESSES_OF_STORE, get(handler::store_addresses_handler))
        .route(endpoints::ADDRESSES_AT, get(handler::address_addresses_handler))
        .route(endpoints::DATA, get(handler::data_handler))
        .route(endpoints::DATA_OF_STORE, get(handler::store_data_handler))
        .route(endpoints::DATA_AT, get(handler::address_data_handler))
        .route(endpoints::CREATE_STORE, post(handler::create_store_handler))
        .route(endpoints::CREATE_COMPONENT, post(handler::create_component_handler))
        .route(endpoints::UPDATE_COMPONENT, post(handler::update_component_handler))
        .route(endpoints::REMOVE_STORE, delete(handler::remove_handler))
        .route(endpoints::REMOVE_COMPONENT, delete(handler::remove_handler));

    if config.enable_bulk_delete {
        routes = routes.route(endpoints::REMOVE_STORES, delete(handler::remove_stores_handler));
    }

    let routes = routes.with_state(state);
    let prefix = config.normalized_prefix();
    let app = if prefix.is_empty() {
        routes
    } else {
        Router::new().nest(&prefix, routes)
    };
    app.layer(TraceLayer::new_for_http())
}

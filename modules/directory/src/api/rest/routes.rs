//! Route table for the directory REST surface.

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};

use crate::domain::service::DirectoryService;

use super::handlers;

/// Directory router, nested under the gate by the server binary.
pub fn router(service: Arc<DirectoryService>) -> Router {
    Router::new()
        .route("/v1/containers", post(handlers::create_container))
        .route("/v1/containers/lookup", get(handlers::lookup_container))
        .route(
            "/v1/containers/{id}",
            get(handlers::get_container).delete(handlers::delete_container),
        )
        .route("/v1/containers/{id}/children", get(handlers::list_children))
        .route(
            "/v1/containers/{id}/ancestors",
            get(handlers::list_ancestors),
        )
        .route(
            "/v1/containers/{id}/deactivate",
            post(handlers::deactivate_container),
        )
        .route(
            "/v1/containers/{id}/members",
            post(handlers::add_member).get(handlers::list_members),
        )
        .route(
            "/v1/containers/{id}/members/{user_id}",
            delete(handlers::remove_member),
        )
        .with_state(service)
}

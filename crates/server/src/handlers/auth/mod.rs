/// Session termination route.
mod logout;

/// User registration route.
mod register;

/// Session introspection route.
mod session;

use std::sync::Arc;

use aide::axum::{
    routing::{get_with, post_with},
    ApiRouter,
};
use axum::middleware::from_fn_with_state;
use db::DatabaseConnection;

use crate::auth;

/// Create an [`ApiRouter`] that provides an API server with authentication routes.
pub(crate) fn routes(database: Arc<DatabaseConnection>) -> ApiRouter<Arc<DatabaseConnection>> {
    let session_routes = ApiRouter::new()
        .api_route("/session", get_with(session::session, session::docs))
        .api_route("/logout", post_with(logout::logout, logout::docs))
        .route_layer(from_fn_with_state(database, auth::require_authentication));

    ApiRouter::new()
        .api_route("/register", post_with(register::register, register::docs))
        .merge(session_routes)
        .with_path_items(|op| op.tag("Authentication"))
}

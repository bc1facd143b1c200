/// Profile image upload and removal routes.
mod image;

/// User list route.
mod list;

/// Current user profile routes.
mod profile;

/// User role management route.
mod role;

use std::sync::Arc;

use aide::axum::{
    routing::{get_with, post_with, put_with},
    ApiRouter,
};
use axum::extract::DefaultBodyLimit;
use db::{user, DatabaseConnection};
use schemars::JsonSchema;
use serde::Serialize;

/// Publicly visible user information.
#[derive(Serialize, JsonSchema)]
pub(crate) struct UserData {
    /// User identifier.
    #[schemars(example = "crate::schema::example_database_identifier")]
    pub id: i64,

    /// Full name.
    #[schemars(example = "crate::schema::example_user_name")]
    pub name: String,

    /// Email address.
    #[schemars(example = "crate::schema::example_email")]
    pub email: String,

    /// User role.
    #[schemars(example = "crate::schema::example_role")]
    pub role: user::Role,

    /// Postal address.
    pub address: Option<String>,

    /// Phone number.
    pub phone: Option<String>,

    /// Profile image URL.
    #[schemars(example = "crate::schema::example_image_url")]
    pub image_url: Option<String>,

    /// Registration time.
    #[schemars(example = "crate::schema::example_timestamp")]
    pub created_at: i64,
}

impl From<user::Model> for UserData {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            role: model.role,
            address: model.address,
            phone: model.phone,
            image_url: model.image_url,
            created_at: db::unix_timestamp(model.created_at),
        }
    }
}

/// Single user mutation response.
#[derive(Serialize, JsonSchema)]
pub(crate) struct UserResponse {
    /// Updated user.
    pub user: UserData,

    /// Human-readable operation result.
    #[schemars(example = "crate::schema::example_message")]
    pub message: String,
}

/// Create an [`ApiRouter`] that provides an API server with user routes.
pub(crate) fn routes() -> ApiRouter<Arc<DatabaseConnection>> {
    ApiRouter::new()
        .api_route(
            "/me/image",
            post_with(image::upload, image::upload_docs).delete_with(image::delete, image::delete_docs),
        )
        .layer(DefaultBodyLimit::disable())
        .api_route("/", get_with(list::list, list::docs))
        .api_route(
            "/me",
            get_with(profile::me, profile::me_docs).put_with(profile::update, profile::update_docs),
        )
        .api_route("/:id/role", put_with(role::update_role, role::docs))
        .with_path_items(|op| op.tag("Users"))
}

use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{extract::State, Extension, Json};
use axum_derive_error::ErrorResponse;
use db::{session, DatabaseConnection, DbErr, EntityTrait};
use derive_more::{Display, Error, From};

use crate::{auth::SessionContext, handlers::MessageResponse};

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum LogoutError {
    DatabaseError(DbErr),
}

/// Generate OAPI documentation for the [`logout`] handler.
pub(super) fn docs(op: TransformOperation) -> TransformOperation {
    op.summary("Terminate current session.")
        .response::<200, Json<MessageResponse>>()
}

/// Delete the session used to authenticate the current request.
pub(super) async fn logout(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
) -> Result<Json<MessageResponse>, LogoutError> {
    session::Entity::delete_by_id(session.session_id())
        .exec(&*db)
        .await?;

    Ok(Json(MessageResponse::new("Logged out successfully")))
}

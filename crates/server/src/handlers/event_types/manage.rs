use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    event, event_type, ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QuerySelect, SelectExt, TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use super::EventTypeResponse;
use crate::{
    auth::SessionContext,
    handlers::MessageResponse,
    policy::{Access, Forbidden, Resource},
    schema::example_error,
    validation::ValidatedJson,
};

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum EventTypeManagementError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "event type not found")]
    EventTypeNotFound,

    /// Events of this type still exist.
    #[status(StatusCode::CONFLICT)]
    #[display(fmt = "event type is used by existing events")]
    EventTypeInUse,
}

/// Event type creation and update request.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct EventTypeRequest {
    #[validate(length(min = 1, max = 64))]
    #[schemars(example = "crate::schema::example_reference_name")]
    name: String,
}

/// Generate OAPI documentation for the [`create`] handler.
pub(super) fn create_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create new event type.")
        .response::<200, Json<EventTypeResponse>>()
}

/// Event type creation handler.
pub(super) async fn create(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    ValidatedJson(request): ValidatedJson<EventTypeRequest>,
) -> Result<Json<EventTypeResponse>, EventTypeManagementError> {
    session.authorize(Resource::EventType, Access::Write)?;

    let model = event_type::ActiveModel {
        name: ActiveValue::Set(request.name),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    Ok(Json(EventTypeResponse {
        event_type: model.into(),
        message: String::from("Event type created successfully"),
    }))
}

/// Generate OAPI documentation for the [`update`] handler.
pub(super) fn update_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Rename event type.")
        .response::<200, Json<EventTypeResponse>>()
        .response_with::<404, Json<Value>, _>(|op| {
            op.description("Event type not found.")
                .example(example_error(EventTypeManagementError::EventTypeNotFound))
        })
}

/// Event type update handler.
pub(super) async fn update(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<EventTypeRequest>,
) -> Result<Json<EventTypeResponse>, EventTypeManagementError> {
    session.authorize(Resource::EventType, Access::Write)?;

    let model = event_type::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or(EventTypeManagementError::EventTypeNotFound)?;

    let mut model: event_type::ActiveModel = model.into();
    model.name = ActiveValue::Set(request.name);
    let model = model.update(&*db).await?;

    Ok(Json(EventTypeResponse {
        event_type: model.into(),
        message: String::from("Event type updated successfully"),
    }))
}

/// Generate OAPI documentation for the [`delete`] handler.
pub(super) fn delete_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete event type.")
        .response::<200, Json<MessageResponse>>()
        .response_with::<409, Json<Value>, _>(|op| {
            op.description("Event type is used by existing events.")
                .example(example_error(EventTypeManagementError::EventTypeInUse))
        })
}

/// Event type deletion handler.
pub(super) async fn delete(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, EventTypeManagementError> {
    session.authorize(Resource::EventType, Access::Write)?;

    db.transaction(|txn| {
        Box::pin(async move {
            let in_use = event::Entity::find()
                .select_only()
                .filter(event::Column::EventTypeId.eq(id))
                .exists(txn)
                .await?;

            if in_use {
                return Err(EventTypeManagementError::EventTypeInUse);
            }

            let result = event_type::Entity::delete_by_id(id).exec(txn).await?;

            if result.rows_affected == 0 {
                return Err(EventTypeManagementError::EventTypeNotFound);
            }

            Ok(Json(MessageResponse::new("Event type deleted successfully")))
        })
    })
    .await
    .into_raw_result()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_json::assert_json;
    use axum::http::StatusCode;
    use db::user::Role;
    use serde_json::json;
    use tower::Service;

    use crate::testing::{
        authorized, authorized_json, create_database, create_simple_event, create_user,
        test_router, ResponseBodyExt,
    };

    #[tokio::test]
    async fn superadmin_manages_event_types() {
        let db = Arc::new(create_database().await);

        let (_, token) = create_user(&db, Role::Superadmin).await;
        let (_, breeder_token) = create_user(&db, Role::Breeder).await;

        let mut service = test_router(db.clone());

        let response = service
            .call(authorized_json(
                "POST",
                "/eventTypes",
                &token,
                json!({ "name": "Derby" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.json().await;
        assert_eq!(body["event_type"]["name"], "Derby");
        let id = body["event_type"]["id"].as_i64().unwrap();

        let response = service
            .call(authorized_json(
                "PUT",
                &format!("/eventTypes/{id}"),
                &token,
                json!({ "name": "Hotspot" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.json().await["event_type"]["name"], "Hotspot");

        let response = service
            .call(authorized("GET", "/eventTypes", &breeder_token))
            .await
            .unwrap();

        let body = response.json().await;
        assert_eq!(body[0]["name"], "Hotspot");

        let response = service
            .call(authorized("DELETE", &format!("/eventTypes/{id}"), &token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn admins_cannot_write_reference_data() {
        let db = Arc::new(create_database().await);

        let (_, token) = create_user(&db, Role::Admin).await;

        let mut service = test_router(db.clone());

        let response = service
            .call(authorized_json(
                "POST",
                "/eventTypes",
                &token,
                json!({ "name": "Derby" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_json!(response.json().await, {
            "code": 403,
            "error": "access denied",
        });
    }

    #[tokio::test]
    async fn referenced_event_type() {
        let db = Arc::new(create_database().await);

        let (superadmin, token) = create_user(&db, Role::Superadmin).await;
        let event = create_simple_event(&db, superadmin.id).await;

        let mut service = test_router(db.clone());

        let response = service
            .call(authorized(
                "DELETE",
                &format!("/eventTypes/{}", event.event_type_id),
                &token,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}

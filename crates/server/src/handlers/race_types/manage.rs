use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    prize_scheme_item, race, race_type, race_type_fee_scheme, race_type_prize_scheme,
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QuerySelect, SelectExt, TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use super::RaceTypeResponse;
use crate::{
    auth::SessionContext,
    handlers::MessageResponse,
    policy::{Access, Forbidden, Resource},
    schema::example_error,
    validation::ValidatedJson,
};

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum RaceTypeManagementError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "race type not found")]
    RaceTypeNotFound,

    /// Races or prize scheme items still reference the race type.
    #[status(StatusCode::CONFLICT)]
    #[display(fmt = "race type is used by races or prize schemes")]
    RaceTypeInUse,
}

/// Race type creation and update request.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct RaceTypeRequest {
    #[validate(length(min = 1, max = 64))]
    #[schemars(example = "crate::schema::example_reference_name")]
    name: String,

    #[serde(default)]
    #[validate(length(max = 1024))]
    description: Option<String>,
}

/// Generate OAPI documentation for the [`create`] handler.
pub(super) fn create_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create new race type.")
        .response::<200, Json<RaceTypeResponse>>()
}

/// Race type creation handler.
pub(super) async fn create(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    ValidatedJson(request): ValidatedJson<RaceTypeRequest>,
) -> Result<Json<RaceTypeResponse>, RaceTypeManagementError> {
    session.authorize(Resource::RaceType, Access::Write)?;

    let model = race_type::ActiveModel {
        name: ActiveValue::Set(request.name),
        description: ActiveValue::Set(request.description),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    Ok(Json(RaceTypeResponse {
        race_type: model.into(),
        message: String::from("Race type created successfully"),
    }))
}

/// Generate OAPI documentation for the [`update`] handler.
pub(super) fn update_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update race type.")
        .response::<200, Json<RaceTypeResponse>>()
        .response_with::<404, Json<Value>, _>(|op| {
            op.description("Race type not found.")
                .example(example_error(RaceTypeManagementError::RaceTypeNotFound))
        })
}

/// Race type update handler.
pub(super) async fn update(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<RaceTypeRequest>,
) -> Result<Json<RaceTypeResponse>, RaceTypeManagementError> {
    session.authorize(Resource::RaceType, Access::Write)?;

    let model = race_type::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or(RaceTypeManagementError::RaceTypeNotFound)?;

    let mut model: race_type::ActiveModel = model.into();
    model.name = ActiveValue::Set(request.name);
    model.description = ActiveValue::Set(request.description);
    let model = model.update(&*db).await?;

    Ok(Json(RaceTypeResponse {
        race_type: model.into(),
        message: String::from("Race type updated successfully"),
    }))
}

/// Generate OAPI documentation for the [`delete`] handler.
pub(super) fn delete_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete race type.")
        .description("Fee and prize scheme links of the race type are removed as well.")
        .response::<200, Json<MessageResponse>>()
        .response_with::<409, Json<Value>, _>(|op| {
            op.description("Race type is still in use.")
                .example(example_error(RaceTypeManagementError::RaceTypeInUse))
        })
}

/// Race type deletion handler.
pub(super) async fn delete(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, RaceTypeManagementError> {
    session.authorize(Resource::RaceType, Access::Write)?;

    db.transaction(|txn| {
        Box::pin(async move {
            let exists = race_type::Entity::find_by_id(id)
                .select_only()
                .exists(txn)
                .await?;

            if !exists {
                return Err(RaceTypeManagementError::RaceTypeNotFound);
            }

            let used_by_races = race::Entity::find()
                .select_only()
                .filter(race::Column::RaceTypeId.eq(id))
                .exists(txn)
                .await?;

            let used_by_prizes = prize_scheme_item::Entity::find()
                .select_only()
                .filter(prize_scheme_item::Column::RaceTypeId.eq(id))
                .exists(txn)
                .await?;

            if used_by_races || used_by_prizes {
                return Err(RaceTypeManagementError::RaceTypeInUse);
            }

            race_type_fee_scheme::Entity::delete_many()
                .filter(race_type_fee_scheme::Column::RaceTypeId.eq(id))
                .exec(txn)
                .await?;

            race_type_prize_scheme::Entity::delete_many()
                .filter(race_type_prize_scheme::Column::RaceTypeId.eq(id))
                .exec(txn)
                .await?;

            race_type::Entity::delete_by_id(id).exec(txn).await?;

            Ok(Json(MessageResponse::new("Race type deleted successfully")))
        })
    })
    .await
    .into_raw_result()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use db::user::Role;
    use serde_json::json;
    use tower::Service;

    use crate::testing::{
        authorized, authorized_json, create_database, create_prize_scheme, create_race_type,
        create_user, test_router, ResponseBodyExt,
    };

    #[tokio::test]
    async fn create_and_list() {
        let db = Arc::new(create_database().await);

        let (_, token) = create_user(&db, Role::Superadmin).await;
        let (_, breeder_token) = create_user(&db, Role::Breeder).await;

        let mut service = test_router(db.clone());

        let response = service
            .call(authorized_json(
                "POST",
                "/raceTypes",
                &token,
                json!({ "name": "Sprint", "description": "Up to 200 km" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.json().await["race_type"]["description"],
            "Up to 200 km"
        );

        let response = service
            .call(authorized_json(
                "POST",
                "/raceTypes",
                &breeder_token,
                json!({ "name": "Marathon" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = service
            .call(authorized("GET", "/raceTypes", &breeder_token))
            .await
            .unwrap();

        let body = response.json().await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "Sprint");
    }

    #[tokio::test]
    async fn referenced_by_prize_scheme() {
        let db = Arc::new(create_database().await);

        let (superadmin, token) = create_user(&db, Role::Superadmin).await;
        let race_type = create_race_type(&db, "Sprint").await;
        create_prize_scheme(&db, superadmin.id, &[(race_type.id, 1, 3, 100.0)]).await;

        let unused = create_race_type(&db, "Marathon").await;

        let mut service = test_router(db.clone());

        let response = service
            .call(authorized(
                "DELETE",
                &format!("/raceTypes/{}", race_type.id),
                &token,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = service
            .call(authorized(
                "DELETE",
                &format!("/raceTypes/{}", unused.id),
                &token,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}

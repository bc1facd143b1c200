use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    bird, sea_query::Expr, team, user, ActiveModelTrait, ActiveValue, ColumnTrait,
    DatabaseConnection, DbErr, EntityTrait, QueryFilter, QuerySelect, SelectExt,
    TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use super::TeamResponse;
use crate::{
    auth::SessionContext,
    handlers::MessageResponse,
    policy::{Access, Forbidden, Owner, Resource},
    schema::example_error,
    validation::ValidatedJson,
};

/// Errors that may occur during team management.
#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum TeamManagementError {
    /// Database-related error.
    DatabaseError(DbErr),

    /// Current user is not allowed to manage the team.
    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    /// Requested team was not found.
    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "team not found")]
    TeamNotFound,

    /// Provided breeder does not exist.
    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "breeder not found")]
    BreederNotFound,
}

/// Team creation request.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct TeamCreationRequest {
    /// Team name.
    #[validate(length(min = 1, max = 128))]
    #[schemars(example = "crate::schema::example_team_name")]
    name: String,

    /// Owning breeder, defaults to the current user.
    #[serde(default)]
    #[schemars(example = "crate::schema::example_optional_database_identifier")]
    breeder_id: Option<i64>,
}

/// Generate OAPI documentation for the [`create`] handler.
pub(super) fn create_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create new team.")
        .description("Breeders may only create teams for themselves.")
        .response::<200, Json<TeamResponse>>()
}

/// Team creation handler.
pub(super) async fn create(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    ValidatedJson(request): ValidatedJson<TeamCreationRequest>,
) -> Result<Json<TeamResponse>, TeamManagementError> {
    let breeder_id = request.breeder_id.unwrap_or(session.user_id());

    session
        .authorize(Resource::Team, Access::Write)?
        .check(Owner::breeder(breeder_id))?;

    db.transaction(|txn| {
        Box::pin(async move {
            let breeder_exists = user::Entity::find_by_id(breeder_id)
                .select_only()
                .exists(txn)
                .await?;

            if !breeder_exists {
                return Err(TeamManagementError::BreederNotFound);
            }

            let model = team::ActiveModel {
                breeder_id: ActiveValue::Set(breeder_id),
                name: ActiveValue::Set(request.name),
                ..Default::default()
            }
            .insert(txn)
            .await?;

            Ok(Json(TeamResponse {
                team: model.into(),
                message: String::from("Team created successfully"),
            }))
        })
    })
    .await
    .into_raw_result()
}

/// Team update request.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct TeamUpdateRequest {
    /// New team name.
    #[validate(length(min = 1, max = 128))]
    #[schemars(example = "crate::schema::example_team_name")]
    name: String,
}

/// Generate OAPI documentation for the [`update`] handler.
pub(super) fn update_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Rename team.")
        .response::<200, Json<TeamResponse>>()
        .response_with::<404, Json<Value>, _>(|op| {
            op.description("Team not found.")
                .example(example_error(TeamManagementError::TeamNotFound))
        })
}

/// Team update handler.
pub(super) async fn update(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<TeamUpdateRequest>,
) -> Result<Json<TeamResponse>, TeamManagementError> {
    let grant = session.authorize(Resource::Team, Access::Write)?;

    db.transaction(|txn| {
        Box::pin(async move {
            let model = team::Entity::find_by_id(id)
                .one(txn)
                .await?
                .ok_or(TeamManagementError::TeamNotFound)?;

            grant.check(Owner::breeder(model.breeder_id))?;

            let mut model: team::ActiveModel = model.into();
            model.name = ActiveValue::Set(request.name);
            let model = model.update(txn).await?;

            Ok(Json(TeamResponse {
                team: model.into(),
                message: String::from("Team updated successfully"),
            }))
        })
    })
    .await
    .into_raw_result()
}

/// Generate OAPI documentation for the [`delete`] handler.
pub(super) fn delete_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete team.")
        .description("Birds of the deleted team are kept, but detached from it.")
        .response::<200, Json<MessageResponse>>()
}

/// Team deletion handler.
pub(super) async fn delete(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, TeamManagementError> {
    let grant = session.authorize(Resource::Team, Access::Write)?;

    db.transaction(|txn| {
        Box::pin(async move {
            let model = team::Entity::find_by_id(id)
                .one(txn)
                .await?
                .ok_or(TeamManagementError::TeamNotFound)?;

            grant.check(Owner::breeder(model.breeder_id))?;

            bird::Entity::update_many()
                .col_expr(bird::Column::TeamId, Expr::value(Option::<i64>::None))
                .filter(bird::Column::TeamId.eq(id))
                .exec(txn)
                .await?;

            team::Entity::delete_by_id(id).exec(txn).await?;

            Ok(Json(MessageResponse::new("Team deleted successfully")))
        })
    })
    .await
    .into_raw_result()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use db::{bird, user::Role, ActiveModelTrait, ActiveValue, EntityTrait};
    use serde_json::json;
    use tower::Service;

    use crate::testing::{
        authorized, authorized_json, create_bird, create_database, create_user, test_router,
        ResponseBodyExt,
    };

    #[tokio::test]
    async fn breeder_team_lifecycle() {
        let db = Arc::new(create_database().await);

        let (breeder, token) = create_user(&db, Role::Breeder).await;

        let mut service = test_router(db.clone());

        let response = service
            .call(authorized_json(
                "POST",
                "/teams",
                &token,
                json!({ "name": "Skyline Lofts" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.json().await;
        assert_eq!(body["team"]["breeder_id"], breeder.id);
        assert_eq!(body["message"], "Team created successfully");
        let team_id = body["team"]["id"].as_i64().unwrap();

        let bird = create_bird(&db, breeder.id, "00001").await;
        bird::ActiveModel {
            id: ActiveValue::Unchanged(bird.id),
            team_id: ActiveValue::Set(Some(team_id)),
            ..Default::default()
        }
        .update(&*db)
        .await
        .unwrap();

        let response = service
            .call(authorized_json(
                "PUT",
                &format!("/teams/{team_id}"),
                &token,
                json!({ "name": "Blue Sky" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.json().await["team"]["name"], "Blue Sky");

        let response = service
            .call(authorized("GET", "/teams", &token))
            .await
            .unwrap();

        assert_eq!(response.json().await.as_array().unwrap().len(), 1);

        let response = service
            .call(authorized("DELETE", &format!("/teams/{team_id}"), &token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let bird = bird::Entity::find_by_id(bird.id)
            .one(&*db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bird.team_id, None);
    }

    #[tokio::test]
    async fn foreign_team() {
        let db = Arc::new(create_database().await);

        let (owner, _) = create_user(&db, Role::Breeder).await;
        let (_, other_token) = create_user(&db, Role::Breeder).await;

        let mut service = test_router(db.clone());

        let response = service
            .call(authorized_json(
                "POST",
                "/teams",
                &other_token,
                json!({ "name": "Stolen", "breeder_id": owner.id }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

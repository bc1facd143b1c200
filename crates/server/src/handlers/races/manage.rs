use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    basket, event, race, race_item, race_type, ActiveModelTrait, ActiveValue, ColumnTrait,
    DatabaseConnection, DbErr, EntityTrait, QueryFilter, QuerySelect, SelectExt,
    TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use time::error::ComponentRange;
use tracing::info;
use validator::Validate;

use super::{find_race, owner_of, RaceResponse};
use crate::{
    auth::SessionContext,
    handlers::MessageResponse,
    policy::{Access, Forbidden, Resource},
    schema::example_error,
    validation::ValidatedJson,
};

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum RaceManagementError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "race not found")]
    RaceNotFound,

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "event not found")]
    EventNotFound,

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "race type not found")]
    RaceTypeNotFound,

    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "invalid timestamp: {_0}")]
    InvalidTimestamp(ComponentRange),

    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "race is live")]
    RaceLive,

    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "race is closed")]
    RaceClosed,
}

/// Race details shared by creation and update requests.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct RaceDetailsRequest {
    #[schemars(example = "crate::schema::example_database_identifier")]
    race_type_id: i64,

    #[validate(length(min = 1, max = 128))]
    #[schemars(example = "crate::schema::example_race_name")]
    name: String,

    /// Release time as a UNIX timestamp.
    #[serde(default)]
    #[schemars(example = "crate::schema::example_optional_timestamp")]
    release_at: Option<i64>,

    #[serde(default)]
    #[validate(range(min = 0.0))]
    #[schemars(example = "crate::schema::example_distance")]
    distance_km: Option<f64>,
}

impl RaceDetailsRequest {
    fn apply(self, model: &mut race::ActiveModel) -> Result<(), RaceManagementError> {
        let release_at = self.release_at.map(db::from_unix_timestamp).transpose()?;

        model.race_type_id = ActiveValue::Set(self.race_type_id);
        model.name = ActiveValue::Set(self.name);
        model.release_at = ActiveValue::Set(release_at);
        model.distance_km = ActiveValue::Set(self.distance_km);

        Ok(())
    }
}

/// Race creation request.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct RaceCreationRequest {
    #[schemars(example = "crate::schema::example_database_identifier")]
    event_id: i64,

    #[serde(flatten)]
    #[validate]
    race: RaceDetailsRequest,
}

/// Generate OAPI documentation for the [`create`] handler.
pub(super) fn create_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create new race.")
        .response::<200, Json<RaceResponse>>()
        .response_with::<404, Json<Value>, _>(|op| {
            op.description("Event or race type not found.")
                .example(example_error(RaceManagementError::RaceTypeNotFound))
        })
}

/// Race creation handler.
pub(super) async fn create(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    ValidatedJson(request): ValidatedJson<RaceCreationRequest>,
) -> Result<Json<RaceResponse>, RaceManagementError> {
    let grant = session.authorize(Resource::Race, Access::Write)?;
    let created_by = session.user_id();

    db.transaction(|txn| {
        Box::pin(async move {
            let event = event::Entity::find_by_id(request.event_id)
                .one(txn)
                .await?
                .ok_or(RaceManagementError::EventNotFound)?;

            grant.check(owner_of(&event))?;

            if !race_type::Entity::find_by_id(request.race.race_type_id)
                .select_only()
                .exists(txn)
                .await?
            {
                return Err(RaceManagementError::RaceTypeNotFound);
            }

            let mut model = race::ActiveModel {
                event_id: ActiveValue::Set(event.id),
                is_live: ActiveValue::Set(false),
                is_closed: ActiveValue::Set(false),
                created_by: ActiveValue::Set(created_by),
                ..Default::default()
            };
            request.race.apply(&mut model)?;

            let model = model.insert(txn).await?;

            info!(race_id = model.id, event_id = event.id, "race created");

            Ok(Json(RaceResponse {
                race: model.into(),
                message: String::from("Race created successfully"),
            }))
        })
    })
    .await
    .into_raw_result()
}

/// Generate OAPI documentation for the [`update`] handler.
pub(super) fn update_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update race.")
        .description("Live and closed races can not be changed.")
        .response::<200, Json<RaceResponse>>()
        .response_with::<400, Json<Value>, _>(|op| {
            op.description("Race is live or closed.")
                .example(example_error(RaceManagementError::RaceLive))
        })
}

/// Race update handler.
pub(super) async fn update(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<RaceDetailsRequest>,
) -> Result<Json<RaceResponse>, RaceManagementError> {
    let grant = session.authorize(Resource::Race, Access::Write)?;

    db.transaction(|txn| {
        Box::pin(async move {
            let (race, event) = find_race(txn, id)
                .await?
                .ok_or(RaceManagementError::RaceNotFound)?;

            grant.check(owner_of(&event))?;

            if race.is_live {
                return Err(RaceManagementError::RaceLive);
            }

            if race.is_closed {
                return Err(RaceManagementError::RaceClosed);
            }

            if !race_type::Entity::find_by_id(request.race_type_id)
                .select_only()
                .exists(txn)
                .await?
            {
                return Err(RaceManagementError::RaceTypeNotFound);
            }

            let mut model: race::ActiveModel = race.into();
            request.apply(&mut model)?;
            let model = model.update(txn).await?;

            Ok(Json(RaceResponse {
                race: model.into(),
                message: String::from("Race updated successfully"),
            }))
        })
    })
    .await
    .into_raw_result()
}

/// Generate OAPI documentation for the [`delete`] handler.
pub(super) fn delete_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete race.")
        .description("Enrolled birds and baskets of the race are deleted as well.")
        .response::<200, Json<MessageResponse>>()
        .response_with::<400, Json<Value>, _>(|op| {
            op.description("Race is live.")
                .example(example_error(RaceManagementError::RaceLive))
        })
}

/// Race deletion handler.
pub(super) async fn delete(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, RaceManagementError> {
    let grant = session.authorize(Resource::Race, Access::Write)?;

    db.transaction(|txn| {
        Box::pin(async move {
            let (race, event) = find_race(txn, id)
                .await?
                .ok_or(RaceManagementError::RaceNotFound)?;

            grant.check(owner_of(&event))?;

            if race.is_live {
                return Err(RaceManagementError::RaceLive);
            }

            race_item::Entity::delete_many()
                .filter(race_item::Column::RaceId.eq(id))
                .exec(txn)
                .await?;

            basket::Entity::delete_many()
                .filter(basket::Column::RaceId.eq(id))
                .exec(txn)
                .await?;

            race::Entity::delete_by_id(id).exec(txn).await?;

            Ok(Json(MessageResponse::new("Race deleted successfully")))
        })
    })
    .await
    .into_raw_result()
}

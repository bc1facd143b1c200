use std::{collections::BTreeSet, sync::Arc};

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    bird, event_inventory_item, prize_scheme_item, race_item, ActiveModelTrait, ActiveValue,
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::error::ComponentRange;
use tracing::info;
use validator::Validate;

use super::{find_race, owner_of, RaceItemData};
use crate::{
    auth::SessionContext,
    policy::{Access, Forbidden, Resource},
    schema::example_error,
    validation::ValidatedJson,
};

/// Birds that are not registered in the event of a race.
#[derive(Debug, Display, Error)]
#[display(fmt = "birds are not registered in the event: {ids:?}")]
pub(super) struct UnregisteredBirds {
    ids: Vec<i64>,
}

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum RaceItemError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "race not found")]
    RaceNotFound,

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "race item not found")]
    ItemNotFound,

    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "race is closed")]
    RaceClosed,

    #[status(StatusCode::BAD_REQUEST)]
    NotRegistered(UnregisteredBirds),

    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "invalid timestamp: {_0}")]
    InvalidTimestamp(ComponentRange),
}

/// Race item together with the enrolled bird band.
#[derive(Serialize, JsonSchema)]
pub(super) struct RaceEntryData {
    #[serde(flatten)]
    item: RaceItemData,

    #[schemars(example = "crate::schema::example_band")]
    band: Option<String>,

    #[schemars(example = "crate::schema::example_optional_database_identifier")]
    breeder_id: Option<i64>,
}

impl From<(race_item::Model, Option<bird::Model>)> for RaceEntryData {
    fn from((item, bird): (race_item::Model, Option<bird::Model>)) -> Self {
        Self {
            item: item.into(),
            band: bird.as_ref().map(|bird| bird.band.clone()),
            breeder_id: bird.map(|bird| bird.breeder_id),
        }
    }
}

/// Generate OAPI documentation for the [`list`] handler.
pub(super) fn list_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get birds enrolled in a race.")
        .response::<200, Json<Vec<RaceEntryData>>>()
        .response_with::<404, Json<Value>, _>(|op| {
            op.description("Race not found.")
                .example(example_error(RaceItemError::RaceNotFound))
        })
}

/// Race item list request handler.
pub(super) async fn list(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<RaceEntryData>>, RaceItemError> {
    let grant = session.authorize(Resource::Race, Access::Read)?;

    let (_, event) = find_race(&*db, id)
        .await?
        .ok_or(RaceItemError::RaceNotFound)?;

    grant.check(owner_of(&event))?;

    let items = race_item::Entity::find()
        .find_also_related(bird::Entity)
        .filter(race_item::Column::RaceId.eq(id))
        .order_by_asc(race_item::Column::Id)
        .all(&*db)
        .await?;

    Ok(Json(items.into_iter().map(RaceEntryData::from).collect()))
}

/// Race enrollment request.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct RaceEnrollmentRequest {
    /// Birds to enroll, each has to be registered in the event of the race.
    #[validate(length(min = 1, max = 1000))]
    bird_ids: Vec<i64>,
}

#[derive(Serialize, JsonSchema)]
pub(super) struct RaceEnrollmentResponse {
    /// Every bird enrolled in the race after the operation.
    items: Vec<RaceItemData>,

    /// Number of newly enrolled birds.
    enrolled: usize,

    #[schemars(example = "crate::schema::example_message")]
    message: String,
}

/// Generate OAPI documentation for the [`enroll`] handler.
pub(super) fn enroll_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Enroll birds in a race.")
        .description("Birds that are already enrolled are skipped.")
        .response::<200, Json<RaceEnrollmentResponse>>()
        .response_with::<400, Json<Value>, _>(|op| {
            op.description("Some birds are not registered in the event.")
                .example(example_error(RaceItemError::NotRegistered(
                    UnregisteredBirds { ids: vec![1, 2] },
                )))
        })
}

/// Race enrollment handler.
pub(super) async fn enroll(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<RaceEnrollmentRequest>,
) -> Result<Json<RaceEnrollmentResponse>, RaceItemError> {
    let grant = session.authorize(Resource::Race, Access::Write)?;

    db.transaction(|txn| {
        Box::pin(async move {
            let (race, event) = find_race(txn, id)
                .await?
                .ok_or(RaceItemError::RaceNotFound)?;

            grant.check(owner_of(&event))?;

            if race.is_closed {
                return Err(RaceItemError::RaceClosed);
            }

            let requested = request.bird_ids.into_iter().collect::<BTreeSet<_>>();

            let registered = event_inventory_item::Entity::find()
                .select_only()
                .column(event_inventory_item::Column::BirdId)
                .filter(event_inventory_item::Column::EventId.eq(event.id))
                .filter(event_inventory_item::Column::BirdId.is_in(requested.iter().copied()))
                .into_tuple::<i64>()
                .all(txn)
                .await?
                .into_iter()
                .collect::<BTreeSet<_>>();

            let unregistered = requested
                .difference(&registered)
                .copied()
                .collect::<Vec<_>>();

            if !unregistered.is_empty() {
                return Err(RaceItemError::NotRegistered(UnregisteredBirds {
                    ids: unregistered,
                }));
            }

            let enrolled = race_item::Entity::find()
                .select_only()
                .column(race_item::Column::BirdId)
                .filter(race_item::Column::RaceId.eq(race.id))
                .into_tuple::<i64>()
                .all(txn)
                .await?
                .into_iter()
                .collect::<BTreeSet<_>>();

            let new_items = requested
                .difference(&enrolled)
                .map(|bird_id| race_item::ActiveModel {
                    race_id: ActiveValue::Set(race.id),
                    bird_id: ActiveValue::Set(*bird_id),
                    is_loft_basketed: ActiveValue::Set(false),
                    is_race_basketed: ActiveValue::Set(false),
                    ..Default::default()
                })
                .collect::<Vec<_>>();

            let count = new_items.len();

            if !new_items.is_empty() {
                race_item::Entity::insert_many(new_items)
                    .exec_without_returning(txn)
                    .await?;
            }

            info!(race_id = race.id, enrolled = count, "birds enrolled in a race");

            let items = race_item::Entity::find()
                .filter(race_item::Column::RaceId.eq(race.id))
                .order_by_asc(race_item::Column::Id)
                .all(txn)
                .await?;

            Ok(Json(RaceEnrollmentResponse {
                items: items.into_iter().map(RaceItemData::from).collect(),
                enrolled: count,
                message: String::from("Birds enrolled successfully"),
            }))
        })
    })
    .await
    .into_raw_result()
}

/// Single race result row.
#[derive(Serialize, JsonSchema)]
pub(super) struct RaceResultData {
    #[serde(flatten)]
    entry: RaceEntryData,

    /// Prize for the finishing position, zero when none applies.
    #[schemars(example = "crate::schema::example_amount")]
    prize: f64,
}

/// Prize for a finishing position, according to the matching scheme items.
fn prize_for(items: &[prize_scheme_item::Model], position: Option<i32>) -> f64 {
    position
        .and_then(|position| items.iter().find(|item| item.covers(position)))
        .map_or(0.0, |item| item.prize)
}

/// Generate OAPI documentation for the [`results`] handler.
pub(super) fn results_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get race results.")
        .description(
            "Results are ordered by finishing position, birds without a position come last. \
            Prizes come from the event prize scheme for the race type.",
        )
        .response::<200, Json<Vec<RaceResultData>>>()
        .response_with::<404, Json<Value>, _>(|op| {
            op.description("Race not found.")
                .example(example_error(RaceItemError::RaceNotFound))
        })
}

/// Race results request handler.
pub(super) async fn results(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<RaceResultData>>, RaceItemError> {
    let grant = session.authorize(Resource::Race, Access::Read)?;

    let (race, event) = find_race(&*db, id)
        .await?
        .ok_or(RaceItemError::RaceNotFound)?;

    grant.check(owner_of(&event))?;

    let prizes = prize_scheme_item::Entity::find()
        .filter(prize_scheme_item::Column::PrizeSchemeId.eq(event.prize_scheme_id))
        .filter(prize_scheme_item::Column::RaceTypeId.eq(race.race_type_id))
        .order_by_asc(prize_scheme_item::Column::FromPosition)
        .all(&*db)
        .await?;

    let mut items = race_item::Entity::find()
        .find_also_related(bird::Entity)
        .filter(race_item::Column::RaceId.eq(id))
        .order_by_asc(race_item::Column::Id)
        .all(&*db)
        .await?;

    items.sort_by_key(|(item, _)| (item.position.is_none(), item.position, item.id));

    Ok(Json(
        items
            .into_iter()
            .map(|(item, bird)| RaceResultData {
                prize: prize_for(&prizes, item.position),
                entry: (item, bird).into(),
            })
            .collect(),
    ))
}

/// Race item path parameters.
#[derive(Deserialize, JsonSchema)]
pub(super) struct RaceItemPath {
    /// Race identifier.
    id: i64,

    /// Race item identifier.
    item_id: i64,
}

/// Arrival correction request.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct ArrivalCorrectionRequest {
    /// Corrected arrival time as a UNIX timestamp, `null` clears the arrival.
    #[schemars(example = "crate::schema::example_optional_timestamp")]
    arrived_at: Option<i64>,
}

#[derive(Serialize, JsonSchema)]
pub(super) struct RaceItemResponse {
    race_item: RaceItemData,

    #[schemars(example = "crate::schema::example_message")]
    message: String,
}

/// Generate OAPI documentation for the [`correct_arrival`] handler.
pub(super) fn correct_arrival_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Correct bird arrival time.")
        .description(
            "Arrival scans never overwrite a recorded arrival. \
            Use this route to fix a wrong scan before the race is closed.",
        )
        .response::<200, Json<RaceItemResponse>>()
        .response_with::<400, Json<Value>, _>(|op| {
            op.description("Race is closed.")
                .example(example_error(RaceItemError::RaceClosed))
        })
}

/// Arrival correction handler.
pub(super) async fn correct_arrival(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(path): Path<RaceItemPath>,
    ValidatedJson(request): ValidatedJson<ArrivalCorrectionRequest>,
) -> Result<Json<RaceItemResponse>, RaceItemError> {
    let grant = session.authorize(Resource::Race, Access::Write)?;

    let arrived_at = request
        .arrived_at
        .map(db::from_unix_timestamp)
        .transpose()?;

    let (race, event) = find_race(&*db, path.id)
        .await?
        .ok_or(RaceItemError::RaceNotFound)?;

    grant.check(owner_of(&event))?;

    if race.is_closed {
        return Err(RaceItemError::RaceClosed);
    }

    let item = race_item::Entity::find_by_id(path.item_id)
        .filter(race_item::Column::RaceId.eq(race.id))
        .one(&*db)
        .await?
        .ok_or(RaceItemError::ItemNotFound)?;

    let previous = item.arrived_at.map(db::unix_timestamp);

    let mut model: race_item::ActiveModel = item.into();
    model.arrived_at = ActiveValue::Set(arrived_at);
    let model = model.update(&*db).await?;

    info!(
        race_id = race.id,
        race_item_id = model.id,
        ?previous,
        arrived_at = ?request.arrived_at,
        "arrival time corrected"
    );

    Ok(Json(RaceItemResponse {
        race_item: model.into(),
        message: String::from("Arrival time updated successfully"),
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_json::assert_json;
    use axum::http::StatusCode;
    use db::{race_item, user::Role, ActiveModelTrait, ActiveValue};
    use serde_json::json;
    use tower::Service;

    use crate::testing::{
        authorized, authorized_json, create_bird, create_database, create_event,
        create_fee_scheme, create_inventory, create_prize_scheme, create_race, create_race_item,
        create_race_type, create_simple_event, create_user, register_bird, test_router,
        ResponseBodyExt,
    };

    #[tokio::test]
    async fn enroll_registered_birds() {
        let db = Arc::new(create_database().await);

        let (admin, token) = create_user(&db, Role::Admin).await;
        let (breeder, _) = create_user(&db, Role::Breeder).await;
        let race_type = create_race_type(&db, "Sprint").await;
        let event = create_simple_event(&db, admin.id).await;
        let inventory = create_inventory(&db, event.id, breeder.id, 5).await;
        let race = create_race(&db, event.id, race_type.id, admin.id, false).await;

        let first = create_bird(&db, breeder.id, "00001").await;
        let second = create_bird(&db, breeder.id, "00002").await;
        let outsider = create_bird(&db, breeder.id, "00003").await;
        register_bird(&db, &inventory, first.id).await;
        register_bird(&db, &inventory, second.id).await;
        create_race_item(&db, race.id, first.id).await;

        let mut service = test_router(db.clone());
        let uri = format!("/races/{}/items", race.id);

        let response = service
            .call(authorized_json(
                "POST",
                &uri,
                &token,
                json!({ "bird_ids": [first.id, second.id, outsider.id] }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = service
            .call(authorized_json(
                "POST",
                &uri,
                &token,
                json!({ "bird_ids": [first.id, second.id] }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.json().await;
        assert_eq!(body["enrolled"], 1);
        assert_eq!(body["items"].as_array().unwrap().len(), 2);

        let response = service.call(authorized("GET", &uri, &token)).await.unwrap();

        let body = response.json().await;
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["band"], "PHA-2024-MNL-00001");
        assert_eq!(body[1]["bird_id"], second.id);
    }

    #[tokio::test]
    async fn results_with_prizes() {
        let db = Arc::new(create_database().await);

        let (admin, token) = create_user(&db, Role::Admin).await;
        let (breeder, _) = create_user(&db, Role::Breeder).await;
        let race_type = create_race_type(&db, "Sprint").await;
        let fees = create_fee_scheme(&db, admin.id, 0.0, &[]).await;
        let prizes = create_prize_scheme(
            &db,
            admin.id,
            &[(race_type.id, 1, 1, 500.0), (race_type.id, 2, 3, 100.0)],
        )
        .await;
        let event = create_event(&db, admin.id, fees.id, prizes.id).await;
        let race = create_race(&db, event.id, race_type.id, admin.id, false).await;

        let mut items = Vec::new();

        let positions = [
            ("00001", Some(4)),
            ("00002", Some(1)),
            ("00003", None),
            ("00004", Some(2)),
        ];

        for (serial, position) in positions {
            let bird = create_bird(&db, breeder.id, serial).await;
            let item = create_race_item(&db, race.id, bird.id).await;

            race_item::ActiveModel {
                id: ActiveValue::Unchanged(item.id),
                position: ActiveValue::Set(position),
                ..Default::default()
            }
            .update(&*db)
            .await
            .unwrap();

            items.push(item);
        }

        let mut service = test_router(db.clone());

        let response = service
            .call(authorized(
                "GET",
                &format!("/races/{}/results", race.id),
                &token,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.json().await;
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 4);

        assert_eq!(rows[0]["id"], items[1].id);
        assert_eq!(rows[0]["prize"], 500.0);
        assert_eq!(rows[1]["id"], items[3].id);
        assert_eq!(rows[1]["prize"], 100.0);
        assert_eq!(rows[2]["id"], items[0].id);
        assert_eq!(rows[2]["prize"], 0.0);
        assert_eq!(rows[3]["id"], items[2].id);
        assert!(rows[3]["position"].is_null());
        assert_eq!(rows[3]["prize"], 0.0);
    }

    #[tokio::test]
    async fn arrival_correction() {
        let db = Arc::new(create_database().await);

        let (admin, token) = create_user(&db, Role::Admin).await;
        let (breeder, _) = create_user(&db, Role::Breeder).await;
        let race_type = create_race_type(&db, "Sprint").await;
        let event = create_simple_event(&db, admin.id).await;
        let race = create_race(&db, event.id, race_type.id, admin.id, true).await;
        let other_race = create_race(&db, event.id, race_type.id, admin.id, true).await;
        let bird = create_bird(&db, breeder.id, "00001").await;
        let item = create_race_item(&db, race.id, bird.id).await;

        let mut service = test_router(db.clone());

        let response = service
            .call(authorized_json(
                "PUT",
                &format!("/races/{}/items/{}/arrival", race.id, item.id),
                &token,
                json!({ "arrived_at": 1709294400 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.json().await["race_item"]["arrived_at"], 1709294400);

        let response = service
            .call(authorized_json(
                "PUT",
                &format!("/races/{}/items/{}/arrival", race.id, item.id),
                &token,
                json!({ "arrived_at": null }),
            ))
            .await
            .unwrap();

        assert!(response.json().await["race_item"]["arrived_at"].is_null());

        let response = service
            .call(authorized_json(
                "PUT",
                &format!("/races/{}/items/{}/arrival", other_race.id, item.id),
                &token,
                json!({ "arrived_at": 1709294400 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_json!(response.json().await, {
            "code": 404,
            "error": "race item not found",
        });
    }
}

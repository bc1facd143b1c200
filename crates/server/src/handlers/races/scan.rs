use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    bird, race_item, sea_query::Condition, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DbErr, EntityTrait, PrimitiveDateTime, QueryFilter, QueryOrder, QuerySelect,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use validator::Validate;

use super::{find_race, owner_of, RaceItemData};
use crate::{
    auth::SessionContext,
    policy::{Access, Forbidden, Resource},
    scanner::{self, ScannerTimestampError},
    schema::example_error,
    validation::ValidatedJson,
};

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum ScanError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "race not found")]
    RaceNotFound,

    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "race is not live")]
    RaceNotLive,

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "bird not found")]
    BirdNotFound,

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "bird is not enrolled in the race")]
    NotEnrolled,

    #[status(StatusCode::BAD_REQUEST)]
    InvalidTimestamp(ScannerTimestampError),
}

/// Arrival scan reported by a loft scanner.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct ScanRequest {
    /// Scanned band or RFID tag.
    #[validate(length(min = 1, max = 64))]
    #[schemars(example = "crate::schema::example_band")]
    ring_no: String,

    /// Arrival time in the `YYYYMMDDHHMMSS` format, UTC.
    #[schemars(example = "crate::schema::example_scanner_timestamp")]
    timestamp: String,

    /// Scanner antenna identifier.
    #[serde(default)]
    #[validate(length(max = 64))]
    antenna: Option<String>,
}

#[derive(Serialize, JsonSchema)]
pub(super) struct ScanResponse {
    #[schemars(example = "crate::schema::example_message")]
    message: String,

    /// Whether this scan recorded the arrival.
    is_new_arrival: bool,

    race_item: RaceItemData,
}

/// Generate OAPI documentation for the [`scan`] handler.
pub(super) fn docs(op: TransformOperation) -> TransformOperation {
    op.summary("Record bird arrival scan.")
        .description(
            "Birds are matched by band or RFID tag. \
            Only the first scan of a bird is recorded, repeated scans are acknowledged \
            without changing the arrival time.",
        )
        .response::<200, Json<ScanResponse>>()
        .response_with::<400, Json<Value>, _>(|op| {
            op.description("Race is not live, or the timestamp is invalid.")
                .example(example_error(ScanError::RaceNotLive))
        })
        .response_with::<404, Json<Value>, _>(|op| {
            op.description("Race or bird not found.")
                .example(example_error(ScanError::NotEnrolled))
        })
}

/// Store the arrival time unless the item already has one.
///
/// Returns the stored item and whether this call recorded the arrival.
async fn record_arrival<C: ConnectionTrait>(
    db: &C,
    item: race_item::Model,
    arrived_at: PrimitiveDateTime,
) -> Result<(race_item::Model, bool), ScanError> {
    if item.arrived_at.is_some() {
        return Ok((item, false));
    }

    let updated = race_item::Entity::update_many()
        .col_expr(race_item::Column::ArrivedAt, Some(arrived_at).into())
        .filter(race_item::Column::Id.eq(item.id))
        .filter(race_item::Column::ArrivedAt.is_null())
        .exec(db)
        .await?
        .rows_affected;

    let model = race_item::Entity::find_by_id(item.id)
        .one(db)
        .await?
        .ok_or(ScanError::NotEnrolled)?;

    Ok((model, updated > 0))
}

/// Arrival scan handler.
pub(super) async fn scan(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<ScanRequest>,
) -> Result<Json<ScanResponse>, ScanError> {
    let grant = session.authorize(Resource::Race, Access::Write)?;

    let (race, event) = find_race(&*db, id)
        .await?
        .ok_or(ScanError::RaceNotFound)?;

    grant.check(owner_of(&event))?;

    if !race.is_live {
        return Err(ScanError::RaceNotLive);
    }

    let bird_ids = bird::Entity::find()
        .select_only()
        .column(bird::Column::Id)
        .filter(
            Condition::any()
                .add(bird::Column::Band.eq(&*request.ring_no))
                .add(bird::Column::Rfid.eq(&*request.ring_no)),
        )
        .into_tuple::<i64>()
        .all(&*db)
        .await?;

    if bird_ids.is_empty() {
        return Err(ScanError::BirdNotFound);
    }

    let item = race_item::Entity::find()
        .filter(race_item::Column::RaceId.eq(race.id))
        .filter(race_item::Column::BirdId.is_in(bird_ids))
        .order_by_asc(race_item::Column::Id)
        .one(&*db)
        .await?
        .ok_or(ScanError::NotEnrolled)?;

    let arrived_at = scanner::parse_timestamp(&request.timestamp)?;

    debug!(
        race_id = race.id,
        ring_no = %request.ring_no,
        antenna = ?request.antenna,
        "arrival scan received"
    );

    let (model, is_new_arrival) = record_arrival(&*db, item, arrived_at).await?;

    if !is_new_arrival {
        return Ok(Json(ScanResponse {
            message: String::from("Bird already scanned"),
            is_new_arrival: false,
            race_item: model.into(),
        }));
    }

    info!(
        race_id = race.id,
        race_item_id = model.id,
        bird_id = model.bird_id,
        antenna = ?request.antenna,
        "arrival recorded"
    );

    Ok(Json(ScanResponse {
        message: String::from("Arrival recorded"),
        is_new_arrival: true,
        race_item: model.into(),
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_json::assert_json;
    use axum::http::StatusCode;
    use db::{race_item, user::Role, ActiveModelTrait, ActiveValue, EntityTrait};
    use serde_json::json;
    use tower::Service;

    use super::record_arrival;
    use crate::testing::{
        authorized_json, create_bird, create_database, create_race, create_race_item,
        create_race_type, create_simple_event, create_user, test_router, ResponseBodyExt,
    };

    #[tokio::test]
    async fn double_scan_is_idempotent() {
        let db = Arc::new(create_database().await);

        let (admin, token) = create_user(&db, Role::Admin).await;
        let (breeder, _) = create_user(&db, Role::Breeder).await;
        let race_type = create_race_type(&db, "Sprint").await;
        let event = create_simple_event(&db, admin.id).await;
        let race = create_race(&db, event.id, race_type.id, admin.id, true).await;
        let bird = create_bird(&db, breeder.id, "00001").await;
        let item = create_race_item(&db, race.id, bird.id).await;

        let mut service = test_router(db.clone());
        let uri = format!("/races/{}/scan", race.id);

        let response = service
            .call(authorized_json(
                "POST",
                &uri,
                &token,
                json!({
                    "ring_no": "PHA-2024-MNL-00001",
                    "timestamp": "20240301120000",
                    "antenna": "A1",
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.json().await;
        assert_eq!(body["message"], "Arrival recorded");
        assert_eq!(body["is_new_arrival"], true);
        assert_eq!(body["race_item"]["arrived_at"], 1709294400);

        let response = service
            .call(authorized_json(
                "POST",
                &uri,
                &token,
                json!({ "ring_no": "RFID00001", "timestamp": "20240301123000" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.json().await;
        assert_eq!(body["message"], "Bird already scanned");
        assert_eq!(body["is_new_arrival"], false);
        assert_eq!(body["race_item"]["arrived_at"], 1709294400);

        let stored = race_item::Entity::find_by_id(item.id)
            .one(&*db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.arrived_at.map(db::unix_timestamp), Some(1709294400));
    }

    #[tokio::test]
    async fn rejected_scans() {
        let db = Arc::new(create_database().await);

        let (admin, token) = create_user(&db, Role::Admin).await;
        let (breeder, _) = create_user(&db, Role::Breeder).await;
        let race_type = create_race_type(&db, "Sprint").await;
        let event = create_simple_event(&db, admin.id).await;
        let idle = create_race(&db, event.id, race_type.id, admin.id, false).await;
        let live = create_race(&db, event.id, race_type.id, admin.id, true).await;
        let enrolled = create_bird(&db, breeder.id, "00001").await;
        create_bird(&db, breeder.id, "00002").await;
        create_race_item(&db, idle.id, enrolled.id).await;
        create_race_item(&db, live.id, enrolled.id).await;

        let mut service = test_router(db.clone());

        let scan = |race_id: i64, ring_no: &str, timestamp: &str| {
            authorized_json(
                "POST",
                &format!("/races/{race_id}/scan"),
                &token,
                json!({ "ring_no": ring_no, "timestamp": timestamp }),
            )
        };

        let response = service
            .call(scan(idle.id, "PHA-2024-MNL-00001", "20240301120000"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_json!(response.json().await, {
            "code": 400,
            "error": "race is not live",
        });

        let response = service
            .call(scan(live.id, "PHA-2024-MNL-99999", "20240301120000"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = service
            .call(scan(live.id, "PHA-2024-MNL-00002", "20240301120000"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_json!(response.json().await, {
            "code": 404,
            "error": "bird is not enrolled in the race",
        });

        for timestamp in ["2024030112000", "2024030112000a", "20241301120000"] {
            let response = service
                .call(scan(live.id, "PHA-2024-MNL-00001", timestamp))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{timestamp}");
        }

        let response = service
            .call(scan(999, "PHA-2024-MNL-00001", "20240301120000"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn arrival_is_recorded_once() {
        let db = create_database().await;

        let (admin, _) = create_user(&db, Role::Admin).await;
        let (breeder, _) = create_user(&db, Role::Breeder).await;
        let race_type = create_race_type(&db, "Sprint").await;
        let event = create_simple_event(&db, admin.id).await;
        let race = create_race(&db, event.id, race_type.id, admin.id, true).await;
        let bird = create_bird(&db, breeder.id, "00001").await;
        let stale = create_race_item(&db, race.id, bird.id).await;

        let first = db::from_unix_timestamp(1709294400).unwrap();
        let second = db::from_unix_timestamp(1709296200).unwrap();

        // Another scan stores its arrival after this item was loaded.
        let mut model: race_item::ActiveModel = stale.clone().into();
        model.arrived_at = ActiveValue::Set(Some(first));
        model.update(&db).await.unwrap();

        let (stored, is_new_arrival) = record_arrival(&db, stale.clone(), second).await.unwrap();

        assert!(!is_new_arrival);
        assert_eq!(stored.arrived_at, Some(first));

        let stored = race_item::Entity::find_by_id(stale.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.arrived_at, Some(first));
    }
}

use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    race, race_item, ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use serde_json::Value;
use tracing::info;

use super::{find_race, owner_of, RaceResponse};
use crate::{
    auth::SessionContext,
    policy::{Access, Forbidden, Resource},
    schema::example_error,
};

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum RaceLifecycleError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "race not found")]
    RaceNotFound,

    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "race is already live")]
    AlreadyLive,

    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "race is closed")]
    RaceClosed,

    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "race is not live")]
    NotLive,
}

/// Generate OAPI documentation for the [`start`] handler.
pub(super) fn start_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Start race.")
        .description("Arrival scans are accepted only while a race is live.")
        .response::<200, Json<RaceResponse>>()
        .response_with::<400, Json<Value>, _>(|op| {
            op.description("Race is already live or closed.")
                .example(example_error(RaceLifecycleError::AlreadyLive))
        })
}

/// Race start handler.
pub(super) async fn start(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<RaceResponse>, RaceLifecycleError> {
    let grant = session.authorize(Resource::Race, Access::Write)?;

    let (race, event) = find_race(&*db, id)
        .await?
        .ok_or(RaceLifecycleError::RaceNotFound)?;

    grant.check(owner_of(&event))?;

    if race.is_closed {
        return Err(RaceLifecycleError::RaceClosed);
    }

    if race.is_live {
        return Err(RaceLifecycleError::AlreadyLive);
    }

    let mut model: race::ActiveModel = race.into();
    model.is_live = ActiveValue::Set(true);
    let model = model.update(&*db).await?;

    info!(race_id = model.id, "race started");

    Ok(Json(RaceResponse {
        race: model.into(),
        message: String::from("Race started successfully"),
    }))
}

/// Order race items by finishing position.
///
/// Earlier arrivals come first, equal arrival times are ordered by item
/// identifier. Items without an arrival time are left out.
fn finishing_order(items: &[race_item::Model]) -> Vec<i64> {
    let mut arrived = items
        .iter()
        .filter_map(|item| item.arrived_at.map(|arrived_at| (arrived_at, item.id)))
        .collect::<Vec<_>>();

    arrived.sort_unstable();

    arrived.into_iter().map(|(_, id)| id).collect()
}

/// Generate OAPI documentation for the [`close`] handler.
pub(super) fn close_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Close race.")
        .description(
            "Finishing positions are assigned by arrival time, starting from 1. \
            Birds that did not arrive get no position.",
        )
        .response::<200, Json<RaceResponse>>()
        .response_with::<400, Json<Value>, _>(|op| {
            op.description("Race is not live.")
                .example(example_error(RaceLifecycleError::NotLive))
        })
}

/// Race close handler.
pub(super) async fn close(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<RaceResponse>, RaceLifecycleError> {
    let grant = session.authorize(Resource::Race, Access::Write)?;

    db.transaction(|txn| {
        Box::pin(async move {
            let (race, event) = find_race(txn, id)
                .await?
                .ok_or(RaceLifecycleError::RaceNotFound)?;

            grant.check(owner_of(&event))?;

            if !race.is_live {
                return Err(RaceLifecycleError::NotLive);
            }

            let items = race_item::Entity::find()
                .filter(race_item::Column::RaceId.eq(id))
                .all(txn)
                .await?;

            let order = finishing_order(&items);

            for (position, item_id) in (1..).zip(&order) {
                race_item::ActiveModel {
                    id: ActiveValue::Unchanged(*item_id),
                    position: ActiveValue::Set(Some(position)),
                    ..Default::default()
                }
                .update(txn)
                .await?;
            }

            let mut model: race::ActiveModel = race.into();
            model.is_live = ActiveValue::Set(false);
            model.is_closed = ActiveValue::Set(true);
            let model = model.update(txn).await?;

            info!(
                race_id = model.id,
                arrived = order.len(),
                enrolled = items.len(),
                "race closed"
            );

            Ok(Json(RaceResponse {
                race: model.into(),
                message: String::from("Race closed successfully"),
            }))
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
    use db::{race_item, user::Role, ActiveModelTrait, ActiveValue, EntityTrait, QueryOrder};
    use tower::Service;

    use super::finishing_order;
    use crate::testing::{
        authorized, create_bird, create_database, create_race, create_race_item,
        create_race_type, create_simple_event, create_user, test_router, ResponseBodyExt,
    };

    fn item(id: i64, arrived_at: Option<i64>) -> race_item::Model {
        race_item::Model {
            id,
            race_id: 1,
            bird_id: id,
            arrived_at: arrived_at.map(|value| db::from_unix_timestamp(value).unwrap()),
            position: None,
            loft_basket_id: None,
            is_loft_basketed: false,
            race_basket_id: None,
            is_race_basketed: false,
            race_basketed_at: None,
            created_at: db::now(),
        }
    }

    #[test]
    fn finishing_order_by_arrival() {
        let items = [
            item(1, Some(1709294500)),
            item(2, None),
            item(3, Some(1709294400)),
            item(4, Some(1709294500)),
        ];

        assert_eq!(finishing_order(&items), vec![3, 1, 4]);
        assert!(finishing_order(&[]).is_empty());
    }

    #[tokio::test]
    async fn race_lifecycle() {
        let db = Arc::new(create_database().await);

        let (admin, token) = create_user(&db, Role::Admin).await;
        let (breeder, _) = create_user(&db, Role::Breeder).await;
        let race_type = create_race_type(&db, "Sprint").await;
        let event = create_simple_event(&db, admin.id).await;
        let race = create_race(&db, event.id, race_type.id, admin.id, false).await;

        let first = create_bird(&db, breeder.id, "00001").await;
        let second = create_bird(&db, breeder.id, "00002").await;
        let missing = create_bird(&db, breeder.id, "00003").await;

        let late = create_race_item(&db, race.id, first.id).await;
        let early = create_race_item(&db, race.id, second.id).await;
        create_race_item(&db, race.id, missing.id).await;

        for (item, arrived_at) in [(&late, 1709298000), (&early, 1709297000)] {
            race_item::ActiveModel {
                id: ActiveValue::Unchanged(item.id),
                arrived_at: ActiveValue::Set(Some(db::from_unix_timestamp(arrived_at).unwrap())),
                ..Default::default()
            }
            .update(&*db)
            .await
            .unwrap();
        }

        let mut service = test_router(db.clone());
        let close = format!("/races/{}/close", race.id);
        let start = format!("/races/{}/start", race.id);

        let response = service
            .call(authorized("POST", &close, &token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_json!(response.json().await, {
            "code": 400,
            "error": "race is not live",
        });

        let response = service
            .call(authorized("POST", &start, &token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.json().await["race"]["is_live"], true);

        let response = service
            .call(authorized("POST", &start, &token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = service
            .call(authorized("POST", &close, &token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.json().await;
        assert_eq!(body["race"]["is_live"], false);
        assert_eq!(body["race"]["is_closed"], true);

        let positions = race_item::Entity::find()
            .order_by_asc(race_item::Column::Id)
            .all(&*db)
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.position)
            .collect::<Vec<_>>();

        assert_eq!(positions, vec![Some(2), Some(1), None]);

        let response = service
            .call(authorized("POST", &start, &token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_json!(response.json().await, {
            "code": 400,
            "error": "race is closed",
        });
    }
}

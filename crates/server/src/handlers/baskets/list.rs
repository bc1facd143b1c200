use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    basket, event, race, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, QueryTrait,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{find_basket, owner_of, BasketData};
use crate::{
    auth::SessionContext,
    pagination::Pagination,
    policy::{Access, Forbidden, OwnedBy, Resource},
    schema::example_error,
};

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum BasketQueryError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "basket not found")]
    BasketNotFound,
}

/// Basket list filters.
#[derive(Deserialize, JsonSchema)]
pub(super) struct BasketListQuery {
    /// Only list baskets of the provided race.
    #[serde(default)]
    race_id: Option<i64>,
}

/// Generate OAPI documentation for the [`list`] handler.
pub(super) fn list_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get list of baskets.")
        .description("Baskets are sorted by race, type and number.")
        .response::<200, Json<Vec<BasketData>>>()
}

/// Basket list request handler.
pub(super) async fn list(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Query(pagination): Query<Pagination>,
    Query(filter): Query<BasketListQuery>,
) -> Result<Json<Vec<BasketData>>, BasketQueryError> {
    let grant = session.authorize(Resource::Basket, Access::Read)?;

    let mut query = basket::Entity::find();

    if let Some(OwnedBy::Creator(user_id)) = grant.owned_by() {
        query = query.filter(
            basket::Column::RaceId.in_subquery(
                race::Entity::find()
                    .select_only()
                    .column(race::Column::Id)
                    .filter(
                        race::Column::EventId.in_subquery(
                            event::Entity::find()
                                .select_only()
                                .column(event::Column::Id)
                                .filter(event::Column::CreatedBy.eq(user_id))
                                .into_query(),
                        ),
                    )
                    .into_query(),
            ),
        );
    }

    if let Some(race_id) = filter.race_id {
        query = query.filter(basket::Column::RaceId.eq(race_id));
    }

    let baskets = query
        .order_by_asc(basket::Column::RaceId)
        .order_by_asc(basket::Column::IsRaceBasket)
        .order_by_asc(basket::Column::Number)
        .limit(pagination.limit())
        .offset(pagination.offset())
        .all(&*db)
        .await?;

    Ok(Json(baskets.into_iter().map(BasketData::from).collect()))
}

/// Generate OAPI documentation for the [`details`] handler.
pub(super) fn details_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get basket details.")
        .response::<200, Json<BasketData>>()
        .response_with::<404, Json<Value>, _>(|op| {
            op.description("Basket not found.")
                .example(example_error(BasketQueryError::BasketNotFound))
        })
}

/// Basket details request handler.
pub(super) async fn details(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<BasketData>, BasketQueryError> {
    let grant = session.authorize(Resource::Basket, Access::Read)?;

    let (basket, event) = find_basket(&*db, id)
        .await?
        .ok_or(BasketQueryError::BasketNotFound)?;

    grant.check(owner_of(&event))?;

    Ok(Json(basket.into()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use db::user::Role;
    use tower::Service;

    use crate::testing::{
        authorized, create_basket, create_database, create_race, create_race_type,
        create_simple_event, create_user, test_router, ResponseBodyExt,
    };

    #[tokio::test]
    async fn basket_visibility() {
        let db = Arc::new(create_database().await);

        let (admin, token) = create_user(&db, Role::Admin).await;
        let (other, _) = create_user(&db, Role::Admin).await;
        let (_, breeder_token) = create_user(&db, Role::Breeder).await;
        let race_type = create_race_type(&db, "Sprint").await;

        let event = create_simple_event(&db, admin.id).await;
        let other_event = create_simple_event(&db, other.id).await;
        let race = create_race(&db, event.id, race_type.id, admin.id, false).await;
        let other_race = create_race(&db, other_event.id, race_type.id, other.id, false).await;

        create_basket(&db, race.id, 2, true, admin.id).await;
        create_basket(&db, race.id, 1, false, admin.id).await;
        let foreign = create_basket(&db, other_race.id, 1, true, other.id).await;

        let mut service = test_router(db.clone());

        let response = service
            .call(authorized("GET", "/baskets", &token))
            .await
            .unwrap();

        let body = response.json().await;
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["basket_type"], "loft");
        assert_eq!(body[1]["basket_type"], "race");
        assert_eq!(body[1]["number"], 2);

        let response = service
            .call(authorized(
                "GET",
                &format!("/baskets/{}", foreign.id),
                &token,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = service
            .call(authorized("GET", "/baskets", &breeder_token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    event, event_inventory, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, QueryTrait,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::Deserialize;

use super::InventoryData;
use crate::{
    auth::SessionContext,
    pagination::Pagination,
    policy::{Access, Forbidden, OwnedBy, Resource},
};

/// Inventory list filters.
#[derive(Deserialize, JsonSchema)]
pub(super) struct InventoryListQuery {
    /// Only list inventories of the provided event.
    #[serde(default)]
    event_id: Option<i64>,
}

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum InventoryListError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),
}

/// Generate OAPI documentation for the [`list`] handler.
pub(super) fn docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get list of event inventories.")
        .description(
            "Breeders see their own inventories, administrators see inventories of their events.",
        )
        .response::<200, Json<Vec<InventoryData>>>()
}

/// Event inventory list request handler.
pub(super) async fn list(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Query(pagination): Query<Pagination>,
    Query(filter): Query<InventoryListQuery>,
) -> Result<Json<Vec<InventoryData>>, InventoryListError> {
    let grant = session.authorize(Resource::EventInventory, Access::Read)?;

    let mut query = event_inventory::Entity::find();

    match grant.owned_by() {
        Some(OwnedBy::Breeder(user_id)) => {
            query = query.filter(event_inventory::Column::BreederId.eq(user_id));
        }
        Some(OwnedBy::Creator(user_id)) => {
            query = query.filter(
                event_inventory::Column::EventId.in_subquery(
                    event::Entity::find()
                        .select_only()
                        .column(event::Column::Id)
                        .filter(event::Column::CreatedBy.eq(user_id))
                        .into_query(),
                ),
            );
        }
        None => {}
    }

    if let Some(event_id) = filter.event_id {
        query = query.filter(event_inventory::Column::EventId.eq(event_id));
    }

    let inventories = query
        .order_by_asc(event_inventory::Column::Id)
        .limit(pagination.limit())
        .offset(pagination.offset())
        .all(&*db)
        .await?;

    Ok(Json(
        inventories.into_iter().map(InventoryData::from).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use db::user::Role;
    use tower::Service;

    use crate::testing::{
        authorized, create_database, create_inventory, create_simple_event, create_user,
        test_router, ResponseBodyExt,
    };

    #[tokio::test]
    async fn scoped_inventories() {
        let db = Arc::new(create_database().await);

        let (admin, admin_token) = create_user(&db, Role::Admin).await;
        let (other_admin, _) = create_user(&db, Role::Admin).await;
        let (breeder, breeder_token) = create_user(&db, Role::Breeder).await;
        let (other_breeder, _) = create_user(&db, Role::Breeder).await;

        let event = create_simple_event(&db, admin.id).await;
        let other_event = create_simple_event(&db, other_admin.id).await;

        let own = create_inventory(&db, event.id, breeder.id, 5).await;
        create_inventory(&db, event.id, other_breeder.id, 5).await;
        create_inventory(&db, other_event.id, breeder.id, 5).await;

        let mut service = test_router(db.clone());

        let response = service
            .call(authorized("GET", "/eventInventories", &admin_token))
            .await
            .unwrap();

        let body = response.json().await;
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert!(body
            .as_array()
            .unwrap()
            .iter()
            .all(|inventory| inventory["event_id"] == event.id));

        let response = service
            .call(authorized(
                "GET",
                &format!("/eventInventories?event_id={}", event.id),
                &breeder_token,
            ))
            .await
            .unwrap();

        let body = response.json().await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["id"], own.id);
    }
}

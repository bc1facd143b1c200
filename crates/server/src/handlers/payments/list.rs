use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    event, event_inventory, payment, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, QueryTrait,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::Deserialize;

use super::PaymentData;
use crate::{
    auth::SessionContext,
    pagination::Pagination,
    policy::{Access, Forbidden, OwnedBy, Resource},
};

/// Payment list filters.
#[derive(Deserialize, JsonSchema)]
pub(super) struct PaymentListQuery {
    /// Only list payments of the provided event inventory.
    #[serde(default)]
    event_inventory_id: Option<i64>,
}

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum PaymentListError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),
}

/// Generate OAPI documentation for the [`list`] handler.
pub(super) fn docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get list of payments.")
        .description(
            "Breeders see their own payments, administrators see payments of their events.",
        )
        .response::<200, Json<Vec<PaymentData>>>()
}

/// Payment list request handler.
pub(super) async fn list(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Query(pagination): Query<Pagination>,
    Query(filter): Query<PaymentListQuery>,
) -> Result<Json<Vec<PaymentData>>, PaymentListError> {
    let grant = session.authorize(Resource::Payment, Access::Read)?;

    let mut query = payment::Entity::find();

    match grant.owned_by() {
        Some(OwnedBy::Breeder(user_id)) => {
            query = query.filter(payment::Column::BreederId.eq(user_id));
        }
        Some(OwnedBy::Creator(user_id)) => {
            query = query.filter(
                payment::Column::EventInventoryId.in_subquery(
                    event_inventory::Entity::find()
                        .select_only()
                        .column(event_inventory::Column::Id)
                        .filter(
                            event_inventory::Column::EventId.in_subquery(
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
        None => {}
    }

    if let Some(event_inventory_id) = filter.event_inventory_id {
        query = query.filter(payment::Column::EventInventoryId.eq(event_inventory_id));
    }

    let payments = query
        .order_by_asc(payment::Column::Id)
        .limit(pagination.limit())
        .offset(pagination.offset())
        .all(&*db)
        .await?;

    Ok(Json(payments.into_iter().map(PaymentData::from).collect()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use db::user::Role;
    use tower::Service;

    use crate::testing::{
        authorized, create_database, create_inventory, create_payment, create_simple_event,
        create_user, test_router, ResponseBodyExt,
    };

    #[tokio::test]
    async fn scoped_payments() {
        let db = Arc::new(create_database().await);

        let (admin, admin_token) = create_user(&db, Role::Admin).await;
        let (other_admin, _) = create_user(&db, Role::Admin).await;
        let (breeder, breeder_token) = create_user(&db, Role::Breeder).await;
        let (other_breeder, _) = create_user(&db, Role::Breeder).await;

        let event = create_simple_event(&db, admin.id).await;
        let other_event = create_simple_event(&db, other_admin.id).await;

        let own = create_inventory(&db, event.id, breeder.id, 5).await;
        let foreign = create_inventory(&db, event.id, other_breeder.id, 5).await;
        let elsewhere = create_inventory(&db, other_event.id, breeder.id, 5).await;

        create_payment(&db, &own, 10.0).await;
        create_payment(&db, &foreign, 20.0).await;
        create_payment(&db, &elsewhere, 30.0).await;

        let mut service = test_router(db.clone());

        let response = service
            .call(authorized("GET", "/payments", &admin_token))
            .await
            .unwrap();

        let body = response.json().await;
        assert_eq!(body.as_array().unwrap().len(), 2);

        let response = service
            .call(authorized("GET", "/payments", &breeder_token))
            .await
            .unwrap();

        let body = response.json().await;
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert!(body
            .as_array()
            .unwrap()
            .iter()
            .all(|payment| payment["breeder_id"] == breeder.id));

        let response = service
            .call(authorized(
                "GET",
                &format!("/payments?event_inventory_id={}", own.id),
                &breeder_token,
            ))
            .await
            .unwrap();

        let body = response.json().await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["amount_to_pay"], 10.0);
    }
}

use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    betting_scheme, event, event_inventory, event_type, fee_scheme, prize_scheme, race,
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, PrimitiveDateTime, QueryFilter, QuerySelect, SelectExt, TransactionErrorExt,
    TransactionTrait,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use time::error::ComponentRange;
use validator::Validate;

use super::EventResponse;
use crate::{
    auth::SessionContext,
    handlers::MessageResponse,
    policy::{Access, Forbidden, Owner, Resource},
    schema::example_error,
    validation::ValidatedJson,
};

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum EventManagementError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "event not found")]
    EventNotFound,

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "event type not found")]
    EventTypeNotFound,

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "fee scheme not found")]
    FeeSchemeNotFound,

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "prize scheme not found")]
    PrizeSchemeNotFound,

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "betting scheme not found")]
    BettingSchemeNotFound,

    /// Provided timestamp can not be represented.
    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "invalid timestamp: {_0}")]
    InvalidTimestamp(ComponentRange),

    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "event must not end before it starts")]
    InvalidSchedule,

    /// Registrations or races of the event still exist.
    #[status(StatusCode::CONFLICT)]
    #[display(fmt = "event has registrations or races")]
    EventInUse,
}

/// Event creation and update request.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct EventRequest {
    #[validate(length(min = 1, max = 128))]
    #[schemars(example = "crate::schema::example_event_name")]
    name: String,

    #[schemars(example = "crate::schema::example_database_identifier")]
    event_type_id: i64,

    #[schemars(example = "crate::schema::example_database_identifier")]
    fee_scheme_id: i64,

    #[schemars(example = "crate::schema::example_database_identifier")]
    prize_scheme_id: i64,

    #[schemars(example = "crate::schema::example_database_identifier")]
    betting_scheme_id: i64,

    /// Whether breeders can register for the event, open by default.
    #[serde(default = "default_open")]
    is_open: bool,

    /// Event start as a UNIX timestamp.
    #[schemars(example = "crate::schema::example_timestamp")]
    starts_at: i64,

    /// Event end as a UNIX timestamp.
    #[schemars(example = "crate::schema::example_timestamp")]
    ends_at: i64,
}

fn default_open() -> bool {
    true
}

impl EventRequest {
    fn schedule(&self) -> Result<(PrimitiveDateTime, PrimitiveDateTime), EventManagementError> {
        let starts_at = db::from_unix_timestamp(self.starts_at)?;
        let ends_at = db::from_unix_timestamp(self.ends_at)?;

        if ends_at < starts_at {
            return Err(EventManagementError::InvalidSchedule);
        }

        Ok((starts_at, ends_at))
    }

    /// Check that every referenced record exists.
    async fn check_references(&self, txn: &DatabaseTransaction) -> Result<(), EventManagementError> {
        if !event_type::Entity::find_by_id(self.event_type_id)
            .select_only()
            .exists(txn)
            .await?
        {
            return Err(EventManagementError::EventTypeNotFound);
        }

        if !fee_scheme::Entity::find_by_id(self.fee_scheme_id)
            .select_only()
            .exists(txn)
            .await?
        {
            return Err(EventManagementError::FeeSchemeNotFound);
        }

        if !prize_scheme::Entity::find_by_id(self.prize_scheme_id)
            .select_only()
            .exists(txn)
            .await?
        {
            return Err(EventManagementError::PrizeSchemeNotFound);
        }

        if !betting_scheme::Entity::find_by_id(self.betting_scheme_id)
            .select_only()
            .exists(txn)
            .await?
        {
            return Err(EventManagementError::BettingSchemeNotFound);
        }

        Ok(())
    }

    fn apply(
        self,
        model: &mut event::ActiveModel,
        (starts_at, ends_at): (PrimitiveDateTime, PrimitiveDateTime),
    ) {
        model.name = ActiveValue::Set(self.name);
        model.event_type_id = ActiveValue::Set(self.event_type_id);
        model.fee_scheme_id = ActiveValue::Set(self.fee_scheme_id);
        model.prize_scheme_id = ActiveValue::Set(self.prize_scheme_id);
        model.betting_scheme_id = ActiveValue::Set(self.betting_scheme_id);
        model.is_open = ActiveValue::Set(self.is_open);
        model.starts_at = ActiveValue::Set(starts_at);
        model.ends_at = ActiveValue::Set(ends_at);
    }
}

/// Generate OAPI documentation for the [`create`] handler.
pub(super) fn create_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create new event.")
        .response::<200, Json<EventResponse>>()
        .response_with::<404, Json<Value>, _>(|op| {
            op.description("Referenced event type or scheme not found.")
                .example(example_error(EventManagementError::FeeSchemeNotFound))
        })
}

/// Event creation handler.
pub(super) async fn create(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    ValidatedJson(request): ValidatedJson<EventRequest>,
) -> Result<Json<EventResponse>, EventManagementError> {
    session.authorize(Resource::Event, Access::Write)?;

    let schedule = request.schedule()?;
    let created_by = session.user_id();

    db.transaction(|txn| {
        Box::pin(async move {
            request.check_references(txn).await?;

            let mut model = event::ActiveModel {
                created_by: ActiveValue::Set(created_by),
                ..Default::default()
            };
            request.apply(&mut model, schedule);

            let model = model.insert(txn).await?;

            Ok(Json(EventResponse {
                event: model.into(),
                message: String::from("Event created successfully"),
            }))
        })
    })
    .await
    .into_raw_result()
}

/// Generate OAPI documentation for the [`update`] handler.
pub(super) fn update_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update event.")
        .response::<200, Json<EventResponse>>()
        .response_with::<404, Json<Value>, _>(|op| {
            op.description("Event not found.")
                .example(example_error(EventManagementError::EventNotFound))
        })
}

/// Event update handler.
pub(super) async fn update(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<EventRequest>,
) -> Result<Json<EventResponse>, EventManagementError> {
    let grant = session.authorize(Resource::Event, Access::Write)?;

    let schedule = request.schedule()?;

    db.transaction(|txn| {
        Box::pin(async move {
            let model = event::Entity::find_by_id(id)
                .one(txn)
                .await?
                .ok_or(EventManagementError::EventNotFound)?;

            grant.check(Owner::creator(model.created_by))?;

            request.check_references(txn).await?;

            let mut model: event::ActiveModel = model.into();
            request.apply(&mut model, schedule);
            let model = model.update(txn).await?;

            Ok(Json(EventResponse {
                event: model.into(),
                message: String::from("Event updated successfully"),
            }))
        })
    })
    .await
    .into_raw_result()
}

/// Generate OAPI documentation for the [`delete`] handler.
pub(super) fn delete_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete event.")
        .response::<200, Json<MessageResponse>>()
        .response_with::<409, Json<Value>, _>(|op| {
            op.description("Event has registrations or races.")
                .example(example_error(EventManagementError::EventInUse))
        })
}

/// Event deletion handler.
pub(super) async fn delete(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, EventManagementError> {
    let grant = session.authorize(Resource::Event, Access::Write)?;

    db.transaction(|txn| {
        Box::pin(async move {
            let model = event::Entity::find_by_id(id)
                .one(txn)
                .await?
                .ok_or(EventManagementError::EventNotFound)?;

            grant.check(Owner::creator(model.created_by))?;

            let has_inventories = event_inventory::Entity::find()
                .select_only()
                .filter(event_inventory::Column::EventId.eq(id))
                .exists(txn)
                .await?;

            let has_races = race::Entity::find()
                .select_only()
                .filter(race::Column::EventId.eq(id))
                .exists(txn)
                .await?;

            if has_inventories || has_races {
                return Err(EventManagementError::EventInUse);
            }

            event::Entity::delete_by_id(id).exec(txn).await?;

            Ok(Json(MessageResponse::new("Event deleted successfully")))
        })
    })
    .await
    .into_raw_result()
}

pub mod basket;
pub mod betting_scheme;
pub mod bird;
pub mod event;
pub mod event_inventory;
pub mod event_inventory_item;
pub mod event_type;
pub mod fee_scheme;
pub mod payment;
pub mod perch_fee_item;
pub mod prize_scheme;
pub mod prize_scheme_item;
pub mod race;
pub mod race_item;
pub mod race_type;
pub mod race_type_fee_scheme;
pub mod race_type_prize_scheme;
pub mod session;
pub mod team;
pub mod user;

use std::error::Error;

use async_trait::async_trait;
pub use sea_orm::{
    sea_query, ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, Database,
    DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, QueryTrait, StatementBuilder, TransactionError,
    TransactionTrait, TryGetableMany,
};
pub use time::{OffsetDateTime, PrimitiveDateTime};

/// Current UTC time without the offset information, as stored in the database.
pub fn now() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();

    PrimitiveDateTime::new(now.date(), now.time())
}

/// Convert a stored timestamp into a UNIX timestamp, as exposed by the API.
pub fn unix_timestamp(value: PrimitiveDateTime) -> i64 {
    value.assume_utc().unix_timestamp()
}

/// Convert a UNIX timestamp received from a client into a storable value.
pub fn from_unix_timestamp(
    timestamp: i64,
) -> Result<PrimitiveDateTime, time::error::ComponentRange> {
    let value = OffsetDateTime::from_unix_timestamp(timestamp)?;

    Ok(PrimitiveDateTime::new(value.date(), value.time()))
}

pub trait TransactionErrorExt<T, E> {
    /// Convert transaction [`Result`] into a [`Result`] with
    /// a custom error.
    fn into_raw_result(self) -> Result<T, E>;
}

impl<T, E> TransactionErrorExt<T, E> for Result<T, TransactionError<E>>
where
    E: Error + From<DbErr>,
{
    fn into_raw_result(self) -> Result<T, E> {
        match self {
            Ok(val) => Ok(val),
            Err(TransactionError::Connection(err)) => Err(err.into()),
            Err(TransactionError::Transaction(err)) => Err(err),
        }
    }
}

#[async_trait]
pub trait SelectExt {
    /// Check if at least one record that satisfies a query.
    async fn exists<C: ConnectionTrait + Send>(self, db: &C) -> Result<bool, DbErr>;
}

#[async_trait]
impl<T> SelectExt for T
where
    T: QueryTrait<QueryStatement = sea_query::SelectStatement> + Send,
{
    async fn exists<C: ConnectionTrait + Send>(self, db: &C) -> Result<bool, DbErr> {
        use sea_query::{Expr, Query};

        let mut query = self.into_query();

        // Fix failing tests with SQLite by returning at least some expr
        query.expr(1);

        let stmt = StatementBuilder::build(
            Query::select().expr(Expr::exists(query)),
            &db.get_database_backend(),
        );

        db.query_one(stmt)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(String::from("exists query result")))?
            .try_get_by_index(0)
    }
}


#[cfg(test)]
mod timestamp_tests {
    use super::{from_unix_timestamp, unix_timestamp};

    #[test]
    fn unix_timestamps_survive_storage() {
        let stored = from_unix_timestamp(1_709_294_400).unwrap();

        assert_eq!(stored.year(), 2024);
        assert_eq!(unix_timestamp(stored), 1_709_294_400);
    }

    #[test]
    fn out_of_range_timestamp() {
        assert!(from_unix_timestamp(i64::MAX).is_err());
    }
}

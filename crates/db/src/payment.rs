//! Payment ledger entry of an event inventory.
//!
//! Payment status is never set directly from client input. It is derived
//! from the paid and owed amounts by [`derive_status`] on every write, unless
//! the payment is explicitly marked as failed or refunded.

use schemars::JsonSchema;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Currency used for payments derived from fee schemes.
pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub event_inventory_id: i64,
    pub breeder_id: i64,
    pub amount_to_pay: f64,
    pub amount_paid: f64,
    pub currency: String,
    pub method: Option<String>,
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
    pub description: Option<String>,
    pub paid_at: Option<TimeDateTime>,
    pub created_at: TimeDateTime,
}

#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[sea_orm(rs_type = "i16", db_type = "Integer")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    /// Flat per-registration fee.
    #[sea_orm(num_value = 0)]
    PerchFee,
    /// Fee that depends on the bird sequence number inside an inventory.
    #[sea_orm(num_value = 1)]
    BirdFee,
    #[sea_orm(num_value = 2)]
    Betting,
    #[sea_orm(num_value = 3)]
    Other,
}

#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[sea_orm(rs_type = "i16", db_type = "Integer")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[sea_orm(num_value = 0)]
    Pending,
    #[sea_orm(num_value = 1)]
    Partial,
    #[sea_orm(num_value = 2)]
    Paid,
    #[sea_orm(num_value = 3)]
    Failed,
    #[sea_orm(num_value = 4)]
    Refunded,
}

impl PaymentStatus {
    /// Check if the status is an explicit override that amounts cannot change.
    pub fn is_override(self) -> bool {
        matches!(self, PaymentStatus::Failed | PaymentStatus::Refunded)
    }
}

/// Derive payment status from the requested status and payment amounts.
///
/// Rules are applied in order:
///
/// 1. [`PaymentStatus::Failed`] and [`PaymentStatus::Refunded`] requests are kept verbatim.
/// 2. Nothing paid yet results in [`PaymentStatus::Pending`].
/// 3. Paid amount covering the owed amount results in [`PaymentStatus::Paid`].
/// 4. Anything else is [`PaymentStatus::Partial`].
///
/// ## Example
///
/// ```
/// use db::payment::{derive_status, PaymentStatus};
///
/// assert_eq!(derive_status(None, 5.0, 10.0), PaymentStatus::Partial);
/// assert_eq!(derive_status(Some(PaymentStatus::Refunded), 10.0, 10.0), PaymentStatus::Refunded);
/// ```
pub fn derive_status(
    requested: Option<PaymentStatus>,
    amount_paid: f64,
    amount_to_pay: f64,
) -> PaymentStatus {
    match requested {
        Some(status) if status.is_override() => status,
        _ if amount_paid <= 0.0 => PaymentStatus::Pending,
        _ if amount_paid >= amount_to_pay => PaymentStatus::Paid,
        _ => PaymentStatus::Partial,
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::event_inventory::Entity",
        from = "Column::EventInventoryId",
        to = "super::event_inventory::Column::Id"
    )]
    EventInventory,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::BreederId",
        to = "super::user::Column::Id"
    )]
    Breeder,
}

impl Related<super::event_inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EventInventory.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Breeder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::{derive_status, PaymentStatus};

    #[test]
    fn nothing_paid_is_pending() {
        assert_eq!(derive_status(None, 0.0, 10.0), PaymentStatus::Pending);
        assert_eq!(derive_status(None, -1.0, 10.0), PaymentStatus::Pending);
        assert_eq!(
            derive_status(Some(PaymentStatus::Paid), 0.0, 10.0),
            PaymentStatus::Pending
        );
    }

    #[test]
    fn partially_paid() {
        assert_eq!(derive_status(None, 0.01, 10.0), PaymentStatus::Partial);
        assert_eq!(derive_status(None, 9.99, 10.0), PaymentStatus::Partial);
        assert_eq!(
            derive_status(Some(PaymentStatus::Pending), 5.0, 10.0),
            PaymentStatus::Partial
        );
    }

    #[test]
    fn fully_paid() {
        assert_eq!(derive_status(None, 10.0, 10.0), PaymentStatus::Paid);
        assert_eq!(derive_status(None, 15.0, 10.0), PaymentStatus::Paid);
        assert_eq!(
            derive_status(Some(PaymentStatus::Partial), 10.0, 10.0),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn overrides_are_preserved() {
        for status in [PaymentStatus::Failed, PaymentStatus::Refunded] {
            assert_eq!(derive_status(Some(status), 0.0, 10.0), status);
            assert_eq!(derive_status(Some(status), 5.0, 10.0), status);
            assert_eq!(derive_status(Some(status), 10.0, 10.0), status);
        }
    }

    #[test]
    fn zero_amount_owed() {
        assert_eq!(derive_status(None, 0.0, 0.0), PaymentStatus::Pending);
    }
}

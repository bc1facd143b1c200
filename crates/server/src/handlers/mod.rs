use schemars::JsonSchema;
use serde::Serialize;

/// Authentication and session routes.
pub(crate) mod auth;

/// Basket management and bird assignment routes.
pub(crate) mod baskets;

/// Betting scheme management routes.
pub(crate) mod betting_schemes;

/// Bird registry routes.
pub(crate) mod birds;

/// API documentation routes.
pub(crate) mod docs;

/// Event inventory and bird registration routes.
pub(crate) mod event_inventories;

/// Event type reference data routes.
pub(crate) mod event_types;

/// Event management routes.
pub(crate) mod events;

/// Fee scheme management routes.
pub(crate) mod fee_schemes;

/// Payment ledger routes.
pub(crate) mod payments;

/// Prize scheme management routes.
pub(crate) mod prize_schemes;

/// Race type reference data routes.
pub(crate) mod race_types;

/// Race lifecycle, enrollment and arrival routes.
pub(crate) mod races;

/// Team management routes.
pub(crate) mod teams;

/// User profile and role management routes.
pub(crate) mod users;

/// Response body of mutations that do not return a record.
#[derive(Serialize, JsonSchema)]
pub(crate) struct MessageResponse {
    /// Human-readable operation result.
    #[schemars(example = "crate::schema::example_message")]
    pub message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

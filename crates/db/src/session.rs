//! User session.
//!
//! Session tokens are issued by the signup flow or by an external
//! authentication service, and are passed to an API server as bearer tokens
//! to identify a user that executes the request.
//!
//! Sessions have their lifespan limited to [`SESSION_LIFESPAN`] [`Duration`]
//! value, and tokens are to have their length equal to the [`TOKEN_LENGTH`] value.

use rand::{
    distributions::{Alphanumeric, DistString},
    thread_rng,
};
use sea_orm::{entity::prelude::*, ActiveValue};
use time::{Duration, PrimitiveDateTime};

pub const TOKEN_LENGTH: usize = 64;
pub const SESSION_LIFESPAN: Duration = Duration::weeks(12);

/// Session model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    /// Unique session identifier.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Related user identifier.
    pub user_id: i64,

    /// Session token string value.
    pub token: String,

    /// Session creation timestamp.
    pub created_at: TimeDateTime,
}

impl Model {
    /// Check if the session lifespan has passed at the provided point in time.
    pub fn is_expired_at(&self, now: PrimitiveDateTime) -> bool {
        self.created_at + SESSION_LIFESPAN <= now
    }
}

/// Session model relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Generate new session for the provided user identifier.
///
/// This function returns both an [`ActiveModel`] of a session
/// and its token string value.
///
/// ## Example
///
/// ```
/// use db::session::{TOKEN_LENGTH, generate_session};
///
/// let (_, token_string) = generate_session(1);
/// assert_eq!(token_string.len(), TOKEN_LENGTH);
/// ```
pub fn generate_session(user_id: i64) -> (ActiveModel, String) {
    let token = Alphanumeric.sample_string(&mut thread_rng(), TOKEN_LENGTH);

    (
        ActiveModel {
            user_id: ActiveValue::Set(user_id),
            token: ActiveValue::Set(token.clone()),
            created_at: ActiveValue::Set(crate::now()),
            ..Default::default()
        },
        token,
    )
}

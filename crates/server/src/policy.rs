//! Role-based authorization policy.
//!
//! Every access decision made by request handlers goes through the [`POLICY`]
//! table. Handlers ask for a [`Grant`] for a [`Resource`] and an [`Access`]
//! kind, and then use it to either check a single record's ownership or to
//! narrow down list queries.

use db::user::Role;
use derive_more::{Display, Error};

/// Protected resource kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Resource {
    User,
    UserRole,
    Team,
    Bird,
    EventType,
    RaceType,
    Scheme,
    Event,
    EventInventory,
    Race,
    Basket,
    Payment,
}

/// Access kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// Set of records a role may access.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    /// Only records owned by the current user.
    Owned,

    /// Every record.
    All,
}

/// Single policy table row.
pub struct Rule {
    pub resource: Resource,
    pub access: Access,
    pub breeder: Option<Scope>,
    pub admin: Option<Scope>,
    pub superadmin: Option<Scope>,
}

macro_rules! rule {
    ($resource:ident, $access:ident, $breeder:expr, $admin:expr, $superadmin:expr) => {
        Rule {
            resource: Resource::$resource,
            access: Access::$access,
            breeder: $breeder,
            admin: $admin,
            superadmin: $superadmin,
        }
    };
}

const OWNED: Option<Scope> = Some(Scope::Owned);
const ALL: Option<Scope> = Some(Scope::All);
const DENY: Option<Scope> = None;

/// Authorization policy table.
///
/// Columns are breeder, admin and super administrator scopes respectively.
pub static POLICY: &[Rule] = &[
    rule!(User, Read, OWNED, ALL, ALL),
    rule!(User, Write, OWNED, OWNED, ALL),
    rule!(UserRole, Read, DENY, ALL, ALL),
    rule!(UserRole, Write, DENY, DENY, ALL),
    rule!(Team, Read, OWNED, ALL, ALL),
    rule!(Team, Write, OWNED, ALL, ALL),
    rule!(Bird, Read, OWNED, ALL, ALL),
    rule!(Bird, Write, OWNED, ALL, ALL),
    rule!(EventType, Read, ALL, ALL, ALL),
    rule!(EventType, Write, DENY, DENY, ALL),
    rule!(RaceType, Read, ALL, ALL, ALL),
    rule!(RaceType, Write, DENY, DENY, ALL),
    rule!(Scheme, Read, DENY, OWNED, ALL),
    rule!(Scheme, Write, DENY, OWNED, ALL),
    rule!(Event, Read, ALL, OWNED, ALL),
    rule!(Event, Write, DENY, OWNED, ALL),
    rule!(EventInventory, Read, OWNED, OWNED, ALL),
    rule!(EventInventory, Write, OWNED, OWNED, ALL),
    rule!(Race, Read, ALL, OWNED, ALL),
    rule!(Race, Write, DENY, OWNED, ALL),
    rule!(Basket, Read, DENY, OWNED, ALL),
    rule!(Basket, Write, DENY, OWNED, ALL),
    rule!(Payment, Read, OWNED, OWNED, ALL),
    rule!(Payment, Write, DENY, OWNED, ALL),
];

/// Look up the scope a role has for the provided resource and access kind.
///
/// Resources missing from the [`POLICY`] table are denied.
pub fn scope_for(role: Role, resource: Resource, access: Access) -> Option<Scope> {
    let rule = POLICY
        .iter()
        .find(|rule| rule.resource == resource && rule.access == access)?;

    match role {
        Role::Breeder => rule.breeder,
        Role::Admin => rule.admin,
        Role::Superadmin => rule.superadmin,
    }
}

/// Which ownership relation an [`Scope::Owned`] scope refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Ownership {
    /// Records owned through a `breeder_id` column.
    Breeder,

    /// Records created by the user, or belonging to an event created by the user.
    Creator,
}

impl Ownership {
    pub fn of(role: Role) -> Self {
        match role {
            Role::Breeder => Ownership::Breeder,
            Role::Admin | Role::Superadmin => Ownership::Creator,
        }
    }
}

/// Ownership information of a single record.
#[derive(Copy, Clone, Debug, Default)]
pub struct Owner {
    pub breeder_id: Option<i64>,
    pub created_by: Option<i64>,
}

impl Owner {
    pub fn breeder(breeder_id: i64) -> Self {
        Self {
            breeder_id: Some(breeder_id),
            created_by: None,
        }
    }

    pub fn creator(created_by: i64) -> Self {
        Self {
            breeder_id: None,
            created_by: Some(created_by),
        }
    }

    /// Record owned by a breeder inside of an event created by an administrator.
    pub fn both(breeder_id: i64, created_by: i64) -> Self {
        Self {
            breeder_id: Some(breeder_id),
            created_by: Some(created_by),
        }
    }

    /// User account, which is owned by the user themselves.
    pub fn account(user_id: i64) -> Self {
        Self::both(user_id, user_id)
    }
}

/// Access was denied by the authorization policy.
#[derive(Copy, Clone, Debug, Display, Error)]
#[display(fmt = "access denied")]
pub struct Forbidden;

/// Successful authorization result.
#[derive(Copy, Clone, Debug)]
pub struct Grant {
    pub scope: Scope,
    pub user_id: i64,
    pub ownership: Ownership,
}

/// Owner filter to apply to list queries.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OwnedBy {
    Breeder(i64),
    Creator(i64),
}

impl Grant {
    /// Check if the granted scope covers a record with the provided owner.
    pub fn check(&self, owner: Owner) -> Result<(), Forbidden> {
        let allowed = match (self.scope, self.ownership) {
            (Scope::All, _) => true,
            (Scope::Owned, Ownership::Breeder) => owner.breeder_id == Some(self.user_id),
            (Scope::Owned, Ownership::Creator) => owner.created_by == Some(self.user_id),
        };

        allowed.then_some(()).ok_or(Forbidden)
    }

    /// Owner filter for list queries, if the scope is limited.
    pub fn owned_by(&self) -> Option<OwnedBy> {
        match (self.scope, self.ownership) {
            (Scope::All, _) => None,
            (Scope::Owned, Ownership::Breeder) => Some(OwnedBy::Breeder(self.user_id)),
            (Scope::Owned, Ownership::Creator) => Some(OwnedBy::Creator(self.user_id)),
        }
    }

    pub fn is_all(&self) -> bool {
        self.scope == Scope::All
    }
}

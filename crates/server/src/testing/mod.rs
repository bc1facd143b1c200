use std::{error::Error, sync::Arc};

use axum::{async_trait, body::Body, http::Request, Router};
use common::config::Config;
use db::{
    basket, bird, event, event_inventory, event_inventory_item, event_type, fee_scheme, payment,
    perch_fee_item, prize_scheme, prize_scheme_item, race, race_item, race_type, session, user,
    ActiveValue, Database, DatabaseConnection, EntityTrait,
};
use hyper::body::{self, Bytes, HttpBody};
use migration::MigratorTrait;
use serde::Serialize;

use crate::storage::{BlobStorage, MemoryStorage};

pub(crate) async fn create_database() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("unable to create test database");

    migration::Migrator::up(&db, None)
        .await
        .expect("unable to run migrations");

    db
}

/// Application router backed by an in-memory blob storage.
pub(crate) fn test_router(db: Arc<DatabaseConnection>) -> Router {
    test_router_with_storage(db, Arc::new(MemoryStorage::default()))
}

pub(crate) fn test_router_with_storage(
    db: Arc<DatabaseConnection>,
    storage: Arc<dyn BlobStorage>,
) -> Router {
    crate::app_router(db, Arc::new(Config::for_tests()), storage)
}

/// Build a request without a body authenticated with the provided session token.
pub(crate) fn authorized(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .expect("unable to build request")
}

/// Build a JSON request authenticated with the provided session token.
pub(crate) fn authorized_json<B: Serialize>(
    method: &str,
    uri: &str,
    token: &str,
    body: B,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .header("Content-Type", "application/json")
        .body(Body::from_json(body))
        .expect("unable to build request")
}

/// Create a user with the provided role and a session for them.
pub(crate) async fn create_user(db: &DatabaseConnection, role: user::Role) -> (user::Model, String) {
    let count = user::Entity::find()
        .all(db)
        .await
        .expect("unable to count users")
        .len();

    let user = user::Entity::insert(user::ActiveModel {
        name: ActiveValue::Set(format!("User {count}")),
        email: ActiveValue::Set(format!("user{count}@example.com")),
        role: ActiveValue::Set(role),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create user");

    let (model, token) = session::generate_session(user.id);

    session::Entity::insert(model)
        .exec_without_returning(db)
        .await
        .expect("unable to insert session");

    (user, token)
}

pub(crate) async fn create_bird(
    db: &DatabaseConnection,
    breeder_id: i64,
    serial: &str,
) -> bird::Model {
    bird::Entity::insert(bird::ActiveModel {
        breeder_id: ActiveValue::Set(breeder_id),
        band_country: ActiveValue::Set(String::from("PHA")),
        band_year: ActiveValue::Set(String::from("2024")),
        band_club: ActiveValue::Set(String::from("MNL")),
        band_serial: ActiveValue::Set(serial.to_string()),
        band: ActiveValue::Set(bird::compose_band("PHA", "2024", "MNL", serial)),
        sex: ActiveValue::Set(bird::Sex::Unknown),
        rfid: ActiveValue::Set(Some(format!("RFID{serial}"))),
        is_lost: ActiveValue::Set(false),
        is_active: ActiveValue::Set(true),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create bird")
}

pub(crate) async fn create_race_type(db: &DatabaseConnection, name: &str) -> race_type::Model {
    race_type::Entity::insert(race_type::ActiveModel {
        name: ActiveValue::Set(name.to_string()),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create race type")
}

/// Create a fee scheme with the provided perch fee and per-bird fees.
pub(crate) async fn create_fee_scheme(
    db: &DatabaseConnection,
    created_by: i64,
    perch_fee: f64,
    items: &[(i32, f64)],
) -> fee_scheme::Model {
    let scheme = fee_scheme::Entity::insert(fee_scheme::ActiveModel {
        name: ActiveValue::Set(String::from("Fees")),
        perch_fee: ActiveValue::Set(perch_fee),
        created_by: ActiveValue::Set(created_by),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create fee scheme");

    for (bird_no, fee) in items {
        perch_fee_item::Entity::insert(perch_fee_item::ActiveModel {
            fee_scheme_id: ActiveValue::Set(scheme.id),
            bird_no: ActiveValue::Set(*bird_no),
            fee: ActiveValue::Set(*fee),
            ..Default::default()
        })
        .exec_without_returning(db)
        .await
        .expect("unable to create perch fee item");
    }

    scheme
}

/// Create a prize scheme with `(race_type_id, from, to, prize)` items.
pub(crate) async fn create_prize_scheme(
    db: &DatabaseConnection,
    created_by: i64,
    items: &[(i64, i32, i32, f64)],
) -> prize_scheme::Model {
    let scheme = prize_scheme::Entity::insert(prize_scheme::ActiveModel {
        name: ActiveValue::Set(String::from("Prizes")),
        created_by: ActiveValue::Set(created_by),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create prize scheme");

    for (race_type_id, from_position, to_position, prize) in items {
        prize_scheme_item::Entity::insert(prize_scheme_item::ActiveModel {
            prize_scheme_id: ActiveValue::Set(scheme.id),
            race_type_id: ActiveValue::Set(*race_type_id),
            from_position: ActiveValue::Set(*from_position),
            to_position: ActiveValue::Set(*to_position),
            prize: ActiveValue::Set(*prize),
            ..Default::default()
        })
        .exec_without_returning(db)
        .await
        .expect("unable to create prize scheme item");
    }

    scheme
}

/// Schemes and reference data an event is created with.
pub(crate) struct EventSetup {
    pub event_type_id: i64,
    pub fee_scheme_id: i64,
    pub prize_scheme_id: i64,
    pub betting_scheme_id: i64,
}

pub(crate) async fn create_event_setup(
    db: &DatabaseConnection,
    created_by: i64,
    fee_scheme_id: i64,
    prize_scheme_id: i64,
) -> EventSetup {
    let event_type = event_type::Entity::insert(event_type::ActiveModel {
        name: ActiveValue::Set(format!("Derby {fee_scheme_id}-{prize_scheme_id}")),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create event type");

    let betting_scheme = db::betting_scheme::Entity::insert(db::betting_scheme::ActiveModel {
        name: ActiveValue::Set(String::from("Bets")),
        cut_percentage: ActiveValue::Set(10.0),
        standard_amount: ActiveValue::Set(100.0),
        show_low_amount: ActiveValue::Set(50.0),
        show_mid_amount: ActiveValue::Set(75.0),
        show_high_amount: ActiveValue::Set(100.0),
        winner_takes_all_amount: ActiveValue::Set(500.0),
        created_by: ActiveValue::Set(created_by),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create betting scheme");

    EventSetup {
        event_type_id: event_type.id,
        fee_scheme_id,
        prize_scheme_id,
        betting_scheme_id: betting_scheme.id,
    }
}

/// Create an open event using the provided fee and prize schemes.
pub(crate) async fn create_event(
    db: &DatabaseConnection,
    created_by: i64,
    fee_scheme_id: i64,
    prize_scheme_id: i64,
) -> event::Model {
    let setup = create_event_setup(db, created_by, fee_scheme_id, prize_scheme_id).await;

    event::Entity::insert(event::ActiveModel {
        name: ActiveValue::Set(String::from("Summer Derby")),
        event_type_id: ActiveValue::Set(setup.event_type_id),
        fee_scheme_id: ActiveValue::Set(setup.fee_scheme_id),
        prize_scheme_id: ActiveValue::Set(setup.prize_scheme_id),
        betting_scheme_id: ActiveValue::Set(setup.betting_scheme_id),
        is_open: ActiveValue::Set(true),
        starts_at: ActiveValue::Set(db::now()),
        ends_at: ActiveValue::Set(db::now()),
        created_by: ActiveValue::Set(created_by),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create event")
}

/// Create an open event with empty fee and prize schemes.
pub(crate) async fn create_simple_event(db: &DatabaseConnection, created_by: i64) -> event::Model {
    let fee_scheme = create_fee_scheme(db, created_by, 0.0, &[]).await;
    let prize_scheme = create_prize_scheme(db, created_by, &[]).await;

    create_event(db, created_by, fee_scheme.id, prize_scheme.id).await
}

pub(crate) async fn create_inventory(
    db: &DatabaseConnection,
    event_id: i64,
    breeder_id: i64,
    reserved_birds: i32,
) -> event_inventory::Model {
    event_inventory::Entity::insert(event_inventory::ActiveModel {
        event_id: ActiveValue::Set(event_id),
        breeder_id: ActiveValue::Set(breeder_id),
        reserved_birds: ActiveValue::Set(reserved_birds),
        registered_birds: ActiveValue::Set(0),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create event inventory")
}

/// Register a bird inside of an inventory, keeping the counter in lock-step.
pub(crate) async fn register_bird(
    db: &DatabaseConnection,
    inventory: &event_inventory::Model,
    bird_id: i64,
) -> event_inventory_item::Model {
    let item = event_inventory_item::Entity::insert(event_inventory_item::ActiveModel {
        event_inventory_id: ActiveValue::Set(inventory.id),
        event_id: ActiveValue::Set(inventory.event_id),
        bird_id: ActiveValue::Set(bird_id),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create event inventory item");

    let current = event_inventory::Entity::find_by_id(inventory.id)
        .one(db)
        .await
        .expect("unable to find event inventory")
        .expect("missing event inventory");

    event_inventory::Entity::update(event_inventory::ActiveModel {
        id: ActiveValue::Unchanged(inventory.id),
        registered_birds: ActiveValue::Set(current.registered_birds + 1),
        ..Default::default()
    })
    .exec(db)
    .await
    .expect("unable to update event inventory");

    item
}

pub(crate) async fn create_race(
    db: &DatabaseConnection,
    event_id: i64,
    race_type_id: i64,
    created_by: i64,
    is_live: bool,
) -> race::Model {
    race::Entity::insert(race::ActiveModel {
        event_id: ActiveValue::Set(event_id),
        race_type_id: ActiveValue::Set(race_type_id),
        name: ActiveValue::Set(String::from("Final Race")),
        is_live: ActiveValue::Set(is_live),
        is_closed: ActiveValue::Set(false),
        created_by: ActiveValue::Set(created_by),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create race")
}

pub(crate) async fn create_race_item(
    db: &DatabaseConnection,
    race_id: i64,
    bird_id: i64,
) -> race_item::Model {
    race_item::Entity::insert(race_item::ActiveModel {
        race_id: ActiveValue::Set(race_id),
        bird_id: ActiveValue::Set(bird_id),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create race item")
}

/// Create a pending fee payment of an inventory breeder.
pub(crate) async fn create_payment(
    db: &DatabaseConnection,
    inventory: &event_inventory::Model,
    amount_to_pay: f64,
) -> payment::Model {
    payment::Entity::insert(payment::ActiveModel {
        event_inventory_id: ActiveValue::Set(inventory.id),
        breeder_id: ActiveValue::Set(inventory.breeder_id),
        amount_to_pay: ActiveValue::Set(amount_to_pay),
        amount_paid: ActiveValue::Set(0.0),
        currency: ActiveValue::Set(String::from(payment::DEFAULT_CURRENCY)),
        payment_type: ActiveValue::Set(payment::PaymentType::Other),
        status: ActiveValue::Set(payment::PaymentStatus::Pending),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create payment")
}

pub(crate) async fn create_basket(
    db: &DatabaseConnection,
    race_id: i64,
    number: i32,
    is_race_basket: bool,
    created_by: i64,
) -> basket::Model {
    basket::Entity::insert(basket::ActiveModel {
        race_id: ActiveValue::Set(race_id),
        number: ActiveValue::Set(number),
        is_race_basket: ActiveValue::Set(is_race_basket),
        created_by: ActiveValue::Set(created_by),
        ..Default::default()
    })
    .exec_with_returning(db)
    .await
    .expect("unable to create basket")
}

pub(crate) trait RequestBodyExt: Sized {
    fn from_json<B: Serialize>(val: B) -> Self;
}

impl<T> RequestBodyExt for T
where
    T: HttpBody + From<Vec<u8>>,
{
    fn from_json<B: Serialize>(val: B) -> Self {
        T::from(serde_json::to_vec(&val).expect("unable to serialize"))
    }
}

#[async_trait(?Send)]
pub(crate) trait ResponseBodyExt {
    async fn bytes(self) -> Bytes;

    async fn text(self) -> String;

    async fn json(self) -> serde_json::Value;
}

#[async_trait(?Send)]
impl<T> ResponseBodyExt for T
where
    T: HttpBody,
    T::Error: Error,
{
    async fn bytes(self) -> Bytes {
        body::to_bytes(self)
            .await
            .expect("unable to convert to bytes")
    }

    async fn text(self) -> String {
        String::from_utf8(self.bytes().await.to_vec()).expect("unable to convert to text")
    }

    async fn json(self) -> serde_json::Value {
        serde_json::from_slice(&self.bytes().await).expect("unable to convert to json")
    }
}

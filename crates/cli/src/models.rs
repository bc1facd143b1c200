//! Response records returned by the Loft Manager API.
//!
//! Only the fields printed by the CLI are deserialized, unknown fields are ignored.

use serde::Deserialize;

#[derive(Deserialize)]
pub struct User {
    pub id: i64,
    pub role: String,
    pub name: String,
    pub email: String,
}

#[derive(Deserialize)]
pub struct SessionResponse {
    pub user: User,
}

#[derive(Deserialize)]
pub struct RegistrationResponse {
    pub user: User,
    pub token: String,
    pub message: String,
}

#[derive(Deserialize)]
pub struct Bird {
    pub id: i64,
    pub breeder_id: i64,
    pub band: String,
    pub name: Option<String>,
    pub sex: String,
    pub rfid: Option<String>,
    pub is_lost: bool,
    pub is_active: bool,
}

#[derive(Deserialize)]
pub struct BirdResponse {
    pub bird: Bird,
    pub message: String,
}

#[derive(Deserialize)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub is_open: bool,
    pub starts_at: i64,
    pub ends_at: i64,
}

#[derive(Deserialize)]
pub struct InventoryItem {
    pub id: i64,
    pub bird_id: i64,
    pub is_backup: bool,
    pub bird: Option<Bird>,
}

#[derive(Deserialize)]
pub struct Payment {
    pub id: i64,
    pub event_inventory_id: i64,
    pub breeder_id: i64,
    pub amount_to_pay: f64,
    pub amount_paid: f64,
    pub currency: String,
    pub payment_type: String,
    pub status: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct PaymentResponse {
    pub payment: Payment,
    pub message: String,
}

#[derive(Deserialize)]
pub struct InventoryItemCreationResponse {
    pub item: InventoryItem,
    pub bird: Bird,
    pub payments: Vec<Payment>,
    pub message: String,
}

#[derive(Deserialize)]
pub struct Race {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub distance_km: Option<f64>,
    pub is_live: bool,
    pub is_closed: bool,
}

impl Race {
    pub fn state(&self) -> &'static str {
        match (self.is_live, self.is_closed) {
            (_, true) => "closed",
            (true, false) => "live",
            (false, false) => "pending",
        }
    }
}

#[derive(Deserialize)]
pub struct RaceResponse {
    pub race: Race,
    pub message: String,
}

#[derive(Deserialize)]
pub struct RaceItem {
    pub bird_id: i64,
    pub arrived_at: Option<i64>,
    pub position: Option<i32>,
}

#[derive(Deserialize)]
pub struct RaceResult {
    #[serde(flatten)]
    pub item: RaceItem,
    pub band: Option<String>,
    pub prize: f64,
}

#[derive(Deserialize)]
pub struct ScanResponse {
    pub message: String,
    pub is_new_arrival: bool,
    pub race_item: RaceItem,
}

#[derive(Deserialize)]
pub struct BasketAssignmentResponse {
    pub updated: u64,
    pub message: String,
}

#[derive(Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

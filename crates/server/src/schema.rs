use std::fmt::Display;

use axum::response::IntoResponse;
use db::{
    basket::BasketType,
    bird::Sex,
    payment::{PaymentStatus, PaymentType},
    user::Role,
};
use serde_json::{json, Value};

/// Generate example values for OAPI documentation.
macro_rules! generate_examples {
    ($name:ident, $type:ty, $expr:expr) => {
        ::paste::paste! {
            #[doc = concat!("Generate example [`", stringify!($type), "`] value for OAPI documentation.")]
            pub(crate) fn [<example_ $name>]() -> $type {
                $expr
            }
        }
    };

    ($name:ident, $type:ty, $expr:expr; $($name_repeat:ident, $type_repeat:ty, $expr_repeat:expr);+) => {
        generate_examples!($name, $type, $expr);
        generate_examples!($($name_repeat, $type_repeat, $expr_repeat);+);
    }
}

/// Convert an error into a JSON value suitable for OAPI documentation.
pub(crate) fn example_error<E: Display + IntoResponse>(err: E) -> Value {
    let error = err.to_string();

    json! {{
        "code": err.into_response().status().as_u16(),
        "error": error,
    }}
}

generate_examples!(
    database_identifier, i64, 1;
    optional_database_identifier, Option<i64>, Some(1);
    timestamp, i64, 1709294400;
    optional_timestamp, Option<i64>, Some(1709294400);
    token, String, String::from("UYEIngStyH6Bxu1hLFIIwBxLgyMBhMQv4SVR1KzzbvzIDCSMcwwF8ApXagqyuWbh");
    user_name, String, String::from("Juan dela Cruz");
    email, String, String::from("juan@example.com");
    role, Role, Role::Breeder;
    image_url, Option<String>, Some(String::from("https://images.example.com/users/1/8Hq2LmZ0"));
    team_name, String, String::from("Skyline Lofts");
    band_country, String, String::from("PHA");
    band_year, String, String::from("2024");
    band_club, String, String::from("MNL");
    band_serial, String, String::from("01234");
    band, String, String::from("PHA-2024-MNL-01234");
    rfid, Option<String>, Some(String::from("E200341201B802011"));
    sex, Sex, Sex::Cock;
    reference_name, String, String::from("Derby");
    scheme_name, String, String::from("2024 Season");
    amount, f64, 10.0;
    percentage, f64, 10.0;
    bird_no, i32, 1;
    position, Option<i32>, Some(1);
    reserved_birds, i32, 10;
    event_name, String, String::from("Manila Summer Derby");
    race_name, String, String::from("Final Race");
    distance, Option<f64>, Some(350.5);
    basket_number, i32, 1;
    basket_type, BasketType, BasketType::Race;
    scanner_timestamp, String, String::from("20240315093007");
    currency, String, String::from(db::payment::DEFAULT_CURRENCY);
    payment_type, PaymentType, PaymentType::BirdFee;
    payment_status, PaymentStatus, PaymentStatus::Pending;
    message, String, String::from("Record saved successfully")
);

use aide::{gen::GenContext, openapi::Operation, OperationInput};
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest},
    http::{Request, StatusCode},
    Json,
};
use axum_derive_error::ErrorResponse;
use derive_more::{Display, Error};
use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer};
use validator::{Validate, ValidationErrors};

/// Single band fragment, such as a country code or a serial number.
pub static BAND_FRAGMENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[A-Za-z0-9]+$"#).expect("invalid regex string"));

/// ISO 4217 currency code.
pub static CURRENCY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[A-Z]{3}$"#).expect("invalid regex string"));

/// Errors related to JSON validation.
#[derive(ErrorResponse, Display, Error)]
pub enum ValidatedJsonRejection {
    /// Unable to parse a JSON value.
    #[status(StatusCode::UNPROCESSABLE_ENTITY)]
    JsonParsingError(JsonRejection),

    /// Unable to validate a JSON value.
    #[status(StatusCode::UNPROCESSABLE_ENTITY)]
    ValidationError(ValidationErrors),
}

/// Wrapper for [`axum`] JSON value validation.
///
/// Equivalent to the [`axum`]'s [`Json`] struct
/// with [`validator`] crate support.
///
/// [`JSON`]: axum::extract::Json
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S, B> FromRequest<S, B> for ValidatedJson<T>
where
    T: Validate,
    B: Send + 'static,
    S: Sync,
    Json<T>: FromRequest<S, B, Rejection = JsonRejection>,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::from_request(req, state)
            .await
            .map_err(ValidatedJsonRejection::JsonParsingError)?;

        match value.validate() {
            Ok(_) => Ok(ValidatedJson(value)),
            Err(err) => Err(ValidatedJsonRejection::ValidationError(err)),
        }
    }
}

impl<T: JsonSchema> OperationInput for ValidatedJson<T> {
    fn operation_input(ctx: &mut GenContext, operation: &mut Operation) {
        Json::<T>::operation_input(ctx, operation);
    }
}

/// Deserialize a nullable field, keeping an explicit `null` apart from
/// an omitted field.
///
/// Use together with `#[serde(default)]` on `Option<Option<T>>` fields.
pub fn deserialize_present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::{deserialize_present, BAND_FRAGMENT_REGEX, CURRENCY_REGEX};

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "deserialize_present")]
        value: Option<Option<i64>>,
    }

    #[test]
    fn present_fields() {
        let omitted: Patch = serde_json::from_str("{}").unwrap();
        let cleared: Patch = serde_json::from_str(r#"{"value":null}"#).unwrap();
        let set: Patch = serde_json::from_str(r#"{"value":5}"#).unwrap();

        assert_eq!(omitted.value, None);
        assert_eq!(cleared.value, Some(None));
        assert_eq!(set.value, Some(Some(5)));
    }

    #[test]
    fn band_fragments() {
        assert!(BAND_FRAGMENT_REGEX.is_match("PHA"));
        assert!(BAND_FRAGMENT_REGEX.is_match("01234"));
        assert!(!BAND_FRAGMENT_REGEX.is_match("PH-A"));
        assert!(!BAND_FRAGMENT_REGEX.is_match(""));
    }

    #[test]
    fn currency_codes() {
        assert!(CURRENCY_REGEX.is_match("USD"));
        assert!(!CURRENCY_REGEX.is_match("usd"));
        assert!(!CURRENCY_REGEX.is_match("USDT"));
    }
}

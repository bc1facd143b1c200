use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use common::config::Config;
use db::{user, ActiveModelTrait, ActiveValue, DatabaseConnection, DbErr, EntityTrait};
use derive_more::{Display, Error, From};
use rand::{
    distributions::{Alphanumeric, DistString},
    thread_rng,
};
use serde_json::Value;
use tracing::{info, warn};

use super::UserResponse;
use crate::{
    auth::SessionContext,
    policy::{Access, Forbidden, Owner, Resource},
    schema::example_error,
    storage::{BlobStorage, StorageError, StoredBlob},
};

/// Length of the random part of profile image object keys.
const IMAGE_KEY_LENGTH: usize = 16;

const OCTET_STREAM: &str = "application/octet-stream";

/// Detect an image type from the uploaded contents.
fn sniff_image_type(contents: &[u8]) -> Option<&'static str> {
    match contents {
        [0x89, b'P', b'N', b'G', ..] => Some("image/png"),
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        _ => None,
    }
}

/// Errors that may occur during the profile image handling.
#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum ProfileImageError {
    /// Database-related error.
    DatabaseError(DbErr),

    /// `multipart/form-data` request handling error.
    MultipartError(MultipartError),

    /// Blob storage error.
    StorageError(StorageError),

    /// Current user is not allowed to change the profile.
    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    /// Session user no longer exists.
    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "user not found")]
    UserNotFound,

    /// Request didn't have any file uploads in it.
    #[status(StatusCode::UNPROCESSABLE_ENTITY)]
    #[display(fmt = "no file upload was found")]
    NoFileUpload,

    /// Provided file is not an image.
    #[status(StatusCode::UNPROCESSABLE_ENTITY)]
    #[display(fmt = "incorrect file content type")]
    IncorrectContentType,

    /// Provided image exceeds the configured size limit.
    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "image is too large")]
    ImageTooLarge,
}

/// Generate OAPI documentation for the [`upload`] handler.
pub(super) fn upload_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Upload current user profile image.")
        .description(
            r#"This route accepts a `multipart/form-data` form with a single file field
that contains an image. Any previously uploaded profile image is removed."#,
        )
        .response::<200, Json<UserResponse>>()
        .response_with::<400, Json<Value>, _>(|op| {
            op.description("Image is too large.")
                .example(example_error(ProfileImageError::ImageTooLarge))
        })
}

/// Point the user profile at a stored image.
///
/// The stored object is removed again if the profile can't be updated.
async fn attach_image(
    db: &DatabaseConnection,
    storage: &dyn BlobStorage,
    model: user::Model,
    stored: StoredBlob,
) -> Result<user::Model, ProfileImageError> {
    let key = stored.key.clone();

    let mut model: user::ActiveModel = model.into();
    model.image_url = ActiveValue::Set(Some(stored.url));
    model.image_key = ActiveValue::Set(Some(stored.key));

    match model.update(db).await {
        Ok(model) => Ok(model),
        Err(err) => {
            if let Err(err) = storage.delete(&key).await {
                warn!(%err, %key, "unable to delete orphaned profile image");
            }

            Err(err.into())
        }
    }
}

/// Profile image upload handler.
pub(super) async fn upload(
    Extension(session): Extension<SessionContext>,
    Extension(config): Extension<Arc<Config>>,
    Extension(storage): Extension<Arc<dyn BlobStorage>>,
    State(db): State<Arc<DatabaseConnection>>,
    mut data: Multipart,
) -> Result<Json<UserResponse>, ProfileImageError> {
    session
        .authorize(Resource::User, Access::Write)?
        .check(Owner::account(session.user_id()))?;

    let mut image = data
        .next_field()
        .await?
        .ok_or(ProfileImageError::NoFileUpload)?;

    let declared_type = match image.content_type() {
        Some(OCTET_STREAM) | None => None,
        Some(content_type) => Some(content_type.to_ascii_lowercase()),
    };

    let mut contents = Vec::new();

    while let Some(chunk) = image.chunk().await? {
        if contents.len() + chunk.len() > config.storage.image_size_limit {
            return Err(ProfileImageError::ImageTooLarge);
        }

        contents.extend_from_slice(&chunk);
    }

    if contents.is_empty() {
        return Err(ProfileImageError::NoFileUpload);
    }

    let content_type =
        sniff_image_type(&contents).ok_or(ProfileImageError::IncorrectContentType)?;

    // Declared types must agree with the detected one.
    if let Some(declared_type) = declared_type {
        if declared_type != content_type {
            return Err(ProfileImageError::IncorrectContentType);
        }
    }

    let model = user::Entity::find_by_id(session.user_id())
        .one(&*db)
        .await?
        .ok_or(ProfileImageError::UserNotFound)?;

    let key = format!(
        "users/{}/{}",
        model.id,
        Alphanumeric.sample_string(&mut thread_rng(), IMAGE_KEY_LENGTH)
    );

    let stored = storage
        .upload(&key, content_type, Bytes::from(contents))
        .await?;

    let previous_key = model.image_key.clone();
    let model = attach_image(&*db, &*storage, model, stored).await?;

    info!(user_id = model.id, "profile image uploaded");

    if let Some(previous_key) = previous_key {
        if let Err(err) = storage.delete(&previous_key).await {
            warn!(%err, key = %previous_key, "unable to delete previous profile image");
        }
    }

    Ok(Json(UserResponse {
        user: model.into(),
        message: String::from("Profile image uploaded successfully"),
    }))
}

/// Generate OAPI documentation for the [`delete`] handler.
pub(super) fn delete_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Remove current user profile image.")
        .response::<200, Json<UserResponse>>()
}

/// Profile image removal handler.
pub(super) async fn delete(
    Extension(session): Extension<SessionContext>,
    Extension(storage): Extension<Arc<dyn BlobStorage>>,
    State(db): State<Arc<DatabaseConnection>>,
) -> Result<Json<UserResponse>, ProfileImageError> {
    session
        .authorize(Resource::User, Access::Write)?
        .check(Owner::account(session.user_id()))?;

    let model = user::Entity::find_by_id(session.user_id())
        .one(&*db)
        .await?
        .ok_or(ProfileImageError::UserNotFound)?;

    if let Some(key) = &model.image_key {
        storage.delete(key).await?;
    }

    let mut model: user::ActiveModel = model.into();
    model.image_url = ActiveValue::Set(None);
    model.image_key = ActiveValue::Set(None);
    let model = model.update(&*db).await?;

    Ok(Json(UserResponse {
        user: model.into(),
        message: String::from("Profile image removed successfully"),
    }))
}

#[cfg(test)]
mod tests {
    use std::{io::Cursor, sync::Arc};

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use common_multipart_rfc7578::client::multipart;
    use db::{user::Role, EntityTrait};
    use tower::Service;

    use super::{attach_image, ProfileImageError};
    use crate::{
        storage::{BlobStorage, MemoryStorage},
        testing::{
            authorized, create_database, create_user, test_router_with_storage, ResponseBodyExt,
        },
    };

    fn upload_request(token: &str, contents: &'static [u8]) -> Request<Body> {
        let mut form = multipart::Form::default();
        form.add_reader("image", Cursor::new(contents));

        Request::builder()
            .method("POST")
            .uri("/users/me/image")
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", form.content_type())
            .body(Body::wrap_stream(multipart::Body::from(form)))
            .unwrap()
    }

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\nimage";

    const BOUNDARY: &str = "loft-image-boundary";

    fn typed_upload_request(token: &str, content_type: &str, contents: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"image\"; filename=\"image\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(contents);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/users/me/image")
            .header("Authorization", format!("Bearer {token}"))
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[test]
    fn sniffing() {
        assert_eq!(super::sniff_image_type(PNG), Some("image/png"));
        assert_eq!(
            super::sniff_image_type(b"\xFF\xD8\xFF\xE0jfif"),
            Some("image/jpeg")
        );
        assert_eq!(super::sniff_image_type(b"PK\x03\x04"), None);
    }

    #[tokio::test]
    async fn upload_replace_and_delete() {
        let db = Arc::new(create_database().await);

        let (user, token) = create_user(&db, Role::Breeder).await;

        let storage = Arc::new(MemoryStorage::default());
        let mut service = test_router_with_storage(db.clone(), storage.clone());

        let response = service.call(upload_request(&token, PNG)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.json().await;
        let first_url = body["user"]["image_url"].as_str().unwrap().to_string();
        assert!(first_url.starts_with(&format!("https://images.example.com/users/{}/", user.id)));

        let first_key = db::user::Entity::find_by_id(user.id)
            .one(&*db)
            .await
            .unwrap()
            .unwrap()
            .image_key
            .unwrap();
        assert!(storage.contains(&first_key));

        let response = service.call(upload_request(&token, PNG)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!storage.contains(&first_key));
        assert_eq!(storage.len(), 1);

        let response = service
            .call(authorized("DELETE", "/users/me/image", &token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.json().await["user"]["image_url"].is_null());
        assert_eq!(storage.len(), 0);
    }

    #[tokio::test]
    async fn not_an_image() {
        let db = Arc::new(create_database().await);

        let (_, token) = create_user(&db, Role::Breeder).await;

        let storage = Arc::new(MemoryStorage::default());

        let response = test_router_with_storage(db, storage.clone())
            .call(upload_request(&token, b"PK\x03\x04archive"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(storage.len(), 0);
    }

    #[tokio::test]
    async fn declared_type_must_match_contents() {
        let db = Arc::new(create_database().await);

        let (_, token) = create_user(&db, Role::Breeder).await;

        let storage = Arc::new(MemoryStorage::default());
        let mut service = test_router_with_storage(db, storage.clone());

        let response = service
            .call(typed_upload_request(
                &token,
                "image/svg+xml",
                b"<svg xmlns=\"http://www.w3.org/2000/svg\" onload=\"alert(1)\"/>",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = service
            .call(typed_upload_request(&token, "image/jpeg", PNG))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(storage.len(), 0);

        let response = service
            .call(typed_upload_request(&token, "image/png", PNG))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(storage.len(), 1);
    }

    #[tokio::test]
    async fn failed_profile_update_removes_object() {
        let db = create_database().await;

        let (user, _) = create_user(&db, Role::Breeder).await;

        let storage = MemoryStorage::default();
        let stored = storage
            .upload("users/999/orphan", "image/png", PNG.into())
            .await
            .unwrap();

        assert!(storage.contains("users/999/orphan"));

        let missing = db::user::Model { id: 999, ..user };
        let result = attach_image(&db, &storage, missing, stored).await;

        assert!(matches!(result, Err(ProfileImageError::DatabaseError(_))));
        assert!(!storage.contains("users/999/orphan"));
    }
}

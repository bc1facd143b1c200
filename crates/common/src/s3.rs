pub use aws_sdk_s3::Error;
use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    Client,
};

use crate::config;

/// Configured S3 client.
pub struct ConfiguredClient {
    bucket: String,
    public_url: String,
    client: Client,
}

impl ConfiguredClient {
    /// Create new [`ConfiguredClient`] from the provided [`Storage`] configuration.
    ///
    /// [`Storage`]: config::Storage
    pub async fn new(config: &config::Storage) -> ConfiguredClient {
        let sdk_config = aws_config::from_env()
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region.clone()))
            .credentials_provider(Credentials::new(
                &config.access_key_id,
                &config.secret_access_key,
                None,
                None,
                "s3-client",
            ))
            .load()
            .await;

        ConfiguredClient {
            bucket: config.image_bucket.clone(),
            public_url: config.public_url.trim_end_matches('/').to_string(),
            client: Client::new(&sdk_config),
        }
    }

    /// Get the public URL of an object stored under the provided key.
    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }

    /// Upload an object with the provided key and content type.
    pub async fn upload<F>(&self, key: &str, content_type: &str, file: F) -> Result<(), Error>
    where
        ByteStream: From<F>,
    {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(file))
            .send()
            .await?;

        Ok(())
    }

    /// Delete an object with the provided key.
    ///
    /// Deleting a missing key is not an error.
    pub async fn delete(&self, key: &str) -> Result<(), Error> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;

        Ok(())
    }
}

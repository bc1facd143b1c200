use std::{net::SocketAddr, path::PathBuf};

use byte_unit::n_mib_bytes;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

#[cfg(feature = "logging")]
use tracing_subscriber::filter::LevelFilter;

/// Database configuration.
#[derive(Deserialize)]
pub struct Database {
    /// Database URL string.
    pub url: String,
}

/// HTTP server configuration.
#[derive(Deserialize)]
pub struct Server {
    /// Address, that HTTP server will listen on.
    pub address: SocketAddr,
}

/// Implementation of [`serde`]'s deserializer for [`FromStr`] types.
#[cfg(feature = "logging")]
fn deserialize_from_str<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: std::str::FromStr,
    T::Err: std::error::Error,
    D: serde::de::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    std::str::FromStr::from_str(&s).map_err(serde::de::Error::custom)
}

/// Logging configuration.
#[cfg(feature = "logging")]
#[derive(Deserialize)]
pub struct Logging {
    /// Log level.
    #[serde(deserialize_with = "deserialize_from_str")]
    pub level: LevelFilter,
}

#[cfg(feature = "logging")]
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: LevelFilter::WARN,
        }
    }
}

/// AWS S3-compatible storage configuration.
///
/// The bucket is used to store user profile images only.
#[derive(Deserialize)]
pub struct Storage {
    /// Access key identifier.
    pub access_key_id: String,

    /// Secret access key.
    pub secret_access_key: String,

    /// S3 region name.
    pub region: String,

    /// S3 endpoint URL.
    pub endpoint_url: String,

    /// S3 bucket name for profile image storage.
    pub image_bucket: String,

    /// Public base URL under which uploaded objects are reachable.
    ///
    /// Object keys are appended to this value to produce image URLs.
    pub public_url: String,

    /// Max profile image size, in bytes.
    #[serde(default = "default_image_size_limit")]
    pub image_size_limit: usize,
}

fn default_image_size_limit() -> usize {
    n_mib_bytes!(5) as usize
}

/// General configuration.
#[derive(Deserialize)]
pub struct Config {
    /// General database configuration.
    pub database: Database,

    /// HTTP server configuration.
    #[serde(default)]
    pub server: Option<Server>,

    /// Logging configuration.
    #[cfg(feature = "logging")]
    #[serde(default)]
    pub logging: Logging,

    /// Storage configuration.
    pub storage: Storage,
}

impl Config {
    /// Create new config using default configuration file or environment variables.
    ///
    /// See [`Env`] for more details on how to use environment variables configuration.
    ///
    /// [`Env`]: figment::providers::Env
    pub fn new() -> Result<Self, figment::Error> {
        Self::from_path(PathBuf::from("Config.toml"))
    }

    /// Create new config using the provided configuration file path.
    ///
    /// Environment variables prefixed with `CONFIG_` still take precedence
    /// over the file values.
    pub fn from_path(path: PathBuf) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("CONFIG_").split("_"))
            .extract()
    }

    /// Create new config suitable for running unit tests.
    #[cfg(feature = "test-utils")]
    pub fn for_tests() -> Self {
        Self {
            database: Database {
                url: String::from("sqlite::memory:"),
            },
            server: Some(Server {
                address: "127.0.0.1:3000".parse().unwrap(),
            }),
            #[cfg(feature = "logging")]
            logging: Logging::default(),
            storage: Storage {
                access_key_id: String::new(),
                secret_access_key: String::new(),
                region: String::new(),
                endpoint_url: String::new(),
                image_bucket: String::new(),
                public_url: String::from("https://images.example.com"),
                image_size_limit: default_image_size_limit(),
            },
        }
    }
}

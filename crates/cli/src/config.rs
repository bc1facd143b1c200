use std::{fs, io, path::PathBuf};

use derive_more::{Display, Error, From};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Display, From, Error)]
pub enum ClientConfigError {
    Figment(figment::Error),
    Io(io::Error),
    Toml(toml::ser::Error),

    #[display(fmt = "unable to find home directory")]
    HomeDirNotFound,
}

/// API client configuration.
///
/// Loaded from `~/.loft/client.toml`, with `LOFT_` prefixed environment
/// variables taking precedence.
#[derive(Serialize, Deserialize)]
pub struct ClientConfig {
    /// API server URL.
    #[serde(default = "default_server_path")]
    pub server_path: String,

    /// Session token of the current user.
    #[serde(default)]
    pub token: Option<String>,

    /// Number of cached GET responses.
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

pub fn default_server_path() -> String {
    String::from("http://localhost:3000")
}

fn default_cache_size() -> usize {
    64
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_path: default_server_path(),
            token: None,
            cache_size: default_cache_size(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Result<Self, ClientConfigError> {
        Ok(Figment::from(Serialized::defaults(ClientConfig::default()))
            .merge(Toml::file(Self::config_path()?))
            .merge(Env::prefixed("LOFT_"))
            .extract()?)
    }

    /// Store the session token and the server it was issued by.
    pub fn write_token(token: String, server_path: String) -> Result<(), ClientConfigError> {
        let path = Self::config_path()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        fs::write(
            path,
            toml::to_string(&ClientConfig {
                token: Some(token),
                server_path,
                ..ClientConfig::default()
            })?,
        )?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf, ClientConfigError> {
        let mut home_dir = home::home_dir().ok_or(ClientConfigError::HomeDirNotFound)?;
        home_dir.push(".loft/client.toml");
        Ok(home_dir)
    }
}

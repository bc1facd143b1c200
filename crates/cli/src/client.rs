//! Typed HTTP client for the Loft Manager API.
//!
//! GET responses are kept in an LRU cache keyed by the request path.
//! Any mutation clears the cache, since it may change any listed record.

use std::{cell::RefCell, num::NonZeroUsize};

use derive_more::{Display, Error, From};
use lru::LruCache;
use reqwest::{
    blocking::{Client, RequestBuilder, Response},
    Method,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::config::ClientConfig;

/// Error body returned by the API server.
#[derive(Debug, Display, Deserialize, Error)]
#[display(fmt = "{error} ({code})")]
pub struct ApiErrorBody {
    pub code: u16,
    pub error: String,
}

#[derive(Debug, Display, From, Error)]
pub enum ClientError {
    Http(reqwest::Error),
    Json(serde_json::Error),
    Api(ApiErrorBody),

    #[display(fmt = "unexpected response status {_0}")]
    #[from(ignore)]
    UnexpectedStatus(#[error(not(source))] u16),

    #[display(fmt = "not logged in, use the login command first")]
    MissingToken,
}

pub struct ApiClient {
    http: Client,
    server_path: String,
    token: Option<String>,
    cache: RefCell<LruCache<String, Value>>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Self {
        let capacity = NonZeroUsize::new(config.cache_size).unwrap_or(NonZeroUsize::MIN);

        Self {
            http: Client::new(),
            server_path: config.server_path.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            cache: RefCell::new(LruCache::new(capacity)),
        }
    }

    /// Replace the session token, for example right after a registration.
    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self.cache.borrow_mut().clear();
        self
    }

    pub fn server_path(&self) -> &str {
        &self.server_path
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{path}", self.server_path));

        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn read_response(response: Response) -> Result<Value, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json()?);
        }

        match response.json::<ApiErrorBody>() {
            Ok(body) => Err(body.into()),
            Err(_) => Err(ClientError::UnexpectedStatus(status.as_u16())),
        }
    }

    /// Fetch a resource, answering from the cache when possible.
    pub fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        if self.token.is_none() {
            return Err(ClientError::MissingToken);
        }

        let cached = self.cache.borrow_mut().get(path).cloned();

        let value = match cached {
            Some(value) => value,
            None => {
                let value = Self::read_response(self.request(Method::GET, path).send()?)?;
                self.cache.borrow_mut().put(path.to_string(), value.clone());
                value
            }
        };

        Ok(serde_json::from_value(value)?)
    }

    /// Send a mutation request and invalidate cached responses.
    pub fn send<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut builder = self.request(method, path);

        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send();
        self.cache.borrow_mut().clear();

        Ok(serde_json::from_value(Self::read_response(response?)?)?)
    }

    pub fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(Method::POST, path, Some(body))
    }

    pub fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(Method::PUT, path, Some(body))
    }

    pub fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send::<Value, T>(Method::DELETE, path, None)
    }

    #[cfg(test)]
    fn cached(&self, path: &str) -> bool {
        self.cache.borrow().contains(path)
    }
}

/// Build a query string out of optional parameters.
pub fn query<'a, I>(path: &str, params: I) -> String
where
    I: IntoIterator<Item = (&'a str, Option<String>)>,
{
    let pairs = params
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| format!("{key}={value}")))
        .collect::<Vec<_>>();

    if pairs.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{}", pairs.join("&"))
    }
}

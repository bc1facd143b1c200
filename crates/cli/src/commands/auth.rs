use derive_more::{Display, Error, From};
use serde::Serialize;

use crate::{
    client::{ApiClient, ClientError},
    config::{ClientConfig, ClientConfigError},
    models::{RegistrationResponse, SessionResponse},
};

use super::with_spinner;

#[derive(Debug, Display, From, Error)]
pub(crate) enum AuthError {
    Config(ClientConfigError),
    Client(ClientError),
}

#[derive(Serialize)]
struct RegistrationRequest {
    name: String,
    email: String,
    phone: Option<String>,
}

/// Verify the provided token and store it in the client configuration.
pub(crate) fn login(client: ApiClient, token: String) -> Result<(), AuthError> {
    let client = client.with_token(token.clone());

    let session: SessionResponse =
        with_spinner("Checking session token...", || client.get("/auth/session"))?;

    ClientConfig::write_token(token, client.server_path().to_string())?;

    println!(
        "Logged in as {} <{}>.",
        session.user.name, session.user.email
    );

    Ok(())
}

/// Register a new breeder and store the issued session token.
pub(crate) fn register(
    client: ApiClient,
    name: String,
    email: String,
    phone: Option<String>,
) -> Result<(), AuthError> {
    let response: RegistrationResponse = with_spinner("Registering...", || {
        client.post("/auth/register", &RegistrationRequest { name, email, phone })
    })?;

    ClientConfig::write_token(response.token, client.server_path().to_string())?;

    println!("{} User #{} is now logged in.", response.message, response.user.id);

    Ok(())
}

/// Print the current session user.
pub(crate) fn whoami(client: &ApiClient) -> Result<(), AuthError> {
    let session: SessionResponse = client.get("/auth/session")?;

    println!(
        "#{} {} <{}> ({})",
        session.user.id, session.user.name, session.user.email, session.user.role
    );

    Ok(())
}

//! Server configuration, read once from the environment at startup.

use std::net::SocketAddr;

use crate::error::AppError;

/// Settings the server needs to start.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Secret mixed into issued media credentials.
    pub credential_secret: String,
    /// Friendly name that, when used to create a town, becomes its id.
    pub demo_town_id: Option<String>,
}

impl ApiConfig {
    /// Reads `HOST`, `PORT`, `CREDENTIAL_SECRET` and `DEMO_TOWN_ID`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`ApiConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?,
            None => 8081,
        };
        let credential_secret = lookup("CREDENTIAL_SECRET")
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| {
                AppError::Config("CREDENTIAL_SECRET environment variable must be set".to_string())
            })?;
        let demo_town_id = lookup("DEMO_TOWN_ID").filter(|id| !id.is_empty());

        Ok(Self {
            host,
            port,
            credential_secret,
            demo_town_id,
        })
    }

    /// Address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `host:port` is not a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

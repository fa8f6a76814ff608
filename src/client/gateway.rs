//! HTTP client for the notes API.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use super::session::Session;
use crate::models::{ErrorBody, ValidationError};

/// Message used when the server does not explain a failure.
pub const GENERIC_FAILURE: &str = "Request failed";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{message}")]
    Api { status: StatusCode, message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Note {0} is not loaded")]
    UnknownNote(Uuid),

    #[error("Could not reach server: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid endpoint: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    /// The server rejected the session token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Api { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Stateless request function over a shared connection pool.
#[derive(Clone)]
pub struct ApiGateway {
    client: Client,
    base_url: String,
}

impl ApiGateway {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let base_url = base_url.into();
        Url::parse(&base_url)?;

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue one request.
    ///
    /// The body, if any, is sent as JSON, and the session's token goes in
    /// `Authorization: Bearer`. A non-success status becomes
    /// [`ClientError::Api`] carrying the server's `error` message.
    pub async fn request<T, B>(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&B>,
        session: Option<&Session>,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = Url::parse(&format!("{}{}", self.base_url, endpoint))?;

        let mut req = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");

        if let Some(session) = session {
            req = req.header(AUTHORIZATION, format!("Bearer {}", session.token));
        }

        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .map(|body| body.error)
                .filter(|msg| !msg.is_empty())
                .unwrap_or_else(|| GENERIC_FAILURE.to_string());
            return Err(ClientError::Api { status, message });
        }

        Ok(response.json::<T>().await?)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        session: Option<&Session>,
    ) -> Result<T, ClientError> {
        self.request(endpoint, Method::GET, None::<&()>, session).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        session: Option<&Session>,
    ) -> Result<T, ClientError> {
        self.request(endpoint, Method::DELETE, None::<&()>, session).await
    }
}

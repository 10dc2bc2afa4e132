use std::ops::Deref;

use crate::{response::Response, transport::PartialResponse};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Serialization error: {0}")]
    SerializeError(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] HttpError),
}

/// A failed call: a non-2xx status or a transport failure.
///
/// Carries every field of [`Response`] (reachable through `Deref`) so failure
/// handlers can inspect status, headers and body without another request.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct HttpError {
    message: String,
    response: Response,
}

impl HttpError {
    pub(crate) fn new(message: impl Into<String>, response: Response) -> Self {
        Self {
            message: message.into(),
            response,
        }
    }

    /// `"<status_code> <status_text>"` for a response that is not ok.
    pub(crate) fn from_status(response: Response) -> Self {
        let message = format!("{} {}", response.status_code(), response.status_text());
        Self::new(message.trim_end(), response)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn into_response(self) -> Response {
        self.response
    }
}

impl Deref for HttpError {
    type Target = Response;

    fn deref(&self) -> &Self::Target {
        &self.response
    }
}

/// Failure reported by a [`Transport`](crate::Transport).
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    partial: Option<PartialResponse>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            partial: None,
        }
    }

    /// Attaches the response data seen before the failure.
    pub fn with_partial(mut self, partial: PartialResponse) -> Self {
        self.partial = Some(partial);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn partial(&self) -> Option<&PartialResponse> {
        self.partial.as_ref()
    }

    pub(crate) fn into_parts(self) -> (String, Option<PartialResponse>) {
        (self.message, self.partial)
    }
}

pub type StdResult<T, E> = std::result::Result<T, E>;

pub type Result<T> = std::result::Result<T, Error>;

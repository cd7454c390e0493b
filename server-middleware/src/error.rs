use bytes::Bytes;
use http::StatusCode;
use thiserror::Error;

use crate::Response;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// There was an error running some middleware or handler
    #[error("Middleware error: {0}")]
    Middleware(#[from] anyhow::Error),
    /// A handler gave up on the request with an explicit HTTP status
    #[error("{status}: {message}")]
    Status { status: StatusCode, message: String },
    /// A response could not be assembled
    #[error("Response error: {0}")]
    Http(#[from] http::Error),
}

impl Error {
    pub fn middleware<E>(err: E) -> Self
    where
        E: 'static + Send + Sync + std::error::Error,
    {
        Error::Middleware(err.into())
    }

    /// Builds an error carrying an explicit HTTP status code.
    ///
    /// The message defaults to the canonical reason phrase when empty.
    pub fn status<M: Into<String>>(status: StatusCode, message: M) -> Self {
        let message = message.into();
        let message = if message.is_empty() {
            status.canonical_reason().unwrap_or_default().to_string()
        } else {
            message
        };
        Error::Status { status, message }
    }

    /// Returns the status code carried by the error, if it was raised with one.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Error::Status { status, .. } => Some(*status),
            Error::Middleware(_) | Error::Http(_) => None,
        }
    }

    /// Returns true if the error carries an explicit HTTP status code.
    pub fn is_status(&self) -> bool {
        self.status_code().is_some()
    }

    /// Renders the error the way the [`App`](crate::App) reports it to clients.
    ///
    /// Errors without a status become `500 Internal Server Error`.
    pub fn into_response(self) -> Response {
        let status = self
            .status_code()
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = match self {
            Error::Status { message, .. } => Bytes::from(message),
            _ => Bytes::from_static(
                StatusCode::INTERNAL_SERVER_ERROR
                    .canonical_reason()
                    .unwrap_or_default()
                    .as_bytes(),
            ),
        };

        let mut response = Response::new(body);
        *response.status_mut() = status;
        response
    }
}

use std::fmt::{self, Debug, Display};

use hyper::{Body, Response, StatusCode};
use log::{debug, trace};

use crate::handler::IntoResponse;
use crate::helpers::http::response::create_empty_response;
use crate::state::{request_id, State};

/// Describes an error which occurred during handler execution, and allows the creation of a HTTP
/// `Response`.
///
/// Any error convertible into `anyhow::Error` converts into a `HandlerError` with status
/// `500 Internal Server Error`, so handlers written as `async` blocks can use `?` freely.
pub struct HandlerError {
    status_code: StatusCode,
    cause: anyhow::Error,
}

impl Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerError")
            .field("status_code", &self.status_code)
            .field("cause", &self.cause)
            .finish()
    }
}

impl Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.cause, self.status_code)
    }
}

impl<E> From<E> for HandlerError
where
    E: Into<anyhow::Error> + Display,
{
    fn from(error: E) -> HandlerError {
        trace!(" converting Error to HandlerError: {}", error);

        HandlerError {
            status_code: StatusCode::INTERNAL_SERVER_ERROR,
            cause: error.into(),
        }
    }
}

impl HandlerError {
    /// Returns the HTTP status code associated with this `HandlerError`.
    pub fn status(&self) -> StatusCode {
        self.status_code
    }

    /// Sets the HTTP status code of the response which is generated from this `HandlerError`.
    pub fn with_status(self, status_code: StatusCode) -> HandlerError {
        HandlerError {
            status_code,
            ..self
        }
    }

    /// Attempt to downcast the cause by reference.
    pub fn downcast_cause_ref<E>(&self) -> Option<&E>
    where
        E: Display + Debug + Send + Sync + 'static,
    {
        self.cause.downcast_ref()
    }

    /// Returns the underlying cause.
    pub fn cause(&self) -> &anyhow::Error {
        &self.cause
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self, state: &State) -> Response<Body> {
        debug!(
            "[{}] HandlerError generating {} {} response: {}",
            request_id(state),
            self.status_code.as_u16(),
            self.status_code
                .canonical_reason()
                .unwrap_or("(unregistered)"),
            self.cause
        );

        create_empty_response(state, self.status_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io;

    #[test]
    fn converts_any_error_with_default_status() {
        let err: HandlerError = io::Error::new(io::ErrorKind::Other, "disk on fire").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.downcast_cause_ref::<io::Error>().is_some());
    }

    #[test]
    fn with_status_keeps_cause() {
        let err = HandlerError::from(anyhow::anyhow!("nope")).with_status(StatusCode::IM_A_TEAPOT);
        assert_eq!(err.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(err.cause().to_string(), "nope");
    }
}

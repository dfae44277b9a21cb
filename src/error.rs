use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;

/// Failure that is our fault rather than the user's or a provider's,
/// e.g. a template that did not render.
#[derive(Debug)]
pub struct InternalError {
    pub message: String,
}

impl InternalError {
    pub fn new(message: String) -> InternalError {
        InternalError { message }
    }
}

impl From<askama::Error> for InternalError {
    fn from(err: askama::Error) -> Self {
        InternalError::new(format!("Failed to render template: {err}"))
    }
}

impl IntoResponse for InternalError {
    fn into_response(self) -> Response {
        error!(
            "Error encountered while processing request: {}",
            self.message
        );
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn internal_error_is_500() {
        let response = InternalError::new("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

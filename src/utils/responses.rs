//! HTTP response helpers
//!
//! Error bodies always have the shape `{"error": <code>, "message": <text>}`.

use actix_web::{cookie::Cookie, http::header, HttpResponse};
use serde_json::json;

use crate::authentication::RejectReason;

/// Unified response builder for the login endpoints
pub struct ResponseBuilder;

impl ResponseBuilder {
    /// Create an `Unauthorized` (401) error response
    #[must_use]
    pub fn unauthorized() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::Unauthorized)
    }

    /// Create an `InternalServerError` (500) error response
    #[must_use]
    pub fn internal_server_error() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::InternalServerError)
    }

    /// Create a `ServiceUnavailable` (503) error response
    #[must_use]
    pub fn service_unavailable() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::ServiceUnavailable)
    }

    /// Create a redirect response (302 Found)
    #[must_use]
    pub fn redirect(location: &str) -> RedirectBuilder {
        RedirectBuilder::new(location)
    }

    /// 401 answer for a rejected login, carrying only the user-facing message
    #[must_use]
    pub fn login_rejected(reason: &RejectReason) -> ErrorResponseBuilder {
        Self::unauthorized()
            .with_error_code(reason.code())
            .with_message(&reason.user_message())
    }
}

#[derive(Clone, Copy)]
enum ErrorType {
    Unauthorized,
    InternalServerError,
    ServiceUnavailable,
}

impl ErrorType {
    fn default_error_code(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::InternalServerError => "server_error",
            Self::ServiceUnavailable => "service_unavailable",
        }
    }

    fn default_message(self) -> &'static str {
        match self {
            Self::Unauthorized => "Authentication is required to access this resource",
            Self::InternalServerError => "An internal server error occurred",
            Self::ServiceUnavailable => "The service is temporarily unavailable",
        }
    }
}

/// Builder for error responses
pub struct ErrorResponseBuilder {
    error_type: ErrorType,
    error_code: Option<String>,
    message: Option<String>,
    cookies: Vec<Cookie<'static>>,
}

impl ErrorResponseBuilder {
    fn new(error_type: ErrorType) -> Self {
        Self {
            error_type,
            error_code: None,
            message: None,
            cookies: Vec::new(),
        }
    }

    /// Set a custom error code (e.g. "`invalid_state`")
    #[must_use]
    pub fn with_error_code(mut self, code: &str) -> Self {
        self.error_code = Some(code.to_string());
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    #[must_use]
    pub fn build(self) -> HttpResponse {
        let error = self
            .error_code
            .unwrap_or_else(|| self.error_type.default_error_code().to_string());
        let message = self
            .message
            .unwrap_or_else(|| self.error_type.default_message().to_string());

        let mut response = match self.error_type {
            ErrorType::Unauthorized => HttpResponse::Unauthorized(),
            ErrorType::InternalServerError => HttpResponse::InternalServerError(),
            ErrorType::ServiceUnavailable => HttpResponse::ServiceUnavailable(),
        };
        for cookie in self.cookies {
            response.cookie(cookie);
        }
        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .json(json!({ "error": error, "message": message }))
    }
}

/// Builder for redirect responses
pub struct RedirectBuilder {
    location: String,
    cookies: Vec<Cookie<'static>>,
}

impl RedirectBuilder {
    fn new(location: &str) -> Self {
        Self {
            location: location.to_string(),
            cookies: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    #[must_use]
    pub fn build(self) -> HttpResponse {
        let mut builder = HttpResponse::Found();
        for cookie in self.cookies {
            builder.cookie(cookie);
        }
        builder
            .append_header((header::LOCATION, self.location))
            .finish()
    }
}

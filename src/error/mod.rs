use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::session::SessionError;
use crate::template::TemplateError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Template(TemplateError::LookupMiss(_)) => "TEMPLATE_MISSING",
            AppError::Template(TemplateError::Execution { .. }) => "TEMPLATE_EXECUTION",
            AppError::Template(_) => "TEMPLATE_ERROR",
            AppError::Session(_) => "SESSION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Pair the error with the deployment mode (`app.in_production`)
    pub fn respond(self, in_production: bool) -> ErrorResponse {
        ErrorResponse {
            error: self,
            in_production,
        }
    }
}

/// An [`AppError`] ready to be sent; details are hidden from clients in production
#[derive(Debug)]
pub struct ErrorResponse {
    error: AppError,
    in_production: bool,
}

impl ErrorResponse {
    pub fn error(&self) -> &AppError {
        &self.error
    }

    fn client_message(&self) -> String {
        match &self.error {
            AppError::NotFound(_) => self.error.to_string(),
            _ if self.in_production => "Internal server error".to_string(),
            e => e.to_string(),
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let client_message = self.client_message();

        // Always log the detailed error server-side
        tracing::error!(
            code = %self.error.error_code(),
            status = %status.as_u16(),
            message = %self.error,
            "Request failed"
        );

        let body = format!(
            "<!doctype html><html><head><title>{status}</title></head>\
             <body><h1>{status}</h1><p>{}</p></body></html>",
            tera::escape_html(&client_message),
        );

        (status, Html(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_of(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn compile_error() -> AppError {
        AppError::Template(TemplateError::Compile {
            path: "/srv/site/templates/home.page.tmpl".into(),
            message: "unexpected end of block".to_string(),
        })
    }

    #[test]
    fn test_lookup_miss_is_server_error() {
        let response = AppError::Template(TemplateError::LookupMiss("x.page.tmpl".to_string()))
            .respond(false)
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_not_found_status() {
        let response = AppError::NotFound("/nope".to_string())
            .respond(true)
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_production_hides_template_path() {
        let response = compile_error().respond(true).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_of(response).await;
        assert!(body.contains("Internal server error"));
        assert!(!body.contains("home.page.tmpl"));
        assert!(!body.contains("/srv/site"));
    }

    #[tokio::test]
    async fn test_development_shows_escaped_detail() {
        let body = body_of(compile_error().respond(false).into_response()).await;
        assert!(body.contains("home.page.tmpl"));

        let body = body_of(
            AppError::Internal("<script>".to_string())
                .respond(false)
                .into_response(),
        )
        .await;
        assert!(body.contains("&lt;script&gt;"));
        assert!(!body.contains("<script>"));
    }
}

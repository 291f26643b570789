use crate::services::llm::GenerateError;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// `Json` whose rejections are reported as [`AppError::Validation`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `Path` whose rejections are reported as [`AppError::Validation`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// Errors returned by the JSON routes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Erro ao gerar prompts: {0}")]
    Generate(#[from] GenerateError),

    #[error("Uma geração mais recente substituiu esta solicitação.")]
    Superseded,

    #[error("Nenhum prompt disponível para copiar.")]
    NothingToCopy,
}

pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Generate(GenerateError::EmptyResponse) => {
                (StatusCode::BAD_GATEWAY, "EMPTY_RESPONSE")
            }
            AppError::Generate(GenerateError::Communication(_)) => {
                (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR")
            }
            AppError::Superseded => (StatusCode::CONFLICT, "SUPERSEDED"),
            AppError::NothingToCopy => (StatusCode::NOT_FOUND, "NOTHING_TO_COPY"),
        };

        let body = json!({
            "error": self.to_string(),
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

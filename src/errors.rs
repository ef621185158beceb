// src/errors.rs

use axum::{
    extract::multipart::MultipartError,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::models::FieldName;
use crate::notifications::Notification;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Przekroczono limit załączników ({limit})")]
    AttachmentLimitExceeded { limit: usize },

    #[error("Brak tokenu sesji")]
    MissingCredential,

    #[error("Wysyłka produktu nie powiodła się: {0}")]
    SubmissionFailed(String),

    #[error("Wysyłka produktu już trwa")]
    SubmissionInProgress,

    #[error("Błędy walidacji")]
    ValidationError(#[from] ValidationErrors),

    #[error("Nieprawidłowe dane wejściowe: {0}")]
    UnprocessableEntity(String),

    #[error("Niepoprawne żądanie: {0}")]
    BadRequest(String),

    #[error("Nie znaleziono zasobu")]
    NotFound,

    #[error("Błąd konfiguracji: {0}")]
    Configuration(String),

    #[error("Wewnętrzny błąd serwera: {0}")]
    InternalServerError(String),
}

impl AppError {
    /// Komunikat, który widzi administrator. Szczegóły błędów serwera trafiają tylko do logów.
    pub fn user_message(&self) -> String {
        match self {
            AppError::AttachmentLimitExceeded { limit } => {
                format!("You can only upload up to {} files.", limit)
            }
            AppError::MissingCredential => "Token not found. Please log in first.".to_string(),
            AppError::SubmissionFailed(_) => {
                "An error occurred while adding the product.".to_string()
            }
            AppError::SubmissionInProgress => {
                "The product is already being submitted.".to_string()
            }
            AppError::ValidationError(errors) => {
                let mut messages = Vec::new();
                for (field, field_errors) in errors.field_errors() {
                    let label = FieldName::from_struct_field(&field)
                        .map_or_else(|| field.to_string(), |f| f.label().to_string());
                    for error in field_errors {
                        let msg = error.message.as_ref().map_or_else(
                            || format!("Field '{}' is invalid", label),
                            |m| format!("{}: {}", label, m),
                        );
                        messages.push(msg);
                    }
                }
                messages.sort();
                messages.join("; ")
            }
            AppError::UnprocessableEntity(message) | AppError::BadRequest(message) => {
                message.clone()
            }
            AppError::NotFound => "Resource not found.".to_string(),
            AppError::Configuration(_) | AppError::InternalServerError(_) => {
                "Internal server error.".to_string()
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::AttachmentLimitExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::MissingCredential => StatusCode::UNAUTHORIZED,
            AppError::SubmissionFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::SubmissionInProgress => StatusCode::CONFLICT,
            AppError::ValidationError(_) | AppError::UnprocessableEntity(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Configuration(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn notification(&self) -> Notification {
        Notification::Failure {
            message: self.user_message(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Configuration(detail) | AppError::InternalServerError(detail) => {
                tracing::error!("Wewnętrzny błąd serwera: {}", detail);
            }
            other => tracing::warn!("Żądanie odrzucone: {}", other),
        }

        let status = self.status_code();
        let error_message = self.user_message();

        // Toast dla htmx, nawet gdy odpowiedź nie jest podmieniana
        let mut headers = HeaderMap::new();
        if let Ok(val) = HeaderValue::from_str(&self.notification().to_trigger().to_string()) {
            headers.insert("HX-Trigger", val);
        }

        let body = Json(json!({ "error": error_message }));
        (status, headers, body).into_response()
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        tracing::error!("Błąd przetwarzania Multipart: {:?}", err);
        AppError::UnprocessableEntity(format!("Could not read the uploaded form: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            tracing::error!("Szczegóły błędu budowania Reqwest: {:?}", err);
        }
        AppError::SubmissionFailed(format!("Błąd połączenia z API produktów: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_failure_hides_detail_from_user() {
        let err = AppError::SubmissionFailed("connection reset by peer".to_string());
        assert_eq!(
            err.user_message(),
            "An error occurred while adding the product."
        );
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn validation_message_uses_form_labels() {
        use crate::models::FormFields;
        use validator::Validate;

        let fields = FormFields {
            fuel_type: "Steam".to_string(),
            ..crate::models::tests::filled_fields()
        };
        let err = AppError::from(fields.validate().unwrap_err());
        let message = err.user_message();
        assert_eq!(message, "Fuel Type: pick an option");
        assert!(!message.contains("fuel_type"));
    }

    #[test]
    fn error_response_carries_toast_trigger() {
        let response = AppError::AttachmentLimitExceeded { limit: 20 }.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let trigger = response
            .headers()
            .get("HX-Trigger")
            .and_then(|v| v.to_str().ok())
            .unwrap();
        let payload: serde_json::Value = serde_json::from_str(trigger).unwrap();
        assert_eq!(payload["showMessage"]["type"], "error");
        assert_eq!(
            payload["showMessage"]["message"],
            "You can only upload up to 20 files."
        );
    }
}

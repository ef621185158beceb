// src/notifications.rs

use axum::http::{HeaderMap, HeaderValue};
use serde_json::{Value, json};

pub const PRODUCT_ADDED_TITLE: &str = "Product Added Successfully!";
pub const PRODUCT_ADDED_TEXT: &str = "Your product has been added.";

/// Powiadomienia pokazywane na stronie przez `static/admin.js`.
/// Treść jest stała, nie zależy od odpowiedzi serwera API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Okno z tytułem, treścią i przyciskiem potwierdzenia (SweetAlert2).
    Success {
        title: String,
        text: String,
        confirm_button_text: String,
    },
    /// Zwykły komunikat o błędzie.
    Failure { message: String },
}

impl Notification {
    pub fn product_added() -> Self {
        Notification::Success {
            title: PRODUCT_ADDED_TITLE.to_string(),
            text: PRODUCT_ADDED_TEXT.to_string(),
            confirm_button_text: "OK".to_string(),
        }
    }

    /// Payload nagłówka `HX-Trigger`.
    pub fn to_trigger(&self) -> Value {
        match self {
            Notification::Success {
                title,
                text,
                confirm_button_text,
            } => json!({
                "showAlert": {
                    "icon": "success",
                    "title": title,
                    "text": text,
                    "confirmButtonText": confirm_button_text
                }
            }),
            Notification::Failure { message } => json!({
                "showMessage": {
                    "type": "error",
                    "message": message
                }
            }),
        }
    }

    pub fn into_headers(self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        match HeaderValue::from_str(&self.to_trigger().to_string()) {
            Ok(val) => {
                headers.insert("HX-Trigger", val);
            }
            Err(e) => tracing::error!("Nie można utworzyć nagłówka HX-Trigger: {}", e),
        }
        headers
    }
}

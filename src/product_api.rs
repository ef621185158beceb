// src/product_api.rs

use async_trait::async_trait;
use reqwest::{Client, StatusCode, multipart};
use url::Url;

use crate::{errors::AppError, models::StagedFile};

/// Nazwa pola, pod którą wysyłane są wszystkie pliki obrazów.
pub const IMAGES_FIELD: &str = "images";

/// Gotowe do wysłania dane produktu (migawka formularza).
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub token: String,
    pub fields: Vec<(&'static str, String)>,
    pub images: Vec<StagedFile>,
}

impl SubmissionRequest {
    /// Buduje formularz multipart: najpierw pola tekstowe, potem obrazy w kolejności wyświetlania.
    pub fn into_form(self) -> Result<multipart::Form, AppError> {
        let mut form = multipart::Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }

        for image in self.images {
            let mime = if image.content_type.is_empty() {
                "image/*".to_string()
            } else {
                image.content_type
            };
            let part = multipart::Part::bytes(image.bytes.to_vec())
                .file_name(image.file_name)
                .mime_str(&mime)
                .map_err(|e| {
                    tracing::error!("Błąd ustawiania typu MIME '{}': {}", mime, e);
                    AppError::InternalServerError(
                        "Wewnętrzny błąd podczas przygotowania pliku".to_string(),
                    )
                })?;
            form = form.part(IMAGES_FIELD, part);
        }

        Ok(form)
    }
}

/// Zdalne API tworzenia produktów.
#[async_trait]
pub trait ProductApi: Send + Sync {
    async fn create_product(&self, request: SubmissionRequest) -> Result<(), AppError>;
}

pub struct HttpProductApi {
    client: Client,
    endpoint: Url,
}

impl HttpProductApi {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl ProductApi for HttpProductApi {
    async fn create_product(&self, request: SubmissionRequest) -> Result<(), AppError> {
        let image_count = request.images.len();
        let token = request.token.clone();
        let form = request.into_form()?;

        tracing::debug!(
            "Wysyłanie produktu do {} ({} obrazów)",
            self.endpoint,
            image_count
        );

        // reqwest sam ustawia Content-Type: multipart/form-data z boundary
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::OK {
            tracing::info!("API produktów przyjęło nowy produkt");
            Ok(())
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Brak treści błędu".to_string());
            Err(AppError::SubmissionFailed(format!(
                "API produktów zwróciło status {}: {}",
                status, error_text
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        extract::{Multipart, State},
        http::HeaderMap,
        routing::post,
    };
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    #[derive(Debug, Default)]
    struct Captured {
        authorization: Option<String>,
        content_type: Option<String>,
        parts: Vec<(String, Option<String>, Vec<u8>)>,
    }

    #[derive(Clone)]
    struct ReceiverState {
        captured: Arc<Mutex<Captured>>,
        status: axum::http::StatusCode,
    }

    async fn receive(
        State(state): State<ReceiverState>,
        headers: HeaderMap,
        mut multipart: Multipart,
    ) -> axum::http::StatusCode {
        let mut captured = state.captured.lock().await;
        captured.authorization = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        captured.content_type = headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let bytes = field.bytes().await.unwrap().to_vec();
            captured.parts.push((name, file_name, bytes));
        }
        state.status
    }

    async fn spawn_receiver(status: axum::http::StatusCode) -> (Url, Arc<Mutex<Captured>>) {
        let captured = Arc::new(Mutex::new(Captured::default()));
        let app = Router::new()
            .route("/api/product/add", post(receive))
            .with_state(ReceiverState {
                captured: captured.clone(),
                status,
            });
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let url = Url::parse(&format!("http://{}/api/product/add", addr)).unwrap();
        (url, captured)
    }

    fn sample_request() -> SubmissionRequest {
        SubmissionRequest {
            token: "secret-token".to_string(),
            fields: vec![
                ("name", "Honda Fit".to_string()),
                ("seats", "5".to_string()),
            ],
            images: vec![
                StagedFile::new("side.jpg", "image/jpeg", vec![2u8; 4]),
                StagedFile::new("front.png", "image/png", vec![1u8; 3]),
            ],
        }
    }

    #[tokio::test]
    async fn sends_bearer_token_and_ordered_parts() {
        let (url, captured) = spawn_receiver(axum::http::StatusCode::OK).await;
        let api = HttpProductApi::new(url);

        api.create_product(sample_request()).await.unwrap();

        let captured = captured.lock().await;
        assert_eq!(
            captured.authorization.as_deref(),
            Some("Bearer secret-token")
        );
        assert!(
            captured
                .content_type
                .as_deref()
                .unwrap()
                .starts_with("multipart/form-data")
        );
        let summary: Vec<(&str, Option<&str>)> = captured
            .parts
            .iter()
            .map(|(name, file, _)| (name.as_str(), file.as_deref()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("name", None),
                ("seats", None),
                ("images", Some("side.jpg")),
                ("images", Some("front.png")),
            ]
        );
        assert_eq!(captured.parts[0].2, b"Honda Fit");
        assert_eq!(captured.parts[3].2, vec![1u8; 3]);
    }

    #[tokio::test]
    async fn non_200_status_is_a_failure() {
        let (url, _captured) = spawn_receiver(axum::http::StatusCode::CREATED).await;
        let api = HttpProductApi::new(url);

        let err = api.create_product(sample_request()).await.unwrap_err();
        assert!(matches!(err, AppError::SubmissionFailed(_)));
    }

    #[tokio::test]
    async fn transport_error_is_a_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api =
            HttpProductApi::new(Url::parse(&format!("http://{}/api/product/add", addr)).unwrap());
        let err = api.create_product(sample_request()).await.unwrap_err();
        assert!(matches!(err, AppError::SubmissionFailed(_)));
    }
}

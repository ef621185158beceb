// src/session.rs

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    RequestPartsExt,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::{
    TypedHeader,
    extract::cookie::CookieJar,
    headers::{Authorization, authorization::Bearer},
};
use moka::future::Cache;
use moka::notification::RemovalCause;
use uuid::Uuid;

use crate::{errors::AppError, preview::PreviewRegistry, staging::StagingSession, state::AppState};

/// Ciasteczko z tokenem administratora (ustawiane przez stronę logowania).
pub const TOKEN_COOKIE: &str = "token";
/// Ciasteczko identyfikujące sesję formularza "add product".
pub const FORM_COOKIE: &str = "product_form";

/// Jawny kontekst sesji: token albo jego brak.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    token: Option<String>,
}

impl SessionContext {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Najpierw nagłówek Authorization, potem ciasteczko
        if let Ok(TypedHeader(Authorization(bearer))) =
            parts.extract::<TypedHeader<Authorization<Bearer>>>().await
        {
            return Ok(SessionContext::new(Some(bearer.token().to_owned())));
        }

        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(TOKEN_COOKIE).map(|c| c.value().to_owned());
        Ok(SessionContext::new(token))
    }
}

/// Strażnik trasy strony formularza: bez tokenu przekierowanie do logowania.
pub async fn require_session(
    State(app_state): State<AppState>,
    session: SessionContext,
    request: Request,
    next: Next,
) -> Response {
    if session.is_authenticated() {
        return next.run(request).await;
    }

    let login_url = app_state.config.login_url.as_str();
    tracing::info!(
        "Brak tokenu sesji dla {} - przekierowanie do {}",
        request.uri().path(),
        login_url
    );

    if request.headers().contains_key("HX-Request") {
        if let Ok(val) = HeaderValue::from_str(login_url) {
            let mut headers = HeaderMap::new();
            headers.insert("HX-Redirect", val);
            return (StatusCode::OK, headers).into_response();
        }
    }
    Redirect::to(login_url).into_response()
}

/// Strażnik tras htmx formularza: bez tokenu 401 z komunikatem, nic nie jest zapisywane.
pub async fn require_api_session(
    session: SessionContext,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !session.is_authenticated() {
        tracing::warn!(
            "Odrzucono {} {} - brak tokenu sesji",
            request.method(),
            request.uri().path()
        );
        return Err(AppError::MissingCredential);
    }
    Ok(next.run(request).await)
}

/// Id sesji formularza z ciasteczka `product_form`.
pub struct FormSessionId(pub Uuid);

impl FormSessionId {
    pub fn from_jar(jar: &CookieJar) -> Option<Uuid> {
        jar.get(FORM_COOKIE)
            .and_then(|c| Uuid::parse_str(c.value()).ok())
    }
}

impl<S> FromRequestParts<S> for FormSessionId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        FormSessionId::from_jar(&jar).map(FormSessionId).ok_or_else(|| {
            tracing::warn!("Brak lub niepoprawne ciasteczko {}", FORM_COOKIE);
            AppError::BadRequest("The form session has expired. Reload the page.".to_string())
        })
    }
}

/// Sesje formularzy w pamięci, wygasające po bezczynności.
/// Liczba sesji jest ograniczona, najrzadziej używane wypadają pierwsze.
#[derive(Clone)]
pub struct FormStore {
    cache: Cache<Uuid, Arc<StagingSession>>,
    previews: PreviewRegistry,
    max_attachments: usize,
}

impl FormStore {
    pub fn new(
        previews: PreviewRegistry,
        max_attachments: usize,
        idle: Duration,
        max_sessions: u64,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_sessions)
            .time_to_idle(idle)
            .eviction_listener(
                |id: Arc<Uuid>, session: Arc<StagingSession>, cause: RemovalCause| {
                    tracing::info!("Zamknięto sesję formularza {} ({:?})", id, cause);
                    session.discard();
                },
            )
            .build();

        Self {
            cache,
            previews,
            max_attachments,
        }
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    pub async fn get_or_create(&self, id: Uuid) -> Arc<StagingSession> {
        let previews = self.previews.clone();
        let max_attachments = self.max_attachments;
        self.cache
            .get_with(id, async move {
                tracing::info!("Nowa sesja formularza {}", id);
                Arc::new(StagingSession::new(id, previews, max_attachments))
            })
            .await
    }

    /// Porzuca sesję: anuluje trwającą wysyłkę, podglądy znikają z ostatnią referencją.
    pub async fn discard(&self, id: &Uuid) -> bool {
        match self.cache.remove(id).await {
            Some(session) => {
                session.discard();
                tracing::debug!(
                    "Porzucono sesję formularza {}, żywe podglądy: {}",
                    id,
                    self.previews.live_count()
                );
                true
            }
            None => false,
        }
    }
}

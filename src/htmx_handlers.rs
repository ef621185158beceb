// src/htmx_handlers.rs

use std::collections::HashMap;

use axum::{
    Form,
    extract::{Multipart, Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use maud::{Markup, html};
use strum::IntoEnumIterator;
use uuid::Uuid;

use crate::{
    errors::AppError,
    models::{FieldName, StagedFile},
    product_api::IMAGES_FIELD,
    response::build_response,
    session::{FORM_COOKIE, FormSessionId, SessionContext, TOKEN_COOKIE},
    staging::AttachmentStagingForm,
    state::AppState,
};

const PAGE_TITLE: &str = "Add New Product";
const FORM_BASE: &str = "/htmx/admin/product-form";

fn form_session_cookie(id: Uuid) -> Cookie<'static> {
    Cookie::build((FORM_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

// --- Renderowanie (maud) ---

fn render_field_maud(field: FieldName, value: &str) -> Markup {
    let name: &'static str = field.into();
    let input_class = "w-full mt-1 p-2 border rounded-md border-[#A2A2A2]";
    html! {
        div class=(if field == FieldName::Description { "sm:col-span-2 lg:col-span-3" } else { "" }) {
            label class="block text-sm font-medium text-gray-700" for=(name) { (field.label()) }
            @if let Some((placeholder, options)) = field.options() {
                select id=(name) name=(name) class=(input_class) required[field.is_required()]
                       "hx-post"=(format!("{}/field", FORM_BASE)) "hx-trigger"="change" "hx-swap"="none" {
                    option value="" { (placeholder) }
                    @for option in &options {
                        option value=(option) selected[option == value] { (option) }
                    }
                }
            } @else if field == FieldName::Description {
                textarea id=(name) name=(name) class=(input_class) rows="4" required[field.is_required()]
                         "hx-post"=(format!("{}/field", FORM_BASE)) "hx-trigger"="change" "hx-swap"="none" {
                    (value)
                }
            } @else {
                input id=(name) type=(if field == FieldName::Seats { "number" } else { "text" })
                      name=(name) value=(value) class=(input_class) required[field.is_required()]
                      "hx-post"=(format!("{}/field", FORM_BASE)) "hx-trigger"="change" "hx-swap"="none";
            }
        }
    }
}

/// Siatka miniatur. Zdarzenia drag obsługuje `static/admin.js` na podstawie `data-index`.
pub fn render_attachment_grid_maud(form: &AttachmentStagingForm) -> Markup {
    let drag = form.drag();
    html! {
        div #attachment-grid class="flex w-full flex-wrap gap-2" {
            @for (index, attachment) in form.attachments().iter().enumerate() {
                @let border = if drag.hover_index == Some(index) { "border-blue-500" } else { "border-gray-400" };
                div class=(format!("attachment relative border-2 border-dashed {} p-1 w-20 h-24 flex items-center justify-center transition-colors duration-200 cursor-move", border))
                    draggable="true"
                    data-index=(index)
                    title=(format!("{} ({})", attachment.name, attachment.staged_at.format("%H:%M:%S"))) {
                    img src=(attachment.preview_url()) alt=(attachment.name) class="object-cover w-full h-full";
                    button type="button"
                           class="absolute -top-2 -right-2 p-0.5 bg-white rounded-full text-red-500"
                           "hx-delete"=(format!("{}/attachments/{}", FORM_BASE, attachment.id))
                           "hx-target"="#attachment-grid" "hx-swap"="outerHTML"
                           aria-label=(format!("Remove {}", attachment.name)) {
                        "✕"
                    }
                }
            }
        }
    }
}

pub fn render_submit_button_maud(submitting: bool) -> Markup {
    html! {
        button #submit-product type="submit" form="product-form"
               class="bg-red-800 text-white px-6 py-2 rounded-md hover:bg-red-700 transition"
               disabled[submitting] {
            @if submitting {
                div class="animate-spin rounded-full h-7 w-7 border-t-2 border-b-2 text-white" {}
            } @else {
                span class="submit-label" { "Add Product" }
                div class="submit-spinner htmx-indicator animate-spin rounded-full h-7 w-7 border-t-2 border-b-2 text-white" {}
            }
        }
    }
}

pub fn render_product_form_maud(form: &AttachmentStagingForm) -> Markup {
    html! {
        div class="max-w-6xl mx-auto p-4 bg-white rounded-lg shadow-md mt-32 border-2 border-gray-300 hover:border-gray-400 h-auto" {
            div class="flex items-center justify-between" {
                h2 class="text-3xl text-center font-semibold py-3 text-gray-800 mb-4" { (PAGE_TITLE) }
                button type="button" class="text-sm text-gray-600 hover:underline"
                       "hx-delete"=(FORM_BASE) "hx-target"="#admin-content" "hx-swap"="innerHTML"
                       "hx-confirm"="Discard this product and all staged images?" {
                    "Clear form"
                }
            }

            form #product-form class="grid grid-cols-1 sm:grid-cols-2 lg:grid-cols-3 gap-4"
                 "hx-post"=(format!("{}/submit", FORM_BASE)) "hx-swap"="none"
                 "hx-indicator"="#submit-product" "hx-disabled-elt"="#submit-product" {
                @for field in FieldName::iter() {
                    (render_field_maud(field, form.fields().get(field)))
                }
            }

            // Osobny formularz: pliki idą jako multipart, pola jako urlencoded
            form #attachment-upload class="mt-4"
                 "hx-post"=(format!("{}/attachments", FORM_BASE)) "hx-encoding"="multipart/form-data"
                 "hx-target"="#attachment-grid" "hx-swap"="outerHTML" "hx-trigger"="change" {
                label class="block text-sm font-medium text-gray-700" for="images" {
                    "Upload Images (Max " (form.max_attachments()) ")"
                }
                input #images type="file" name=(IMAGES_FIELD) accept="image/*" multiple
                      class="w-full mt-1 p-2 border rounded-md border-[#A2A2A2]";
            }

            div class="mt-4" {
                (render_attachment_grid_maud(form))
            }

            div class="mt-4 flex justify-center" {
                (render_submit_button_maud(form.is_submitting()))
            }
        }
    }
}

// --- Handlery ---

/// Strona formularza (za strażnikiem `require_session`). Tworzy sesję formularza, jeśli jej brak.
pub async fn new_product_page_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> (CookieJar, Response) {
    let form_id = FormSessionId::from_jar(&jar).unwrap_or_else(Uuid::new_v4);
    tracing::info!("GET /admin/products/new - sesja formularza {}", form_id);

    let staging = app_state.forms.get_or_create(form_id).await;
    let form = staging.form.lock().await;
    let page = build_response(&headers, PAGE_TITLE, render_product_form_maud(&form));

    (jar.add(form_session_cookie(form_id)), page)
}

pub async fn update_field_htmx_handler(
    State(app_state): State<AppState>,
    FormSessionId(form_id): FormSessionId,
    Form(values): Form<HashMap<String, String>>,
) -> Result<StatusCode, AppError> {
    let staging = app_state.forms.get_or_create(form_id).await;
    let mut form = staging.form.lock().await;
    for (name, value) in values {
        let field = form.set_field(&name, value)?;
        tracing::debug!("Sesja {}: zmieniono pole {}", form_id, field);
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn upload_attachments_htmx_handler(
    State(app_state): State<AppState>,
    FormSessionId(form_id): FormSessionId,
    mut multipart: Multipart,
) -> Result<Markup, AppError> {
    let mut files: Vec<StagedFile> = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGES_FIELD) {
            tracing::warn!("Pominięto pole multipart {:?}", field.name());
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await?;

        // Pusty input pliku przeglądarka wysyła jako pustą część bez nazwy
        if bytes.is_empty() && file_name.is_empty() {
            continue;
        }
        if !content_type.starts_with("image/") {
            return Err(AppError::UnprocessableEntity(format!(
                "'{}' is not an image.",
                file_name
            )));
        }
        files.push(StagedFile::new(file_name, content_type, bytes));
    }

    let staging = app_state.forms.get_or_create(form_id).await;
    let mut form = staging.form.lock().await;
    let added = form.add_attachments(files)?;
    tracing::info!(
        "Sesja {}: dodano {} obrazów, razem {}",
        form_id,
        added,
        form.images().len()
    );
    Ok(render_attachment_grid_maud(&form))
}

pub async fn remove_attachment_htmx_handler(
    State(app_state): State<AppState>,
    FormSessionId(form_id): FormSessionId,
    Path(attachment_id): Path<Uuid>,
) -> Result<Markup, AppError> {
    let staging = app_state.forms.get_or_create(form_id).await;
    let mut form = staging.form.lock().await;
    if !form.remove_attachment(attachment_id) {
        tracing::debug!(
            "Sesja {}: brak załącznika {} do usunięcia",
            form_id,
            attachment_id
        );
    }
    Ok(render_attachment_grid_maud(&form))
}

pub async fn drag_start_htmx_handler(
    State(app_state): State<AppState>,
    FormSessionId(form_id): FormSessionId,
    Path(index): Path<usize>,
) -> StatusCode {
    let staging = app_state.forms.get_or_create(form_id).await;
    staging.form.lock().await.drag_start(index);
    StatusCode::NO_CONTENT
}

pub async fn drag_over_htmx_handler(
    State(app_state): State<AppState>,
    FormSessionId(form_id): FormSessionId,
    Path(index): Path<usize>,
) -> StatusCode {
    let staging = app_state.forms.get_or_create(form_id).await;
    staging.form.lock().await.drag_over(index);
    StatusCode::NO_CONTENT
}

pub async fn drag_leave_htmx_handler(
    State(app_state): State<AppState>,
    FormSessionId(form_id): FormSessionId,
) -> StatusCode {
    let staging = app_state.forms.get_or_create(form_id).await;
    staging.form.lock().await.drag_leave();
    StatusCode::NO_CONTENT
}

pub async fn drag_end_htmx_handler(
    State(app_state): State<AppState>,
    FormSessionId(form_id): FormSessionId,
) -> StatusCode {
    let staging = app_state.forms.get_or_create(form_id).await;
    staging.form.lock().await.drag_end();
    StatusCode::NO_CONTENT
}

/// Upuszczenie: klient podaje obie pozycje, więc utracone `/drag/start` nie gubi przeniesienia.
pub async fn drop_attachment_htmx_handler(
    State(app_state): State<AppState>,
    FormSessionId(form_id): FormSessionId,
    Path((from, target_index)): Path<(usize, usize)>,
) -> Markup {
    let staging = app_state.forms.get_or_create(form_id).await;
    let mut form = staging.form.lock().await;
    if form.move_attachment(from, target_index) {
        tracing::debug!(
            "Sesja {}: przeniesiono załącznik z pozycji {} na {}",
            form_id,
            from,
            target_index
        );
    }
    render_attachment_grid_maud(&form)
}

pub async fn preview_handler(
    State(app_state): State<AppState>,
    Path(key): Path<Uuid>,
) -> Result<Response, AppError> {
    let preview = app_state.forms.previews().get(&key).ok_or(AppError::NotFound)?;
    Ok((
        [
            (header::CONTENT_TYPE, preview.content_type),
            (header::CACHE_CONTROL, "private, max-age=3600".to_string()),
        ],
        preview.bytes,
    )
        .into_response())
}

/// Wysyła produkt. Pola przychodzą razem z formularzem, żeby nie zgubić ostatniej zmiany.
pub async fn submit_product_htmx_handler(
    State(app_state): State<AppState>,
    FormSessionId(form_id): FormSessionId,
    session: SessionContext,
    Form(values): Form<HashMap<String, String>>,
) -> Result<(HeaderMap, StatusCode), AppError> {
    tracing::info!("POST {}/submit - sesja {}", FORM_BASE, form_id);
    let staging = app_state.forms.get_or_create(form_id).await;
    {
        let mut form = staging.form.lock().await;
        for (name, value) in values {
            form.set_field(&name, value)?;
        }
    }

    let notification = staging
        .submit(&session, app_state.product_api.as_ref())
        .await?;
    Ok((notification.into_headers(), StatusCode::NO_CONTENT))
}

/// Porzuca formularz i zwraca nowy, pusty.
pub async fn discard_form_htmx_handler(
    State(app_state): State<AppState>,
    FormSessionId(form_id): FormSessionId,
) -> Markup {
    if app_state.forms.discard(&form_id).await {
        tracing::info!("Sesja formularza {} porzucona przez użytkownika", form_id);
    }
    let staging = app_state.forms.get_or_create(form_id).await;
    let form = staging.form.lock().await;
    render_product_form_maud(&form)
}

/// Czyści ciasteczko z tokenem i przekierowuje klienta do logowania.
pub async fn logout_handler(
    State(app_state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, HeaderMap, StatusCode), AppError> {
    tracing::info!("Obsługa żądania wylogowania: czyszczenie ciasteczka.");

    let cookie = Cookie::build((TOKEN_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::ZERO)
        .build();

    if let Some(form_id) = FormSessionId::from_jar(&jar) {
        app_state.forms.discard(&form_id).await;
    }

    let mut headers = HeaderMap::new();
    let redirect = HeaderValue::from_str(&app_state.config.login_url).map_err(|e| {
        AppError::InternalServerError(format!("Niepoprawny LOGIN_URL w nagłówku: {}", e))
    })?;
    headers.insert("HX-Redirect", redirect);

    Ok((jar.add(cookie), headers, StatusCode::OK))
}

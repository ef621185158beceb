// src/staging.rs

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::models::{FieldName, FormFields, StagedFile};
use crate::notifications::Notification;
use crate::preview::{PreviewHandle, PreviewRegistry};
use crate::product_api::{ProductApi, SubmissionRequest};
use crate::session::SessionContext;

pub const DEFAULT_MAX_ATTACHMENTS: usize = 20;

/// Przenosi jeden element z `from` na `to`. `to` jest pozycją w liście PO wyjęciu
/// elementu (semantyka splice), przycinaną do jej długości.
/// Zwraca `false`, gdy `from` jest poza zakresem.
pub fn move_element<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() {
        return false;
    }
    let item = items.remove(from);
    let to = to.min(items.len());
    items.insert(to, item);
    true
}

/// Obraz czekający na wysyłkę.
#[derive(Debug)]
pub struct Attachment {
    pub id: Uuid,
    pub file: StagedFile,
    pub name: String,
    pub staged_at: DateTime<Utc>,
    preview: PreviewHandle,
}

impl Attachment {
    fn stage(file: StagedFile, previews: &PreviewRegistry) -> Self {
        let preview = previews.acquire(&file);
        Self {
            // v7 = znacznik czasu + część losowa
            id: Uuid::now_v7(),
            name: file.file_name.clone(),
            staged_at: Utc::now(),
            file,
            preview,
        }
    }

    pub fn preview_url(&self) -> String {
        self.preview.url()
    }
}

/// Stan przeciągania, tylko do podświetlania miniatur.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DragState {
    pub dragged_index: Option<usize>,
    pub hover_index: Option<usize>,
}

#[derive(Debug)]
pub struct AttachmentStagingForm {
    fields: FormFields,
    attachments: Vec<Attachment>,
    images: Vec<StagedFile>,
    drag: DragState,
    submitting: bool,
    max_attachments: usize,
    previews: PreviewRegistry,
}

impl AttachmentStagingForm {
    pub fn new(previews: PreviewRegistry, max_attachments: usize) -> Self {
        Self {
            fields: FormFields::default(),
            attachments: Vec::new(),
            images: Vec::new(),
            drag: DragState::default(),
            submitting: false,
            max_attachments,
            previews,
        }
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Pochodne pole `images`: pliki załączników w kolejności wyświetlania.
    pub fn images(&self) -> &[StagedFile] {
        &self.images
    }

    pub fn drag(&self) -> DragState {
        self.drag
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn max_attachments(&self) -> usize {
        self.max_attachments
    }

    pub fn set_field(&mut self, name: &str, value: String) -> Result<FieldName, AppError> {
        self.fields.set_by_name(name, value)
    }

    fn sync_images(&mut self) {
        self.images = self.attachments.iter().map(|a| a.file.clone()).collect();
    }

    /// Dodaje całą paczkę plików albo nic (bez obcinania do limitu).
    pub fn add_attachments(&mut self, files: Vec<StagedFile>) -> Result<usize, AppError> {
        if self.attachments.len() + files.len() > self.max_attachments {
            tracing::warn!(
                "Odrzucono {} plików: limit {} załączników (obecnie {})",
                files.len(),
                self.max_attachments,
                self.attachments.len()
            );
            return Err(AppError::AttachmentLimitExceeded {
                limit: self.max_attachments,
            });
        }

        let added = files.len();
        for file in files {
            let attachment = Attachment::stage(file, &self.previews);
            tracing::debug!(
                "Dodano załącznik {} ('{}', {} bajtów)",
                attachment.id,
                attachment.name,
                attachment.file.size()
            );
            self.attachments.push(attachment);
        }
        self.sync_images();
        Ok(added)
    }

    /// Usuwa załącznik o danym id. Brak id to nie błąd.
    pub fn remove_attachment(&mut self, id: Uuid) -> bool {
        let Some(position) = self.attachments.iter().position(|a| a.id == id) else {
            return false;
        };
        // Podgląd zwalnia się razem z usuniętym załącznikiem
        let removed = self.attachments.remove(position);
        self.sync_images();
        tracing::debug!(
            "Usunięto załącznik {} (podgląd {})",
            removed.id,
            removed.preview.key()
        );
        true
    }

    pub fn drag_start(&mut self, index: usize) {
        self.drag.dragged_index = Some(index);
    }

    pub fn drag_over(&mut self, index: usize) {
        self.drag.hover_index = Some(index);
    }

    pub fn drag_leave(&mut self) {
        self.drag.hover_index = None;
    }

    pub fn drag_end(&mut self) {
        self.drag = DragState::default();
    }

    /// Upuszczenie przeciąganej miniatury na pozycję `target_index`.
    pub fn drop_at(&mut self, target_index: usize) -> bool {
        let Some(from) = self.drag.dragged_index else {
            return false;
        };
        let moved = move_element(&mut self.attachments, from, target_index);
        if moved {
            self.sync_images();
        } else {
            tracing::warn!(
                "Indeks przeciąganego elementu {} poza zakresem ({} załączników)",
                from,
                self.attachments.len()
            );
        }
        self.drag = DragState::default();
        moved
    }

    /// Przeciągnięcie w jednym kroku: `from` podaje klient razem z pozycją upuszczenia.
    pub fn move_attachment(&mut self, from: usize, target_index: usize) -> bool {
        self.drag_start(from);
        self.drop_at(target_index)
    }

    /// Sprawdza warunki wysyłki, ustawia `submitting` i zwraca migawkę danych.
    pub fn begin_submit(&mut self, session: &SessionContext) -> Result<SubmissionRequest, AppError> {
        let token = session.token().ok_or(AppError::MissingCredential)?;
        if self.submitting {
            return Err(AppError::SubmissionInProgress);
        }
        self.fields.validate()?;
        if self.images.is_empty() {
            return Err(AppError::UnprocessableEntity(
                "Please add at least one image.".to_string(),
            ));
        }

        self.submitting = true;
        Ok(SubmissionRequest {
            token: token.to_string(),
            fields: self.fields.text_parts(),
            images: self.images.clone(),
        })
    }

    pub fn finish_submit(&mut self) {
        self.submitting = false;
    }
}

/// Jedna sesja "add product": formularz i zakres anulowania wysyłki.
#[derive(Debug)]
pub struct StagingSession {
    pub id: Uuid,
    pub form: Mutex<AttachmentStagingForm>,
    cancel: CancellationToken,
}

impl StagingSession {
    pub fn new(id: Uuid, previews: PreviewRegistry, max_attachments: usize) -> Self {
        Self {
            id,
            form: Mutex::new(AttachmentStagingForm::new(previews, max_attachments)),
            cancel: CancellationToken::new(),
        }
    }

    /// Anuluje trwającą wysyłkę. Podglądy zwalniają się, gdy sesja zostanie porzucona.
    pub fn discard(&self) {
        self.cancel.cancel();
    }

    pub fn is_discarded(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wysyła produkt. Blokada formularza nie jest trzymana w trakcie żądania.
    pub async fn submit(
        &self,
        session: &SessionContext,
        api: &dyn ProductApi,
    ) -> Result<Notification, AppError> {
        if self.is_discarded() {
            return Err(AppError::SubmissionFailed(format!(
                "Sesja formularza {} została już zamknięta",
                self.id
            )));
        }
        let request = self.form.lock().await.begin_submit(session)?;
        tracing::info!(
            "Sesja {}: wysyłanie produktu ({} obrazów)",
            self.id,
            request.images.len()
        );

        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => Err(AppError::SubmissionFailed(
                "Wysyłka anulowana - sesja formularza została zamknięta".to_string(),
            )),
            result = api.create_product(request) => result,
        };

        self.form.lock().await.finish_submit();

        match outcome {
            Ok(()) => {
                tracing::info!("Sesja {}: produkt dodany", self.id);
                Ok(Notification::product_added())
            }
            Err(err) => {
                tracing::error!("Sesja {}: błąd wysyłki produktu: {}", self.id, err);
                match err {
                    AppError::SubmissionFailed(detail) => Err(AppError::SubmissionFailed(detail)),
                    other => Err(AppError::SubmissionFailed(other.to_string())),
                }
            }
        }
    }
}

// src/preview.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::bytes::Bytes;
use uuid::Uuid;

use crate::models::StagedFile;

pub const PREVIEW_ROUTE_PREFIX: &str = "/htmx/admin/product-form/previews";

#[derive(Debug, Clone)]
pub struct Preview {
    pub content_type: String,
    pub bytes: Bytes,
}

/// Rejestr podglądów obrazów. Wpis żyje dokładnie tak długo, jak jego `PreviewHandle`.
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    inner: Arc<Mutex<HashMap<Uuid, Preview>>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<Uuid, Preview>> {
        // Mapa zostaje spójna nawet po panice w innym wątku
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn acquire(&self, file: &StagedFile) -> PreviewHandle {
        let key = Uuid::new_v4();
        self.entries().insert(
            key,
            Preview {
                content_type: file.content_type.clone(),
                bytes: file.bytes.clone(),
            },
        );
        tracing::debug!("Utworzono podgląd {} dla pliku '{}'", key, file.file_name);
        PreviewHandle {
            key,
            registry: self.clone(),
        }
    }

    pub fn get(&self, key: &Uuid) -> Option<Preview> {
        self.entries().get(key).cloned()
    }

    /// Liczba żywych podglądów.
    pub fn live_count(&self) -> usize {
        self.entries().len()
    }

    fn release(&self, key: &Uuid) {
        let mut entries = self.entries();
        if entries.remove(key).is_some() {
            tracing::debug!("Zwolniono podgląd {} (pozostało {})", key, entries.len());
        }
    }
}

/// Uchwyt podglądu. Drop zwalnia wpis w rejestrze.
#[derive(Debug)]
pub struct PreviewHandle {
    key: Uuid,
    registry: PreviewRegistry,
}

impl PreviewHandle {
    pub fn key(&self) -> Uuid {
        self.key
    }

    pub fn url(&self) -> String {
        format!("{}/{}", PREVIEW_ROUTE_PREFIX, self.key)
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.registry.release(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_drop_releases_preview() {
        let registry = PreviewRegistry::new();
        let file = StagedFile::new("front.jpg", "image/jpeg", vec![1u8, 2, 3]);

        let handle = registry.acquire(&file);
        let key = handle.key();
        assert_eq!(registry.get(&key).unwrap().bytes.as_ref(), &[1, 2, 3]);
        assert!(handle.url().ends_with(&key.to_string()));

        drop(handle);
        assert!(registry.get(&key).is_none());
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn handles_are_independent() {
        let registry = PreviewRegistry::new();
        let file = StagedFile::new("a.png", "image/png", vec![0u8]);
        let first = registry.acquire(&file);
        let second = registry.acquire(&file);
        assert_ne!(first.key(), second.key());

        drop(first);
        assert_eq!(registry.live_count(), 1);
        assert!(registry.get(&second.key()).is_some());
    }
}

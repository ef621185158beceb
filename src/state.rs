// src/state.rs

use std::sync::Arc;

use crate::config::AppConfig;
use crate::product_api::ProductApi;
use crate::session::FormStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub product_api: Arc<dyn ProductApi>,
    pub forms: FormStore,
}

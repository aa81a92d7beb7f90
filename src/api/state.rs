use std::sync::Arc;

use crate::services::ContentService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub content: Arc<ContentService>,
}

impl AppState {
    pub fn new(content: ContentService) -> Self {
        Self {
            content: Arc::new(content),
        }
    }
}

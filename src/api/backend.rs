use async_trait::async_trait;

use crate::shared::error::AppResult;
use crate::shared::types::{ApiResponse, TranslationRecord};

/// Opaque boundary to the translation/storage backend.
///
/// Application-level failures come back as a nonzero `code` in the envelope;
/// the `Err` arm is reserved for faults in the collaborator itself.
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Translate `text` into the language named by `target_display_name`.
    async fn translate(
        &self,
        text: &str,
        target_display_name: &str,
    ) -> AppResult<ApiResponse<String>>;

    /// Fetch every stored record, newest first.
    async fn fetch_history(&self) -> AppResult<ApiResponse<Vec<TranslationRecord>>>;

    /// Delete one record by id. `data` tells whether a record was removed.
    async fn delete_history(&self, id: &str) -> AppResult<ApiResponse<bool>>;

    /// Drop all records, returning how many were removed.
    async fn clear_history(&self) -> AppResult<ApiResponse<u64>>;
}

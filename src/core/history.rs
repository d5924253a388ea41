//! History view-model: search, pagination and deletion over stored records.
//!
//! The visible page is a deterministic function of `(records, query, page)`.
//! Mutations go through the backend and resynchronize with a full reload;
//! the backend stays the single source of truth.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::api::backend::BackendApi;
use crate::shared::emit::{emit_event, EventSink};
use crate::shared::events::AppEvent;
use crate::shared::messages;
use crate::shared::types::{HistorySnapshot, TranslationRecord};

/// Fixed page size of the history list.
pub const PAGE_SIZE: usize = 10;

struct HistoryState {
    records: Vec<TranslationRecord>,
    query: String,
    /// 1-based, always within `[1, max(1, total_pages)]`.
    page: usize,
    filtered: Vec<TranslationRecord>,
    load_failed: Option<String>,
    error: Option<String>,
}

impl Default for HistoryState {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            query: String::new(),
            page: 1,
            filtered: Vec::new(),
            load_failed: None,
            error: None,
        }
    }
}

impl HistoryState {
    fn total_pages(&self) -> usize {
        self.filtered.len().div_ceil(PAGE_SIZE)
    }

    /// Recompute `filtered` from `(records, query)` and pull the page back
    /// to 1 when it no longer exists under the new data.
    fn recompute(&mut self) {
        if self.query.is_empty() {
            self.filtered = self.records.clone();
        } else {
            let needle = self.query.to_lowercase();
            self.filtered = self
                .records
                .iter()
                .filter(|record| {
                    record.source_text.to_lowercase().contains(&needle)
                        || record.translated_text.to_lowercase().contains(&needle)
                })
                .cloned()
                .collect();
        }

        if self.page < 1 || self.page > self.total_pages().max(1) {
            self.page = 1;
        }
    }

    fn visible(&self) -> Vec<TranslationRecord> {
        self.filtered
            .iter()
            .skip((self.page - 1) * PAGE_SIZE)
            .take(PAGE_SIZE)
            .cloned()
            .collect()
    }

    fn snapshot(&self) -> HistorySnapshot {
        let total_pages = self.total_pages();
        let empty_text = if let Some(failed) = &self.load_failed {
            Some(failed.clone())
        } else if self.filtered.is_empty() {
            Some(if self.query.is_empty() {
                messages::MSG_NO_HISTORY.to_string()
            } else {
                messages::MSG_NO_MATCHES.to_string()
            })
        } else {
            None
        };

        HistorySnapshot {
            query: self.query.clone(),
            page: self.page,
            total_pages,
            visible: self.visible(),
            pagination_visible: total_pages > 1 && empty_text.is_none(),
            empty_text,
            error: self.error.clone(),
        }
    }
}

/// View over the full record set, owned exclusively by this component.
pub struct HistoryViewModel {
    backend: Arc<dyn BackendApi>,
    sink: Arc<dyn EventSink>,
    state: Mutex<HistoryState>,
}

impl HistoryViewModel {
    pub fn new(backend: Arc<dyn BackendApi>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            backend,
            sink,
            state: Mutex::new(HistoryState::default()),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, HistoryState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("[History] state mutex poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn emit(&self) {
        let snapshot = self.lock_state().snapshot();
        emit_event(self.sink.as_ref(), AppEvent::HistoryView(snapshot));
    }

    /// Replace the in-memory set with a full refresh from the backend.
    ///
    /// An empty result and a failed load are distinct states; the current
    /// filter stays applied and the page only resets when it became invalid.
    pub async fn load(&self) {
        let result = self.backend.fetch_history().await;
        {
            let mut state = self.lock_state();
            match result {
                Ok(envelope) if envelope.is_success() => {
                    state.records = envelope.data.unwrap_or_default();
                    state.load_failed = None;
                }
                Ok(envelope) => {
                    log::error!(
                        "[History] load rejected: code={} msg={:?}",
                        envelope.code,
                        envelope.msg
                    );
                    state.load_failed = Some(
                        envelope
                            .msg
                            .unwrap_or_else(|| messages::MSG_HISTORY_LOAD_FAILED.to_string()),
                    );
                }
                Err(err) => {
                    log::error!("[History] load failed: {}", err);
                    state.load_failed = Some(messages::MSG_HISTORY_LOAD_ERROR.to_string());
                }
            }
            state.recompute();
        }
        self.emit();
    }

    /// Filter by case-insensitive substring over source or translated text.
    /// An empty query shows all records in their loaded order.
    pub fn search(&self, query: &str) {
        {
            let mut state = self.lock_state();
            state.query = query.trim().to_string();
            state.page = 1;
            state.recompute();
        }
        self.emit();
    }

    /// Navigate to `page`. Out-of-range requests are silently ignored.
    pub fn go_to_page(&self, page: usize) {
        {
            let mut state = self.lock_state();
            if page < 1 || page > state.total_pages() {
                return;
            }
            state.page = page;
        }
        self.emit();
    }

    pub fn next_page(&self) {
        let page = self.lock_state().page;
        self.go_to_page(page + 1);
    }

    pub fn prev_page(&self) {
        let page = self.lock_state().page;
        self.go_to_page(page.saturating_sub(1));
    }

    /// The records on the current page. Pure and idempotent.
    pub fn visible_page(&self) -> Vec<TranslationRecord> {
        self.lock_state().visible()
    }

    /// Current view state, as an owned copy.
    pub fn snapshot(&self) -> HistorySnapshot {
        self.lock_state().snapshot()
    }

    /// Delete one record, then resynchronize from the backend.
    /// On failure the view is left untouched and an error indicator is set.
    pub async fn delete_record(&self, id: &str) {
        match self.backend.delete_history(id).await {
            Ok(envelope) if envelope.is_success() => {
                self.lock_state().error = None;
                self.load().await;
            }
            Ok(envelope) => {
                log::error!(
                    "[History] delete rejected: code={} msg={:?}",
                    envelope.code,
                    envelope.msg
                );
                self.lock_state().error = Some(match envelope.msg {
                    Some(msg) => format!("{}: {}", messages::MSG_DELETE_FAILED, msg),
                    None => messages::MSG_DELETE_FAILED.to_string(),
                });
                self.emit();
            }
            Err(err) => {
                log::error!("[History] delete failed: {}", err);
                self.lock_state().error =
                    Some(format!("{}: {}", messages::MSG_DELETE_ERROR, err));
                self.emit();
            }
        }
    }

    /// Drop the entire history, then resynchronize from the backend.
    pub async fn clear(&self) {
        match self.backend.clear_history().await {
            Ok(envelope) if envelope.is_success() => {
                self.lock_state().error = None;
                self.load().await;
            }
            Ok(envelope) => {
                log::error!(
                    "[History] clear rejected: code={} msg={:?}",
                    envelope.code,
                    envelope.msg
                );
                self.lock_state().error = Some(match envelope.msg {
                    Some(msg) => format!("{}: {}", messages::MSG_CLEAR_FAILED, msg),
                    None => messages::MSG_CLEAR_FAILED.to_string(),
                });
                self.emit();
            }
            Err(err) => {
                log::error!("[History] clear failed: {}", err);
                self.lock_state().error =
                    Some(format!("{}: {}", messages::MSG_CLEAR_FAILED, err));
                self.emit();
            }
        }
    }
}

//! Client-side state layer of the desktop translation widget.
//!
//! Two event-driven components own all the mutable state: the
//! [`TranslationCoordinator`] debounces input and runs guarded translate
//! requests, and the [`HistoryViewModel`] derives the searchable, paginated
//! history view. Both talk to the backend through the opaque [`BackendApi`]
//! trait and notify observers through an [`EventSink`] instead of writing to
//! the UI.

pub mod api;
pub mod core;
pub mod shared;

pub use crate::api::ai::AiBackend;
pub use crate::api::backend::BackendApi;
pub use crate::core::history::{HistoryViewModel, PAGE_SIZE};
pub use crate::core::translator::{detection::detect_language, TranslationCoordinator, DEBOUNCE};
pub use crate::shared::emit::{emit_event, EventSink, NullSink};
pub use crate::shared::error::{AppError, AppResult};
pub use crate::shared::events::AppEvent;
pub use crate::shared::settings::{AppSettings, PlatformType, Theme};
pub use crate::shared::types::{
    ApiResponse, HistorySnapshot, Lang, TranslationRecord, TranslationStatus, TranslatorSnapshot,
};

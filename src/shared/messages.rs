//! User-facing strings surfaced through component state.
//!
//! Kept verbatim from the shipped UI so existing frontends render
//! identical text.

/// Shown in the output slot while a translate request is in flight.
pub const MSG_TRANSLATING: &str = "翻译中...";

/// Fallback when the backend reports a failure without a message, or the
/// call itself fails.
pub const MSG_TRANSLATE_FAILED: &str = "翻译失败，请重试";

/// Empty state when no records exist at all.
pub const MSG_NO_HISTORY: &str = "暂无翻译历史";

/// Empty state when the search query matches nothing.
pub const MSG_NO_MATCHES: &str = "没有找到匹配的记录";

/// The backend rejected the history fetch.
pub const MSG_HISTORY_LOAD_FAILED: &str = "加载历史记录失败";

/// The history fetch itself failed.
pub const MSG_HISTORY_LOAD_ERROR: &str = "加载历史记录出错";

/// The backend rejected a delete.
pub const MSG_DELETE_FAILED: &str = "删除失败";

/// The delete call itself failed.
pub const MSG_DELETE_ERROR: &str = "删除出错";

/// The backend rejected the clear-history request.
pub const MSG_CLEAR_FAILED: &str = "清空翻译历史失败";

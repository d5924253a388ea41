use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Result envelope shared with the backend.
///
/// `code == 0` is success; any other code is a failure described by `msg`.
/// The shape is fixed - existing frontends pattern-match on these fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ApiResponse<T> {
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            data: Some(data),
            msg: None,
        }
    }

    pub fn fail(code: i32, msg: impl Into<String>) -> Self {
        Self {
            code,
            data: None,
            msg: Some(msg.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// Language selector codes used by the widget. `auto` is only valid as a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Auto,
    Zh,
    En,
    Ja,
    Ko,
}

impl Lang {
    pub fn as_str(self) -> &'static str {
        match self {
            Lang::Auto => "auto",
            Lang::Zh => "zh",
            Lang::En => "en",
            Lang::Ja => "ja",
            Lang::Ko => "ko",
        }
    }

    /// Display name the backend expects for a translation target.
    pub fn display_name(self) -> &'static str {
        match self {
            Lang::Auto => "自动检测",
            Lang::Zh => "中文",
            Lang::En => "英语",
            Lang::Ja => "日语",
            Lang::Ko => "韩语",
        }
    }

    pub fn from_display_name(name: &str) -> Option<Self> {
        match name {
            "中文" => Some(Lang::Zh),
            "英语" => Some(Lang::En),
            "日语" => Some(Lang::Ja),
            "韩语" => Some(Lang::Ko),
            _ => None,
        }
    }

    /// Input placeholder for a language slot. `auto` shows the Chinese one.
    pub fn placeholder(self) -> &'static str {
        match self {
            Lang::Auto | Lang::Zh => "输入文本",
            Lang::En => "Enter text",
            Lang::Ja => "テキストを入力",
            Lang::Ko => "텍스트 입력",
        }
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored translation. Immutable once fetched from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TranslationRecord {
    pub id: String,
    pub source_text: String,
    pub translated_text: String,
    pub source_lang: String,
    pub target_lang: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum TranslationStatus {
    Idle,
    Pending,
    Resolved,
    Failed,
}

/// Owned copy of the translator state handed to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TranslatorSnapshot {
    pub source_text: String,
    pub source_lang: Lang,
    pub target_lang: Lang,
    pub status: TranslationStatus,
    /// Whatever the output slot shows: the last result, a failure message
    /// or the in-flight progress text.
    pub output: String,
}

impl TranslatorSnapshot {
    pub fn source_placeholder(&self) -> &'static str {
        match self.source_lang {
            Lang::Auto => Lang::Zh.placeholder(),
            lang => lang.placeholder(),
        }
    }

    pub fn target_placeholder(&self) -> &'static str {
        self.target_lang.placeholder()
    }
}

/// Owned copy of the history view handed to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HistorySnapshot {
    pub query: String,
    pub page: usize,
    pub total_pages: usize,
    pub visible: Vec<TranslationRecord>,
    /// List placeholder text when nothing renders, `None` while records are
    /// visible. Distinguishes "no history yet" from "no matches" from
    /// "load failed".
    pub empty_text: Option<String>,
    /// Failure indicator from the last mutation, cleared on the next success.
    pub error: Option<String>,
    pub pagination_visible: bool,
}

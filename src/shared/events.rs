use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::settings::AppSettings;
use super::types::{HistorySnapshot, TranslatorSnapshot};

/// State-change notifications pushed to subscribers instead of direct UI writes.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "event", content = "payload")] // Tagged enum for easier frontend parsing
#[ts(export, export_to = "bindings/")]
pub enum AppEvent {
    #[serde(rename = "translator://state")]
    TranslatorState(TranslatorSnapshot),

    #[serde(rename = "history://view")]
    HistoryView(HistorySnapshot),

    #[serde(rename = "settings://updated")]
    SettingsUpdated(AppSettings),
}

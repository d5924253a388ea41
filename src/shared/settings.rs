use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tokio::fs;
use ts_rs::TS;

use super::emit::{emit_event, EventSink};
use super::error::{AppError, AppResult};
use super::events::AppEvent;
use super::types::Lang;

const DEFAULT_SYSTEM_PROMPT: &str = "你是一个专业的翻译引擎，将用户提供的文本翻译成{{to}}，只返回译文本身。";
const DEFAULT_PROMPT: &str = "将下面的文本翻译成{{to}}：\n{{text}}";

/// Which backend dialect the translate call speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum PlatformType {
    OLLama,
    DeepSeek,
    ChatGPT,
    MTranServer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Theme {
    Dark,
    Light,
}

/// Application settings persisted as `settings.json` in the user config dir.
///
/// Field names mirror the `config.json` the settings form already reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub api_key: String,
    pub api_url: String,
    pub platform: PlatformType,
    pub model_name: String,
    pub theme: Theme,
    pub default_source_lang: Lang,
    pub default_target_lang: Lang,
    pub system_prompt: String,
    pub prompt: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: "http://localhost:11434/api/chat".to_string(),
            platform: PlatformType::OLLama,
            model_name: "qwen3".to_string(),
            theme: Theme::Dark,
            default_source_lang: Lang::Auto,
            default_target_lang: Lang::En,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

impl AppSettings {
    pub fn settings_path() -> AppResult<PathBuf> {
        ProjectDirs::from("com", "antigravity", "translation-widget")
            .map(|dirs| dirs.config_dir().join("settings.json"))
            .ok_or_else(|| AppError::Config("Failed to determine config directory".to_string()))
    }

    /// Load settings from disk, writing the defaults on first run.
    pub async fn load() -> AppResult<Self> {
        let path = Self::settings_path()?;

        if !path.exists() {
            let settings = Self::default();
            settings.save_to_disk().await?;
            return Ok(settings);
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| AppError::Config(format!("Failed to read settings file: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse settings: {}", e)))
    }

    /// Internal helper to write to disk without notifying subscribers.
    async fn save_to_disk(&self) -> AppResult<()> {
        let path = Self::settings_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Config(format!("Failed to serialize settings: {}", e)))?;

        fs::write(&path, content)
            .await
            .map_err(|e| AppError::Config(format!("Failed to write settings file: {}", e)))
    }

    /// Save settings to disk and notify subscribers.
    pub async fn save(&self, sink: &dyn EventSink) -> AppResult<()> {
        self.save_to_disk().await?;
        emit_event(sink, AppEvent::SettingsUpdated(self.clone()));
        Ok(())
    }

    /// Restore defaults, persist them and notify subscribers.
    pub async fn reset(sink: &dyn EventSink) -> AppResult<Self> {
        let settings = Self::default();
        settings.save(sink).await?;
        Ok(settings)
    }
}

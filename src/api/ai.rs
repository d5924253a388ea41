//! Backend implementation over a chat-completion style endpoint.
//!
//! Speaks the dialect selected in settings (Ollama, DeepSeek/ChatGPT or
//! MTranServer) and records successful translations into the history store
//! served back through `fetch_history`.

use std::sync::{Mutex, MutexGuard, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use uuid::Uuid;

use super::backend::BackendApi;
use crate::core::translator::detection::detect_language;
use crate::shared::error::{AppError, AppResult};
use crate::shared::settings::{AppSettings, PlatformType};
use crate::shared::types::{ApiResponse, Lang, TranslationRecord};

#[derive(Serialize, Debug)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize, Debug)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Serialize, Debug)]
struct MTranRequest {
    from: String,
    to: String,
    text: String,
}

#[derive(Serialize, Debug)]
#[serde(untagged)]
enum RequestPayload {
    Chat(ChatRequest),
    MTran(MTranRequest),
}

/// History persistence behind the backend facade.
trait HistoryStore: Send + Sync {
    fn save(&self, record: TranslationRecord);
    fn load_all(&self) -> Vec<TranslationRecord>;
    fn delete(&self, id: &str) -> bool;
    fn clear(&self) -> u64;
}

/// In-memory store, newest first.
#[derive(Default)]
struct InMemoryStore {
    records: Mutex<Vec<TranslationRecord>>,
}

impl InMemoryStore {
    fn lock(&self) -> MutexGuard<'_, Vec<TranslationRecord>> {
        match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("[AiBackend] history store mutex poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl HistoryStore for InMemoryStore {
    fn save(&self, record: TranslationRecord) {
        self.lock().insert(0, record);
    }

    fn load_all(&self) -> Vec<TranslationRecord> {
        self.lock().clone()
    }

    fn delete(&self, id: &str) -> bool {
        let mut records = self.lock();
        let before = records.len();
        records.retain(|record| record.id != id);
        records.len() < before
    }

    fn clear(&self) -> u64 {
        let mut records = self.lock();
        let count = records.len() as u64;
        records.clear();
        count
    }
}

/// `BackendApi` over the configured translation endpoint.
pub struct AiBackend {
    http: Client,
    settings: RwLock<AppSettings>,
    store: Box<dyn HistoryStore>,
}

impl AiBackend {
    pub fn new(settings: AppSettings) -> AppResult<Self> {
        let http = Client::builder()
            .user_agent("translation-widget/backend")
            .build()
            .map_err(|e| AppError::Network(e.to_string()))?;

        Ok(Self {
            http,
            settings: RwLock::new(settings),
            store: Box::new(InMemoryStore::default()),
        })
    }

    /// Swap in new settings, e.g. after the settings form saves.
    pub fn update_settings(&self, settings: AppSettings) {
        match self.settings.write() {
            Ok(mut guard) => *guard = settings,
            Err(poisoned) => *poisoned.into_inner() = settings,
        }
    }

    fn settings(&self) -> AppSettings {
        match self.settings.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn build_payload(settings: &AppSettings, text: &str, target_display_name: &str) -> RequestPayload {
        match settings.platform {
            PlatformType::MTranServer => RequestPayload::MTran(MTranRequest {
                from: Lang::Auto.as_str().to_string(),
                to: Lang::from_display_name(target_display_name)
                    .map(|lang| lang.as_str().to_string())
                    .unwrap_or_else(|| target_display_name.to_string()),
                text: text.to_string(),
            }),
            _ => {
                let system_prompt = settings.system_prompt.replace("{{to}}", target_display_name);
                let mut prompt = settings
                    .prompt
                    .replace("{{text}}", text)
                    .replace("{{to}}", target_display_name);
                if settings.model_name.contains("qwen3") {
                    prompt.push_str(" /no_think");
                }
                RequestPayload::Chat(ChatRequest {
                    model: settings.model_name.clone(),
                    messages: vec![
                        ChatMessage {
                            role: "system".to_string(),
                            content: system_prompt,
                        },
                        ChatMessage {
                            role: "user".to_string(),
                            content: prompt,
                        },
                    ],
                    stream: Some(false),
                })
            }
        }
    }

    fn parse_response(settings: &AppSettings, body: &serde_json::Value) -> Option<String> {
        match settings.platform {
            PlatformType::OLLama => body
                .get("message")
                .and_then(|message| message.get("content"))
                .and_then(|content| content.as_str())
                .map(|content| {
                    if settings.model_name.contains("qwen3") {
                        strip_think_block(content)
                    } else {
                        content.to_string()
                    }
                }),
            PlatformType::MTranServer => body
                .get("result")
                .and_then(|result| result.as_str())
                .map(str::to_string),
            _ => body
                .get("choices")
                .and_then(|choices| choices.get(0))
                .and_then(|choice| choice.get("message"))
                .and_then(|message| message.get("content"))
                .and_then(|content| content.as_str())
                .map(str::to_string),
        }
    }

    fn record_translation(&self, source_text: &str, translated_text: &str, target_display_name: &str) {
        let source_lang = detect_language(source_text);
        let target_lang = Lang::from_display_name(target_display_name)
            .map(Lang::as_str)
            .unwrap_or("en");

        self.store.save(TranslationRecord {
            id: Uuid::new_v4().to_string(),
            source_text: source_text.to_string(),
            translated_text: translated_text.to_string(),
            source_lang: source_lang.as_str().to_string(),
            target_lang: target_lang.to_string(),
            created_at: Utc::now(),
        });
    }
}

/// qwen3 models prepend an empty reasoning block in non-thinking mode.
fn strip_think_block(content: &str) -> String {
    content.replace("<think>\n\n</think>\n\n", "")
}

#[async_trait]
impl BackendApi for AiBackend {
    async fn translate(
        &self,
        text: &str,
        target_display_name: &str,
    ) -> AppResult<ApiResponse<String>> {
        let settings = self.settings();
        if settings.api_url.trim().is_empty() {
            return Ok(ApiResponse::fail(1, "翻译服务未配置"));
        }

        let payload = Self::build_payload(&settings, text, target_display_name);
        log::debug!(
            "[AiBackend] translate request: platform={:?} model={}",
            settings.platform,
            settings.model_name
        );

        let response = match self
            .http
            .post(&settings.api_url)
            .header("Authorization", format!("Bearer {}", settings.api_key))
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                log::error!("[AiBackend] translate request failed: {}", err);
                return Ok(ApiResponse::fail(1, err.to_string()));
            }
        };

        if !response.status().is_success() {
            log::error!("[AiBackend] translate returned status {}", response.status());
            return Ok(ApiResponse::fail(
                1,
                format!("Request failed with status: {}", response.status()),
            ));
        }

        let body: serde_json::Value = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                return Ok(ApiResponse::fail(1, format!("Failed to parse response: {}", err)))
            }
        };

        match Self::parse_response(&settings, &body) {
            Some(translated) => {
                self.record_translation(text, &translated, target_display_name);
                Ok(ApiResponse::success(translated))
            }
            None => Ok(ApiResponse::fail(1, "Failed to parse response")),
        }
    }

    async fn fetch_history(&self) -> AppResult<ApiResponse<Vec<TranslationRecord>>> {
        Ok(ApiResponse::success(self.store.load_all()))
    }

    async fn delete_history(&self, id: &str) -> AppResult<ApiResponse<bool>> {
        Ok(ApiResponse::success(self.store.delete(id)))
    }

    async fn clear_history(&self) -> AppResult<ApiResponse<u64>> {
        Ok(ApiResponse::success(self.store.clear()))
    }
}

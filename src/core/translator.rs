//! Translation request coordinator.
//!
//! Owns the debounce timer, the in-flight guard and the swap operation.
//! Every state change is pushed through the event sink as an owned
//! snapshot; nothing here touches the UI.

pub mod detection;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::api::backend::BackendApi;
use crate::shared::emit::{emit_event, EventSink};
use crate::shared::events::AppEvent;
use crate::shared::messages;
use crate::shared::types::{Lang, TranslationStatus, TranslatorSnapshot};

use self::detection::detect_language;

/// Input must stay quiet this long before a translate request fires.
pub const DEBOUNCE: Duration = Duration::from_millis(500);

struct TranslatorState {
    source_text: String,
    source_lang: Lang,
    target_lang: Lang,
    status: TranslationStatus,
    output: String,
    /// Guard flag: a request is on the wire. Released on every completion
    /// path, success or not.
    in_flight: bool,
    /// Bumped for every issued request and every reset. A completing request
    /// may only commit its outcome while its epoch is still current, which
    /// is what makes the last-issued request win.
    epoch: u64,
}

impl TranslatorState {
    fn snapshot(&self) -> TranslatorSnapshot {
        TranslatorSnapshot {
            source_text: self.source_text.clone(),
            source_lang: self.source_lang,
            target_lang: self.target_lang,
            status: self.status,
            output: self.output.clone(),
        }
    }
}

/// Coordinates debounced translate requests against the backend.
pub struct TranslationCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    backend: Arc<dyn BackendApi>,
    sink: Arc<dyn EventSink>,
    state: Mutex<TranslatorState>,
    debounce: Mutex<Option<JoinHandle<()>>>,
}

impl TranslationCoordinator {
    pub fn new(backend: Arc<dyn BackendApi>, sink: Arc<dyn EventSink>) -> Self {
        Self::with_languages(backend, sink, Lang::Auto, Lang::En)
    }

    pub fn with_languages(
        backend: Arc<dyn BackendApi>,
        sink: Arc<dyn EventSink>,
        source_lang: Lang,
        target_lang: Lang,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                sink,
                state: Mutex::new(TranslatorState {
                    source_text: String::new(),
                    source_lang,
                    target_lang,
                    status: TranslationStatus::Idle,
                    output: String::new(),
                    in_flight: false,
                    epoch: 0,
                }),
                debounce: Mutex::new(None),
            }),
        }
    }

    /// Current state, as an owned copy.
    pub fn snapshot(&self) -> TranslatorSnapshot {
        self.inner.lock_state().snapshot()
    }

    /// Record new input and re-arm the debounce timer.
    ///
    /// Empty (after trim) input cancels the armed timer, resets to idle and
    /// orphans whatever request is still on the wire. Any edit takes a
    /// settled status back to idle without clearing the visible output.
    pub fn on_text_changed(&self, text: &str) {
        self.inner.cancel_debounce();

        let schedule = {
            let mut state = self.inner.lock_state();
            state.source_text = text.to_string();
            state.status = TranslationStatus::Idle;
            if text.trim().is_empty() {
                state.output.clear();
                state.epoch += 1;
                false
            } else {
                true
            }
        };
        self.inner.emit();

        if schedule {
            Arc::clone(&self.inner).schedule_debounce();
        }
    }

    /// Translate the current input immediately, bypassing the debounce.
    /// Still guarded: a no-op while a request is in flight.
    pub async fn translate_now(&self) {
        self.inner.translate_now().await;
    }

    /// Exchange the language selectors and the text slots verbatim.
    ///
    /// `auto` is not a valid target, so an outgoing `auto` source turns into
    /// a `zh` target. Non-empty swapped input re-translates through the
    /// normal debounce path, the same as typed input.
    pub fn swap(&self) {
        let schedule = {
            let mut state = self.inner.lock_state();
            let old_source = state.source_lang;
            let old_text = std::mem::take(&mut state.source_text);

            state.source_lang = state.target_lang;
            state.target_lang = if old_source == Lang::Auto {
                Lang::Zh
            } else {
                old_source
            };
            state.source_text = std::mem::replace(&mut state.output, old_text);

            !state.source_text.trim().is_empty()
        };
        self.inner.emit();

        if schedule {
            Arc::clone(&self.inner).schedule_debounce();
        }
    }

    /// Change the source selector; re-translates current input like an edit.
    pub fn set_source_lang(&self, lang: Lang) {
        let schedule = {
            let mut state = self.inner.lock_state();
            state.source_lang = lang;
            !state.source_text.trim().is_empty()
        };
        self.inner.emit();

        if schedule {
            Arc::clone(&self.inner).schedule_debounce();
        }
    }

    /// Change the target selector. `auto` is rejected as a target.
    pub fn set_target_lang(&self, lang: Lang) {
        if lang == Lang::Auto {
            log::warn!("[Translator] ignoring auto as translation target");
            return;
        }
        self.inner.lock_state().target_lang = lang;
        self.inner.emit();
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, TranslatorState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("[Translator] state mutex poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn lock_debounce(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        match self.debounce.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("[Translator] debounce mutex poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn emit(&self) {
        let snapshot = self.lock_state().snapshot();
        emit_event(self.sink.as_ref(), AppEvent::TranslatorState(snapshot));
    }

    fn cancel_debounce(&self) {
        if let Some(handle) = self.lock_debounce().take() {
            handle.abort();
        }
    }

    /// Arm the debounce timer. Only the most recently armed timer may fire;
    /// the previous handle is cancelled before the new one is created.
    fn schedule_debounce(self: Arc<Self>) {
        let mut slot = self.lock_debounce();
        if let Some(previous) = slot.take() {
            previous.abort();
        }

        let inner = Arc::clone(&self);
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(DEBOUNCE).await;
            inner.translate_now().await;
        }));
    }

    async fn translate_now(&self) {
        let request = {
            let mut state = self.lock_state();
            let text = state.source_text.trim().to_string();
            if text.is_empty() {
                return;
            }
            if state.in_flight {
                log::debug!("[Translator] request already in flight, dropping trigger");
                return;
            }

            let source = if state.source_lang == Lang::Auto {
                detect_language(&text)
            } else {
                state.source_lang
            };
            let target = state.target_lang;

            if source == target {
                // Nothing to translate, echo the input.
                state.status = TranslationStatus::Resolved;
                state.output = text;
                None
            } else {
                state.in_flight = true;
                state.status = TranslationStatus::Pending;
                state.output = messages::MSG_TRANSLATING.to_string();
                state.epoch += 1;
                Some((text, target, state.epoch))
            }
        };
        self.emit();

        let (text, target, epoch) = match request {
            Some(request) => request,
            None => return,
        };

        let result = self.backend.translate(&text, target.display_name()).await;

        {
            let mut state = self.lock_state();
            // Release the guard first so it happens on every path below.
            state.in_flight = false;

            if state.epoch != epoch {
                log::debug!("[Translator] discarding stale response");
                return;
            }

            match result {
                Ok(envelope) => {
                    if envelope.is_success() && envelope.data.is_some() {
                        state.status = TranslationStatus::Resolved;
                        state.output = envelope.data.unwrap_or_default();
                    } else {
                        log::error!(
                            "[Translator] translation failed: code={} msg={:?}",
                            envelope.code,
                            envelope.msg
                        );
                        state.status = TranslationStatus::Failed;
                        state.output = envelope
                            .msg
                            .unwrap_or_else(|| messages::MSG_TRANSLATE_FAILED.to_string());
                    }
                }
                Err(err) => {
                    log::error!("[Translator] translation error: {}", err);
                    state.status = TranslationStatus::Failed;
                    state.output = messages::MSG_TRANSLATE_FAILED.to_string();
                }
            }
        }
        self.emit();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Notify;

    use super::*;
    use crate::shared::emit::test_support::CollectingSink;
    use crate::shared::emit::NullSink;
    use crate::shared::error::{AppError, AppResult};
    use crate::shared::types::{ApiResponse, TranslationRecord};

    struct MockBackend {
        calls: AtomicUsize,
        seen: Mutex<Vec<(String, String)>>,
        replies: Mutex<VecDeque<AppResult<ApiResponse<String>>>>,
        gate: Mutex<Option<Arc<Notify>>>,
    }

    impl MockBackend {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
                replies: Mutex::new(VecDeque::new()),
                gate: Mutex::new(None),
            })
        }

        fn push_reply(&self, reply: AppResult<ApiResponse<String>>) {
            self.replies.lock().unwrap().push_back(reply);
        }

        /// Hold every translate call until the returned handle is notified.
        fn gated(&self) -> Arc<Notify> {
            let gate = Arc::new(Notify::new());
            *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
            gate
        }

        fn ungate(&self) {
            *self.gate.lock().unwrap() = None;
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl BackendApi for MockBackend {
        async fn translate(&self, text: &str, target: &str) -> AppResult<ApiResponse<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push((text.to_string(), target.to_string()));

            let gate = self.gate.lock().unwrap().clone();
            if let Some(gate) = gate {
                gate.notified().await;
            }

            match self.replies.lock().unwrap().pop_front() {
                Some(reply) => reply,
                None => Ok(ApiResponse::success(format!("{}:{}", target, text))),
            }
        }

        async fn fetch_history(&self) -> AppResult<ApiResponse<Vec<TranslationRecord>>> {
            Ok(ApiResponse::success(Vec::new()))
        }

        async fn delete_history(&self, _id: &str) -> AppResult<ApiResponse<bool>> {
            Ok(ApiResponse::success(true))
        }

        async fn clear_history(&self) -> AppResult<ApiResponse<u64>> {
            Ok(ApiResponse::success(0))
        }
    }

    fn coordinator(backend: Arc<MockBackend>) -> TranslationCoordinator {
        TranslationCoordinator::new(backend, Arc::new(NullSink))
    }

    async fn past_debounce() {
        tokio::time::sleep(DEBOUNCE + Duration::from_millis(50)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_coalesces_rapid_edits_into_one_call() {
        let backend = MockBackend::new();
        let translator = coordinator(Arc::clone(&backend));

        translator.on_text_changed("你");
        translator.on_text_changed("你好");
        translator.on_text_changed("你好吗");
        past_debounce().await;

        assert_eq!(backend.calls(), 1);
        // The request carries the final text, not an earlier value.
        let seen = backend.seen.lock().unwrap();
        assert_eq!(*seen, [("你好吗".to_string(), "英语".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_input_cancels_timer_and_never_calls_backend() {
        let backend = MockBackend::new();
        let translator = coordinator(Arc::clone(&backend));

        translator.on_text_changed("你好");
        translator.on_text_changed("   ");
        past_debounce().await;
        past_debounce().await;

        assert_eq!(backend.calls(), 0);
        let snapshot = translator.snapshot();
        assert_eq!(snapshot.status, TranslationStatus::Idle);
        assert_eq!(snapshot.output, "");
    }

    #[tokio::test(start_paused = true)]
    async fn auto_detects_chinese_and_sends_display_name() {
        let backend = MockBackend::new();
        backend.push_reply(Ok(ApiResponse::success("Hello".to_string())));
        let translator = coordinator(Arc::clone(&backend));

        translator.on_text_changed("你好");
        past_debounce().await;

        let seen = backend.seen.lock().unwrap();
        assert_eq!(*seen, [("你好".to_string(), "英语".to_string())]);
        drop(seen);

        let snapshot = translator.snapshot();
        assert_eq!(snapshot.status, TranslationStatus::Resolved);
        assert_eq!(snapshot.output, "Hello");
    }

    #[tokio::test(start_paused = true)]
    async fn same_language_short_circuits_without_backend_call() {
        let backend = MockBackend::new();
        let translator = TranslationCoordinator::with_languages(
            Arc::clone(&backend) as Arc<dyn BackendApi>,
            Arc::new(NullSink),
            Lang::Auto,
            Lang::Zh,
        );

        translator.on_text_changed("你好");
        translator.translate_now().await;

        assert_eq!(backend.calls(), 0);
        let snapshot = translator.snapshot();
        assert_eq!(snapshot.status, TranslationStatus::Resolved);
        assert_eq!(snapshot.output, "你好");
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_triggers_while_pending_are_dropped() {
        let backend = MockBackend::new();
        let gate = backend.gated();
        let translator = coordinator(Arc::clone(&backend));

        translator.on_text_changed("你好");
        past_debounce().await;
        assert_eq!(backend.calls(), 1);
        assert_eq!(translator.snapshot().status, TranslationStatus::Pending);
        assert_eq!(translator.snapshot().output, messages::MSG_TRANSLATING);

        // Dropped, not queued.
        translator.translate_now().await;
        translator.translate_now().await;
        assert_eq!(backend.calls(), 1);

        backend.ungate();
        gate.notify_one();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(translator.snapshot().status, TranslationStatus::Resolved);

        // Guard released: the next trigger goes through.
        translator.translate_now().await;
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_input_discards_the_in_flight_response() {
        let backend = MockBackend::new();
        let gate = backend.gated();
        let translator = coordinator(Arc::clone(&backend));

        translator.on_text_changed("你好");
        past_debounce().await;
        assert_eq!(translator.snapshot().status, TranslationStatus::Pending);

        translator.on_text_changed("");
        let snapshot = translator.snapshot();
        assert_eq!(snapshot.status, TranslationStatus::Idle);
        assert_eq!(snapshot.output, "");

        backend.ungate();
        gate.notify_one();
        tokio::time::sleep(Duration::from_millis(10)).await;

        // The stale response committed nothing.
        let snapshot = translator.snapshot();
        assert_eq!(snapshot.status, TranslationStatus::Idle);
        assert_eq!(snapshot.output, "");

        // But the guard was still released.
        translator.on_text_changed("谢谢");
        past_debounce().await;
        assert_eq!(backend.calls(), 2);
        assert_eq!(translator.snapshot().status, TranslationStatus::Resolved);
    }

    #[tokio::test(start_paused = true)]
    async fn backend_failure_surfaces_its_message() {
        let backend = MockBackend::new();
        backend.push_reply(Ok(ApiResponse::fail(1, "quota exceeded")));
        let translator = coordinator(Arc::clone(&backend));

        translator.on_text_changed("你好");
        past_debounce().await;

        let snapshot = translator.snapshot();
        assert_eq!(snapshot.status, TranslationStatus::Failed);
        assert_eq!(snapshot.output, "quota exceeded");
    }

    #[tokio::test(start_paused = true)]
    async fn transport_error_uses_the_fallback_message() {
        let backend = MockBackend::new();
        backend.push_reply(Err(AppError::Network("connection refused".to_string())));
        let translator = coordinator(Arc::clone(&backend));

        translator.on_text_changed("你好");
        past_debounce().await;

        let snapshot = translator.snapshot();
        assert_eq!(snapshot.status, TranslationStatus::Failed);
        assert_eq!(snapshot.output, messages::MSG_TRANSLATE_FAILED);
    }

    #[tokio::test(start_paused = true)]
    async fn next_edit_returns_a_settled_status_to_idle() {
        let backend = MockBackend::new();
        backend.push_reply(Ok(ApiResponse::success("Hello".to_string())));
        let translator = coordinator(Arc::clone(&backend));

        translator.on_text_changed("你好");
        past_debounce().await;
        assert_eq!(translator.snapshot().status, TranslationStatus::Resolved);

        translator.on_text_changed("你好吗");
        let snapshot = translator.snapshot();
        assert_eq!(snapshot.status, TranslationStatus::Idle);
        // The old output stays visible while the new request debounces.
        assert_eq!(snapshot.output, "Hello");
    }

    #[tokio::test(start_paused = true)]
    async fn swap_turns_an_auto_source_into_a_zh_target() {
        let backend = MockBackend::new();
        let translator = TranslationCoordinator::with_languages(
            Arc::clone(&backend) as Arc<dyn BackendApi>,
            Arc::new(NullSink),
            Lang::Auto,
            Lang::Ja,
        );

        translator.swap();

        let snapshot = translator.snapshot();
        assert_eq!(snapshot.source_lang, Lang::Ja);
        assert_eq!(snapshot.target_lang, Lang::Zh);
    }

    #[tokio::test(start_paused = true)]
    async fn swap_exchanges_texts_and_retranslates_via_debounce() {
        let backend = MockBackend::new();
        backend.push_reply(Ok(ApiResponse::success("Hello".to_string())));
        let translator = coordinator(Arc::clone(&backend));

        translator.on_text_changed("你好");
        past_debounce().await;
        assert_eq!(backend.calls(), 1);

        translator.swap();
        let snapshot = translator.snapshot();
        assert_eq!(snapshot.source_lang, Lang::En);
        assert_eq!(snapshot.target_lang, Lang::Zh);
        assert_eq!(snapshot.source_text, "Hello");
        assert_eq!(snapshot.output, "你好");
        // Debounce path, not an immediate call.
        assert_eq!(backend.calls(), 1);

        past_debounce().await;
        assert_eq!(backend.calls(), 2);
        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen[1], ("Hello".to_string(), "中文".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn source_lang_change_retranslates_current_input() {
        let backend = MockBackend::new();
        let translator = coordinator(Arc::clone(&backend));

        translator.on_text_changed("hello");
        past_debounce().await;
        // auto-detected en == target en: short-circuited, no call yet.
        assert_eq!(backend.calls(), 0);

        translator.set_source_lang(Lang::Ja);
        past_debounce().await;
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn snapshots_flow_through_the_sink() {
        let backend = MockBackend::new();
        backend.push_reply(Ok(ApiResponse::success("Hello".to_string())));
        let sink = Arc::new(CollectingSink::default());
        let translator =
            TranslationCoordinator::new(Arc::clone(&backend) as Arc<dyn BackendApi>, sink.clone());

        translator.on_text_changed("你好");
        past_debounce().await;

        let statuses: Vec<TranslationStatus> = sink
            .events()
            .iter()
            .filter_map(|event| match event {
                AppEvent::TranslatorState(snapshot) => Some(snapshot.status),
                _ => None,
            })
            .collect();
        assert_eq!(
            statuses,
            [
                TranslationStatus::Idle,
                TranslationStatus::Pending,
                TranslationStatus::Resolved
            ]
        );
    }
}

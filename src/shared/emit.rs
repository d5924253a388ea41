use super::events::AppEvent;

/// Delivery seam between the state layer and whatever hosts it (a desktop
/// shell bridge, a test harness). Implementations must not block.
pub trait EventSink: Send + Sync {
    fn emit(&self, channel: &str, event: &AppEvent);
}

/// Sink that drops every event, for components running unobserved.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _channel: &str, _event: &AppEvent) {}
}

/// Emit an application event to the attached sink.
///
/// The channel name matches the serde tag so frontends can subscribe per
/// component.
pub fn emit_event(sink: &dyn EventSink, event: AppEvent) {
    let channel = match &event {
        AppEvent::TranslatorState(_) => "translator://state",
        AppEvent::HistoryView(_) => "history://view",
        AppEvent::SettingsUpdated(_) => "settings://updated",
    };
    sink.emit(channel, &event);
}

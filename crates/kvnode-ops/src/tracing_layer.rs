//! A [`tracing_subscriber::Layer`] that converts spans and events into
//! [`LogEvent`] values, following `ops::tracing::Layer`'s visitor-based
//! field extraction. Simpler than the teacher's version: no shard
//! metadata (there is no catalog-task concept here) and no timestamp
//! injection hook (wall-clock time is used directly), since this crate
//! has no equivalent to the teacher's fixture-driven snapshot tests.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value as Json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

fn level_from_tracing(level: &tracing::Level) -> LogLevel {
    match *level {
        tracing::Level::TRACE => LogLevel::Trace,
        tracing::Level::DEBUG => LogLevel::Debug,
        tracing::Level::INFO => LogLevel::Info,
        tracing::Level::WARN => LogLevel::Warn,
        tracing::Level::ERROR => LogLevel::Error,
    }
}

/// One emitted span or event, converted to a structured form a test can
/// assert on.
#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    pub level: LogLevel,
    pub target: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Json>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spans: Vec<LogEvent>,
}

impl LogEvent {
    fn from_metadata(metadata: &tracing::Metadata) -> Self {
        LogEvent {
            level: level_from_tracing(metadata.level()),
            target: metadata.target().to_string(),
            message: String::new(),
            fields: BTreeMap::new(),
            spans: Vec::new(),
        }
    }
}

/// Collects [`LogEvent`]s by calling `sink` once per emitted event, with
/// any enclosing spans attached as `spans` (root-first), mirroring
/// `ops::tracing::Layer`'s span-hierarchy handling.
pub struct Layer<H>(H)
where
    H: Fn(LogEvent) + 'static;

impl<H> Layer<H>
where
    H: Fn(LogEvent) + 'static,
{
    pub fn new(sink: H) -> Self {
        Self(sink)
    }
}

impl<S, H> tracing_subscriber::Layer<S> for Layer<H>
where
    S: tracing::Subscriber,
    S: for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
    H: Fn(LogEvent) + 'static,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut event = LogEvent::from_metadata(attrs.metadata());
        event.message = attrs.metadata().name().to_string();
        attrs.record(&mut FieldVisitor(&mut event));

        let span = ctx.span(id).expect("span must exist in on_new_span");
        span.extensions_mut().insert(event);
    }

    fn on_record(
        &self,
        id: &tracing::span::Id,
        values: &tracing::span::Record<'_>,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let span = ctx.span(id).expect("span must exist in on_record");
        let mut extensions = span.extensions_mut();
        if let Some(event) = extensions.get_mut::<LogEvent>() {
            values.record(&mut FieldVisitor(event));
        }
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut log = LogEvent::from_metadata(event.metadata());
        event.record(&mut FieldVisitor(&mut log));

        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                let extensions = span.extensions();
                if let Some(parent) = extensions.get::<LogEvent>() {
                    log.spans.push(parent.clone());
                }
            }
        }

        self.0(log)
    }
}

struct FieldVisitor<'a>(&'a mut LogEvent);

impl<'a> FieldVisitor<'a> {
    fn record_raw<V: Serialize>(&mut self, field: &tracing::field::Field, value: V) {
        if field.name() == "message" && self.0.message.is_empty() {
            if let Json::String(s) = serde_json::to_value(&value).unwrap_or(Json::Null) {
                self.0.message = s;
                return;
            }
        }
        if let Ok(json) = serde_json::to_value(&value) {
            self.0.fields.insert(field.name().to_string(), json);
        }
    }
}

impl<'a> tracing::field::Visit for FieldVisitor<'a> {
    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.record_raw(field, value)
    }
    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.record_raw(field, value)
    }
    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.record_raw(field, value)
    }
    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.record_raw(field, value)
    }
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.record_raw(field, value)
    }
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.record_raw(field, format!("{value:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::prelude::*;

    #[test]
    fn event_carries_message_and_fields() {
        let out = Arc::new(Mutex::new(Vec::new()));
        let out_clone = out.clone();

        let _guard = tracing_subscriber::registry()
            .with(Layer::new(move |event| out_clone.lock().unwrap().push(event)))
            .set_default();

        tracing::info!(attempt = 3, "syncer write rejected");

        let out = out.lock().unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].message, "syncer write rejected");
        assert_eq!(out[0].level, LogLevel::Info);
        assert_eq!(out[0].fields.get("attempt"), Some(&Json::from(3)));
    }

    #[test]
    fn span_hierarchy_is_attached_root_first() {
        let out = Arc::new(Mutex::new(Vec::new()));
        let out_clone = out.clone();

        let _guard = tracing_subscriber::registry()
            .with(Layer::new(move |event| out_clone.lock().unwrap().push(event)))
            .set_default();

        let span = tracing::info_span!("dispatch", command = "set");
        let _enter = span.enter();
        tracing::debug!("proposing write");

        let out = out.lock().unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].spans.len(), 1);
        assert_eq!(out[0].spans[0].message, "dispatch");
        assert_eq!(
            out[0].spans[0].fields.get("command"),
            Some(&Json::from("set"))
        );
    }
}

//! Event dispatch: priority sends, debounced batch flushes
//!
//! `track` is fire-and-forget for the caller. Every event is enriched
//! and enqueued; a small set of critical event types is additionally
//! sent immediately, everything else coalesces behind a debounce timer
//! into one flush per quiet period.
//!
//! Priority events therefore reach the collector twice under normal
//! operation: once immediately and once in the next drain. The event
//! hash lets the collector deduplicate; the client deliberately does
//! not track per-event send state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::config::{Config, TrackingConfig};
use crate::environment::ClientEnvironment;
use crate::error::Result;
use crate::session::SessionManager;

use super::client::CollectorClient;
use super::events::Event;
use super::queue::EventQueue;

/// Event types sent immediately in addition to the batch path
pub const PRIORITY_EVENTS: &[&str] = &[
    "user_registered",
    "user_login",
    "prompt_generated",
    "error_occurred",
];

/// Destination for outgoing events.
///
/// Production uses [`CollectorClient`]; tests substitute a recording
/// sink. Errors are the sink's to report and the dispatcher's to
/// swallow: nothing on this path may reach the host application.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one event. Best-effort; no retry is attempted.
    async fn send_one(&self, event: Event) -> Result<()>;
}

/// The analytics pipeline entry point.
///
/// Constructed once at application startup; one instance means one
/// session per page load. All methods take `&self` and are safe to call
/// from concurrent tasks. Immediate sends and debounce flushes run on
/// spawned tasks, so callers must be inside a tokio runtime.
pub struct Dispatcher {
    sink: Arc<dyn EventSink>,
    queue: Arc<EventQueue>,
    session: SessionManager,
    env: ClientEnvironment,
    enabled: AtomicBool,
    debounce: Duration,
    /// Bumped on every timer restart; a woken timer only flushes if it
    /// is still the newest one. In-flight flushes are never interrupted.
    timer_generation: Arc<AtomicU64>,
}

impl Dispatcher {
    /// Create a dispatcher over an explicit sink.
    pub fn new(sink: Arc<dyn EventSink>, env: ClientEnvironment, tracking: &TrackingConfig) -> Self {
        Self {
            sink,
            queue: Arc::new(EventQueue::new(tracking.max_queue_events)),
            session: SessionManager::new(),
            env,
            enabled: AtomicBool::new(tracking.enabled),
            debounce: Duration::from_millis(tracking.debounce_ms),
            timer_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create a dispatcher wired to the configured HTTP collector.
    pub fn from_config(config: &Config, env: ClientEnvironment) -> Result<Self> {
        let client = CollectorClient::new(config.collector.clone())?;
        Ok(Self::new(Arc::new(client), env, &config.tracking))
    }

    /// The session identifier attached to every event.
    pub fn session_id(&self) -> &str {
        self.session.session_id()
    }

    /// The session manager (segment timing lives here).
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// The ambient client environment supplied at construction.
    pub fn environment(&self) -> &ClientEnvironment {
        &self.env
    }

    /// Number of events currently awaiting transmission.
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Number of events evicted from the full queue.
    pub fn dropped_events(&self) -> u64 {
        self.queue.dropped()
    }

    /// Whether tracking is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Turn tracking on and record the toggle.
    pub fn enable_tracking(&self) {
        self.enabled.store(true, Ordering::SeqCst);
        self.track("analytics_enabled", json!({}));
    }

    /// Turn tracking off.
    ///
    /// The flag flips before the toggle is tracked, so the
    /// `analytics_disabled` record is itself dropped and disabling
    /// leaves no trace in the queue.
    pub fn disable_tracking(&self) {
        self.enabled.store(false, Ordering::SeqCst);
        self.track("analytics_disabled", json!({}));
    }

    /// Record an event. Fire-and-forget: never blocks, never fails.
    ///
    /// Priority event types trigger an immediate send on a spawned task
    /// while staying queued for the next drain. Everything else
    /// (re)starts the debounce timer; only a quiet period with no
    /// further non-priority tracking produces a flush.
    pub fn track(&self, event_type: &str, event_data: Value) {
        if !self.is_enabled() {
            return;
        }

        let event = Event::build(event_type, event_data, self.session.session_id(), &self.env);

        if PRIORITY_EVENTS.contains(&event_type) {
            self.queue.enqueue(event.clone());
            let sink = Arc::clone(&self.sink);
            tokio::spawn(async move {
                send_logged(&*sink, event).await;
            });
        } else {
            self.queue.enqueue(event);
            self.restart_debounce();
        }
    }

    /// Drain the queue and send each event as an independent request.
    ///
    /// One failed send never prevents the remaining attempts.
    pub async fn flush(&self) {
        flush_queue(&self.queue, &*self.sink).await;
    }

    /// Invalidate any pending debounce timer without flushing.
    ///
    /// A flush that has already started draining is unaffected; only
    /// timers still in their quiet period are superseded.
    pub(crate) fn cancel_debounce(&self) {
        self.timer_generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Schedule a flush after the quiet period, superseding any timer
    /// already pending so bursts collapse into a single flush.
    ///
    /// Only the quiet-period wait is cancellable. A superseded timer
    /// wakes, sees a newer generation, and exits without touching the
    /// queue; once the newest timer starts draining, nothing can stop
    /// the drained batch from getting its send attempts.
    fn restart_debounce(&self) {
        let sink = Arc::clone(&self.sink);
        let queue = Arc::clone(&self.queue);
        let generations = Arc::clone(&self.timer_generation);
        let delay = self.debounce;

        let generation = self.timer_generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if generations.load(Ordering::SeqCst) != generation {
                return;
            }
            flush_queue(&queue, &*sink).await;
        });
    }

    // ============================================
    // Typed wrappers over track()
    // ============================================

    /// Record a page view with the current segment duration, then start
    /// a new segment.
    pub fn track_page_view(&self, page: &str, extra: Value) {
        let mut data = Map::new();
        data.insert("page".to_string(), Value::String(page.to_string()));
        data.insert("duration".to_string(), json!(self.session.segment_duration()));
        self.track("page_view", merged(data, extra));
        self.session.reset_segment();
    }

    /// Record a completed prompt generation (priority event).
    pub fn track_prompt_generated(&self, outcome: &PromptOutcome) {
        self.track(
            "prompt_generated",
            serde_json::to_value(outcome).unwrap_or_default(),
        );
    }

    /// Record usage of a named feature.
    pub fn track_feature_used(&self, feature: &str, data: Value) {
        let mut fields = Map::new();
        fields.insert("feature".to_string(), Value::String(feature.to_string()));
        self.track("feature_used", merged(fields, data));
    }

    /// Record a button click with its location in the client.
    pub fn track_button_click(&self, button_name: &str, location: &str, extra: Value) {
        let mut fields = Map::new();
        fields.insert(
            "button_name".to_string(),
            Value::String(button_name.to_string()),
        );
        fields.insert("location".to_string(), Value::String(location.to_string()));
        self.track("button_click", merged(fields, extra));
    }

    /// Record a form submission and any validation errors.
    pub fn track_form_submission(&self, form_name: &str, success: bool, errors: &[String]) {
        self.track(
            "form_submission",
            json!({
                "form_name": form_name,
                "success": success,
                "errors": errors,
            }),
        );
    }

    /// Record an error observed in the host application (priority event).
    pub fn track_error(&self, message: &str, stack: Option<&str>, context: Value) {
        self.track(
            "error_occurred",
            json!({
                "error_message": message,
                "error_stack": stack,
                "context": context,
            }),
        );
    }

    /// Record a generic user action on a target.
    pub fn track_user_action(&self, action: &str, target: &str, data: Value) {
        let mut fields = Map::new();
        fields.insert("action".to_string(), Value::String(action.to_string()));
        fields.insert("target".to_string(), Value::String(target.to_string()));
        self.track("user_action", merged(fields, data));
    }

    /// Record a client-side performance measurement.
    pub fn track_performance(&self, metric: &str, value: f64, context: Value) {
        self.track(
            "performance_metric",
            json!({
                "metric": metric,
                "value": value,
                "context": context,
            }),
        );
    }

    /// Record an engagement span (scroll depth, reading time, ...).
    pub fn track_engagement(&self, engagement_type: &str, duration_ms: u64, data: Value) {
        let mut fields = Map::new();
        fields.insert(
            "engagement_type".to_string(),
            Value::String(engagement_type.to_string()),
        );
        fields.insert("duration".to_string(), json!(duration_ms));
        self.track("user_engagement", merged(fields, data));
    }

    /// Record a conversion, optionally with a monetary value.
    pub fn track_conversion(&self, conversion_type: &str, value: Option<f64>, data: Value) {
        let mut fields = Map::new();
        fields.insert(
            "conversion_type".to_string(),
            Value::String(conversion_type.to_string()),
        );
        fields.insert("value".to_string(), json!(value));
        self.track("conversion", merged(fields, data));
    }
}

/// Outcome of one prompt-generation round trip, relayed to the
/// pipeline as opaque metadata.
///
/// Serialized field names match what the collector ingests:
/// `response_time` and `algorithm_used`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PromptOutcome {
    pub input_length: usize,
    pub output_length: usize,
    #[serde(rename = "response_time")]
    pub response_time_ms: u64,
    pub success: bool,
    #[serde(rename = "algorithm_used")]
    pub algorithm: String,
    pub detected_role: String,
    pub persona: String,
}

/// Merge caller-supplied extra fields over the named fields.
fn merged(base: Map<String, Value>, extra: Value) -> Value {
    let mut fields = base;
    if let Value::Object(extra) = extra {
        fields.extend(extra);
    }
    Value::Object(fields)
}

/// Drain the queue and attempt every event independently.
async fn flush_queue(queue: &EventQueue, sink: &dyn EventSink) {
    let events = queue.drain_all();
    if events.is_empty() {
        return;
    }

    tracing::debug!(count = events.len(), "Flushing event queue");
    for event in events {
        send_logged(sink, event).await;
    }
}

/// Send one event, logging and swallowing any failure.
async fn send_logged(sink: &dyn EventSink, event: Event) {
    let event_type = event.event_type.clone();
    if let Err(e) = sink.send_one(event).await {
        tracing::warn!(
            event_type = %event_type,
            error = %e,
            "Failed to send analytics event"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Sink that records every delivered event.
    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<Event>>,
    }

    impl RecordingSink {
        fn sent_types(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|e| e.event_type.clone())
                .collect()
        }
    }

    #[async_trait]
    impl EventSink for RecordingSink {
        async fn send_one(&self, event: Event) -> Result<()> {
            self.sent.lock().unwrap().push(event);
            Ok(())
        }
    }

    fn test_env() -> ClientEnvironment {
        ClientEnvironment {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) Chrome/120.0 Safari/537.36".to_string(),
            page_url: "https://app.example.com/home".to_string(),
            referrer: String::new(),
            screen_resolution: "1920x1080".to_string(),
            locale: "en-US".to_string(),
            timezone: "UTC".to_string(),
        }
    }

    fn test_dispatcher(sink: Arc<RecordingSink>) -> Dispatcher {
        let tracking = TrackingConfig {
            enabled: true,
            debounce_ms: 50,
            max_queue_events: 100,
        };
        Dispatcher::new(sink, test_env(), &tracking)
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_priority_event_is_queued_not_sent() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = test_dispatcher(Arc::clone(&sink));

        dispatcher.track("page_view", json!({"page": "home"}));
        tokio::task::yield_now().await;

        assert_eq!(dispatcher.pending_events(), 1);
        assert!(sink.sent_types().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_priority_event_sent_immediately_and_queued() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = test_dispatcher(Arc::clone(&sink));

        dispatcher.track("user_login", json!({}));
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(sink.sent_types(), vec!["user_login"]);
        // Still queued: the double-send characteristic is intentional.
        assert_eq!(dispatcher.pending_events(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_coalesces_bursts() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = test_dispatcher(Arc::clone(&sink));

        for i in 0..5 {
            dispatcher.track("page_view", json!({"n": i}));
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        // Quiet period still running: nothing sent yet.
        assert!(sink.sent_types().is_empty());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(sink.sent_types().len(), 5);
        assert_eq!(dispatcher.pending_events(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disable_drops_everything_including_the_toggle() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = test_dispatcher(Arc::clone(&sink));

        dispatcher.disable_tracking();
        dispatcher.track("page_view", json!({}));
        dispatcher.track("user_login", json!({}));
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(dispatcher.pending_events(), 0);
        assert!(sink.sent_types().is_empty());

        dispatcher.enable_tracking();
        assert_eq!(dispatcher.pending_events(), 1); // analytics_enabled
        dispatcher.track("user_login", json!({}));
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(sink.sent_types(), vec!["user_login"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_sends_in_order_and_empties_queue() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = test_dispatcher(Arc::clone(&sink));

        dispatcher.track("page_view", json!({"n": 1}));
        dispatcher.track("feature_used", json!({}));
        dispatcher.track("page_view", json!({"n": 2}));
        dispatcher.flush().await;

        assert_eq!(
            sink.sent_types(),
            vec!["page_view", "feature_used", "page_view"]
        );
        assert_eq!(dispatcher.pending_events(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_sink_never_stops_the_batch() {
        struct FlakySink {
            sent: Mutex<Vec<String>>,
        }

        #[async_trait]
        impl EventSink for FlakySink {
            async fn send_one(&self, event: Event) -> Result<()> {
                self.sent.lock().unwrap().push(event.event_type.clone());
                Err(crate::error::Error::Collector("boom".to_string()))
            }
        }

        let sink = Arc::new(FlakySink {
            sent: Mutex::new(Vec::new()),
        });
        let tracking = TrackingConfig {
            enabled: true,
            debounce_ms: 50,
            max_queue_events: 100,
        };
        let dispatcher = Dispatcher::new(Arc::clone(&sink) as Arc<dyn EventSink>, test_env(), &tracking);

        dispatcher.track("page_view", json!({}));
        dispatcher.track("feature_used", json!({}));
        dispatcher.flush().await;

        // Every event got its attempt despite each one failing.
        assert_eq!(sink.sent.lock().unwrap().len(), 2);
        assert_eq!(dispatcher.pending_events(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_view_wrapper_shapes_payload_and_resets_segment() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = test_dispatcher(Arc::clone(&sink));

        dispatcher.track_page_view("pricing", json!({"ab_test": "b"}));
        dispatcher.flush().await;

        let sent = sink.sent.lock().unwrap();
        let data = &sent[0].event_data;
        assert_eq!(data["page"], "pricing");
        assert_eq!(data["ab_test"], "b");
        assert!(data["duration"].is_u64());
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_wrapper_is_priority() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = test_dispatcher(Arc::clone(&sink));

        dispatcher.track_error("kaboom", Some("at main.rs:1"), json!({"where": "startup"}));
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(sink.sent_types(), vec!["error_occurred"]);
        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent[0].event_data["error_message"], "kaboom");
    }

    #[tokio::test(start_paused = true)]
    async fn test_prompt_generated_wrapper_is_priority() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = test_dispatcher(Arc::clone(&sink));

        dispatcher.track_prompt_generated(&PromptOutcome {
            input_length: 120,
            output_length: 900,
            response_time_ms: 450,
            success: true,
            algorithm: "v2".to_string(),
            detected_role: "engineer".to_string(),
            persona: "formal".to_string(),
        });
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(sink.sent_types(), vec!["prompt_generated"]);
        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent[0].event_data["input_length"], 120);
        assert_eq!(sent[0].event_data["success"], true);
        // Collector wire names, not the struct field names.
        assert_eq!(sent[0].event_data["response_time"], 450);
        assert_eq!(sent[0].event_data["algorithm_used"], "v2");
        assert!(sent[0].event_data.get("response_time_ms").is_none());
    }
}

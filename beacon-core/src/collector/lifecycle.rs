//! Lifecycle signal handlers
//!
//! The host binds these to its environment-level lifecycle signals:
//! startup, visibility loss/regain, and page teardown. They emit the
//! corresponding lifecycle events and manage segment timing; teardown
//! additionally performs the final best-effort flush.

use serde_json::json;

use super::dispatcher::Dispatcher;

impl Dispatcher {
    /// Startup: emit `session_started` with the ambient environment
    /// snapshot. Call once, right after construction.
    pub fn start_session(&self) {
        let env = self.environment();
        self.track(
            "session_started",
            json!({
                "user_agent": env.user_agent,
                "screen_resolution": env.screen_resolution,
                "language": env.locale,
                "timezone": env.timezone,
            }),
        );
    }

    /// Visibility lost: emit `page_hidden` with the elapsed segment
    /// duration. The segment keeps running; only regaining visibility
    /// starts a new one.
    pub fn page_hidden(&self) {
        self.track(
            "page_hidden",
            json!({ "duration": self.session().segment_duration() }),
        );
    }

    /// Visibility regained: emit `page_visible` and start a new segment.
    pub fn page_visible(&self) {
        self.track("page_visible", json!({}));
        self.session().reset_segment();
    }

    /// Teardown: emit `session_ended` with the final segment duration
    /// and queue depth, then flush whatever is pending.
    ///
    /// The host may be given no time to complete async work here, so
    /// delivery is best-effort; in-flight requests abandoned at process
    /// exit are acceptable.
    pub async fn shutdown(&self) {
        self.track(
            "session_ended",
            json!({
                "duration": self.session().segment_duration(),
                "events_tracked": self.pending_events(),
            }),
        );
        self.cancel_debounce();
        self.flush().await;
    }
}

//! Session identity and engagement segments
//!
//! One `SessionManager` is constructed per process (one "page load") and
//! lives for the process lifetime. It owns the session identifier and the
//! running segment-start instant used to measure engagement duration
//! between visibility transitions.

use std::sync::Mutex;
use std::time::Instant;

use chrono::Utc;
use uuid::Uuid;

/// Owns the session ID and the current engagement segment.
///
/// The segment start sits behind a mutex so lifecycle handlers can reset
/// it concurrently with dispatch.
#[derive(Debug)]
pub struct SessionManager {
    session_id: String,
    segment_start: Mutex<Instant>,
}

impl SessionManager {
    /// Create a new session. The ID concatenates a random component with
    /// the construction timestamp: unique with overwhelming probability,
    /// good enough for analytics deduplication, not for security.
    pub fn new() -> Self {
        Self {
            session_id: generate_session_id(),
            segment_start: Mutex::new(Instant::now()),
        }
    }

    /// The session identifier, stable for the process lifetime.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Record "now" as the new segment start.
    pub fn reset_segment(&self) {
        *self.segment_start.lock().unwrap() = Instant::now();
    }

    /// Milliseconds elapsed since the current segment started.
    pub fn segment_duration(&self) -> u64 {
        self.segment_start.lock().unwrap().elapsed().as_millis() as u64
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a session ID of the form `session_<random>_<unix-millis>`.
fn generate_session_id() -> String {
    let random: String = Uuid::new_v4().simple().to_string().chars().take(9).collect();
    format!("session_{}_{}", random, Utc::now().timestamp_millis())
}

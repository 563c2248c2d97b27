//! Analytics collector pipeline
//!
//! Captures user-behavior and operational events and delivers them to a
//! remote collector without ever blocking or failing the host.
//!
//! ## Architecture
//!
//! Data flows one direction:
//! - producers call [`Dispatcher::track`] (or a typed wrapper)
//! - events are enriched with session and device metadata
//! - enriched events land on the [`EventQueue`]
//! - the dispatcher drains the queue over the network, either
//!   immediately (priority path) or after a quiet period (batch path)
//!
//! Delivery is best-effort by design: transport failures are logged and
//! swallowed, never retried, never surfaced to the caller. Analytics
//! must not be allowed to affect primary application behavior.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use beacon_core::{ClientEnvironment, Config, Dispatcher};
//!
//! # async fn run() -> beacon_core::Result<()> {
//! let config = Config::load()?;
//! let env = ClientEnvironment {
//!     user_agent: "Mozilla/5.0 ...".to_string(),
//!     page_url: "https://app.example.com/home".to_string(),
//!     referrer: String::new(),
//!     screen_resolution: "1920x1080".to_string(),
//!     locale: "en-US".to_string(),
//!     timezone: "UTC".to_string(),
//! };
//!
//! let pipeline = Arc::new(Dispatcher::from_config(&config, env)?);
//! pipeline.start_session();
//! pipeline.track_page_view("home", serde_json::json!({}));
//! // ... on teardown:
//! pipeline.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod client;
mod dispatcher;
mod events;
mod lifecycle;
mod queue;

pub use client::CollectorClient;
pub use dispatcher::{Dispatcher, EventSink, PromptOutcome, PRIORITY_EVENTS};
pub use events::{DeviceInfo, Event};
pub use queue::EventQueue;

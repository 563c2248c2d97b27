//! # beacon-core
//!
//! Core library for beacon - a client-side analytics event pipeline.
//!
//! This library provides:
//! - An enrichment pipeline turning caller payloads into collector events
//! - Priority dispatch and debounced batch delivery over HTTP
//! - Session identity and engagement-segment timing
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! One [`Dispatcher`] is constructed per process ("one session per page
//! load") and handed to every producer. Producers fire events; the
//! dispatcher enriches, queues, and delivers them best-effort. No error
//! on this path ever reaches the host application.
//!
//! ## Example
//!
//! ```rust,no_run
//! use beacon_core::{ClientEnvironment, Config, Dispatcher};
//!
//! let config = Config::load().expect("failed to load config");
//! let env = ClientEnvironment {
//!     user_agent: "Mozilla/5.0 ...".to_string(),
//!     page_url: "https://app.example.com".to_string(),
//!     referrer: String::new(),
//!     screen_resolution: "1920x1080".to_string(),
//!     locale: "en-US".to_string(),
//!     timezone: "UTC".to_string(),
//! };
//! let pipeline = Dispatcher::from_config(&config, env).expect("failed to build pipeline");
//! ```

// Re-export commonly used items at the crate root
pub use collector::{CollectorClient, Dispatcher, Event, EventSink, PromptOutcome};
pub use config::Config;
pub use environment::{Browser, ClientEnvironment, DeviceClass, Os};
pub use error::{Error, Result};
pub use session::SessionManager;

// Public modules
pub mod collector;
pub mod config;
pub mod environment;
pub mod error;
pub mod logging;
pub mod session;

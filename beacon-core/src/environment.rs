//! Runtime environment inspection
//!
//! Derives browser family, OS family, and device class from a user-agent
//! string. Matching is substring-based and first-match-wins; anything
//! unrecognized degrades to `Unknown` (or `Desktop` for device class) so
//! enrichment can never fail or block tracking.

use serde::{Deserialize, Serialize};

/// Browser family derived from a user-agent string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Browser {
    Chrome,
    Firefox,
    Safari,
    Edge,
    Unknown,
}

impl Browser {
    /// Detect the browser family from a user-agent string.
    ///
    /// Chrome is checked before Safari and Edge: Chrome UAs contain
    /// "Safari" and Edge UAs contain "Chrome", so Edge reports as Chrome.
    /// This matches the upstream collector's expectations.
    pub fn of(user_agent: &str) -> Self {
        if user_agent.contains("Chrome") {
            Browser::Chrome
        } else if user_agent.contains("Firefox") {
            Browser::Firefox
        } else if user_agent.contains("Safari") {
            Browser::Safari
        } else if user_agent.contains("Edge") {
            Browser::Edge
        } else {
            Browser::Unknown
        }
    }
}

/// Operating system family derived from a user-agent string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Os {
    Windows,
    #[serde(rename = "macOS")]
    MacOs,
    Linux,
    Android,
    #[serde(rename = "iOS")]
    Ios,
    Unknown,
}

impl Os {
    /// Detect the OS family from a user-agent string.
    pub fn of(user_agent: &str) -> Self {
        if user_agent.contains("Windows") {
            Os::Windows
        } else if user_agent.contains("Mac") {
            Os::MacOs
        } else if user_agent.contains("Linux") {
            Os::Linux
        } else if user_agent.contains("Android") {
            Os::Android
        } else if user_agent.contains("iOS") {
            Os::Ios
        } else {
            Os::Unknown
        }
    }
}

/// Device class derived from a user-agent string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceClass {
    Mobile,
    Tablet,
    Desktop,
}

const TABLET_MARKERS: &[&str] = &["tablet", "ipad", "playbook", "silk"];

const MOBILE_MARKERS: &[&str] = &[
    "mobile",
    "iphone",
    "ipod",
    "android",
    "blackberry",
    "opera",
    "mini",
    "windows ce",
    "palm",
    "smartphone",
    "iemobile",
];

impl DeviceClass {
    /// Detect the device class from a user-agent string (case-insensitive).
    ///
    /// Tablet markers are checked before mobile markers since tablet UAs
    /// often also carry "Mobile". Defaults to `Desktop`.
    pub fn of(user_agent: &str) -> Self {
        let ua = user_agent.to_lowercase();
        if TABLET_MARKERS.iter().any(|m| ua.contains(m)) {
            DeviceClass::Tablet
        } else if MOBILE_MARKERS.iter().any(|m| ua.contains(m)) {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        }
    }
}

/// Ambient metadata of the client the pipeline is embedded in.
///
/// Supplied once at pipeline construction by the host; the pipeline has
/// no knowledge of UI structure beyond these fields.
#[derive(Debug, Clone)]
pub struct ClientEnvironment {
    /// User-agent string of the embedding client
    pub user_agent: String,
    /// Current page URL
    pub page_url: String,
    /// Referrer URL, empty if none
    pub referrer: String,
    /// Screen resolution, e.g. "1920x1080"
    pub screen_resolution: String,
    /// BCP 47 locale tag, e.g. "en-US"
    pub locale: String,
    /// IANA timezone name, e.g. "Europe/Berlin"
    pub timezone: String,
}

impl ClientEnvironment {
    /// Derive the device info block attached to every event.
    pub fn device_info(&self) -> crate::collector::DeviceInfo {
        crate::collector::DeviceInfo {
            screen_resolution: self.screen_resolution.clone(),
            browser: Browser::of(&self.user_agent),
            os: Os::of(&self.user_agent),
            device_type: DeviceClass::of(&self.user_agent),
        }
    }
}

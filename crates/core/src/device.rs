//! Device classification from client metadata.
//!
//! Each session carries a human-readable `device_label` such as
//! `"Desktop/Chrome"` so a user can tell their signed-in devices apart.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum user-agent length kept on a session (longer strings are truncated).
pub const MAX_USER_AGENT_LENGTH: usize = 512;

/// Client metadata supplied by the auth layer at login.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceMetadata {
    pub user_agent: Option<String>,
    pub source_ip: Option<String>,
}

impl DeviceMetadata {
    pub fn new(user_agent: impl Into<String>, source_ip: impl Into<String>) -> Self {
        Self {
            user_agent: Some(user_agent.into()),
            source_ip: Some(source_ip.into()),
        }
    }

    /// The user agent, trimmed and bounded for storage.
    pub fn stored_user_agent(&self) -> Option<String> {
        self.user_agent
            .as_deref()
            .map(str::trim)
            .filter(|ua| !ua.is_empty())
            .map(|ua| ua.chars().take(MAX_USER_AGENT_LENGTH).collect())
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Desktop,
    Mobile,
    Tablet,
    Bot,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Browser {
    Edge,
    Opera,
    Firefox,
    Chrome,
    Safari,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingSystem {
    Windows,
    MacOs,
    Ios,
    Android,
    ChromeOs,
    Linux,
    Unknown,
}

static BOT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)bot|crawler|spider|slurp|curl/|wget/").expect("valid regex")
});
static TABLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"iPad|Tablet|PlayBook|Silk/").expect("valid regex"));
static MOBILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Mobi|iPhone|iPod|Windows Phone|Android.*Mobile").expect("valid regex")
});

// Order matters: Edge and Opera also advertise Chrome, Chrome also advertises Safari.
static BROWSER_RULES: LazyLock<Vec<(Regex, Browser)>> = LazyLock::new(|| {
    [
        (r"Edg(e|A|iOS)?/", Browser::Edge),
        (r"OPR/|Opera", Browser::Opera),
        (r"Firefox/|FxiOS/", Browser::Firefox),
        (r"Chrome/|CriOS/|Chromium/", Browser::Chrome),
        (r"Safari/", Browser::Safari),
    ]
    .into_iter()
    .map(|(pattern, browser)| (Regex::new(pattern).expect("valid regex"), browser))
    .collect()
});

// iOS user agents contain "like Mac OS X", Android ones contain "Linux".
static OS_RULES: LazyLock<Vec<(Regex, OperatingSystem)>> = LazyLock::new(|| {
    [
        (r"Windows NT|Windows Phone", OperatingSystem::Windows),
        (r"iPhone|iPad|iPod", OperatingSystem::Ios),
        (r"Mac OS X|Macintosh", OperatingSystem::MacOs),
        (r"Android", OperatingSystem::Android),
        (r"CrOS", OperatingSystem::ChromeOs),
        (r"Linux|X11", OperatingSystem::Linux),
    ]
    .into_iter()
    .map(|(pattern, os)| (Regex::new(pattern).expect("valid regex"), os))
    .collect()
});

/// Result of classifying a user-agent string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    pub class: DeviceClass,
    pub browser: Browser,
    pub os: OperatingSystem,
}

impl DeviceInfo {
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.trim();
        if ua.is_empty() {
            return Self {
                class: DeviceClass::Unknown,
                browser: Browser::Unknown,
                os: OperatingSystem::Unknown,
            };
        }

        let os = OS_RULES
            .iter()
            .find(|(re, _)| re.is_match(ua))
            .map_or(OperatingSystem::Unknown, |(_, os)| *os);

        let class = if BOT_RE.is_match(ua) {
            DeviceClass::Bot
        } else if TABLET_RE.is_match(ua) || (os == OperatingSystem::Android && !ua.contains("Mobile"))
        {
            DeviceClass::Tablet
        } else if MOBILE_RE.is_match(ua) {
            DeviceClass::Mobile
        } else if os == OperatingSystem::Unknown {
            DeviceClass::Unknown
        } else {
            DeviceClass::Desktop
        };

        let browser = BROWSER_RULES
            .iter()
            .find(|(re, _)| re.is_match(ua))
            .map_or(Browser::Unknown, |(_, browser)| *browser);

        Self { class, browser, os }
    }

    pub fn from_metadata(metadata: &DeviceMetadata) -> Self {
        Self::from_user_agent(metadata.user_agent.as_deref().unwrap_or_default())
    }

    /// `"<class>/<browser>"`, e.g. `"Mobile/Safari"`.
    pub fn label(&self) -> String {
        format!("{}/{}", self.class, self.browser)
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceClass::Desktop => "Desktop",
            DeviceClass::Mobile => "Mobile",
            DeviceClass::Tablet => "Tablet",
            DeviceClass::Bot => "Bot",
            DeviceClass::Unknown => "Unknown",
        })
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Browser::Edge => "Edge",
            Browser::Opera => "Opera",
            Browser::Firefox => "Firefox",
            Browser::Chrome => "Chrome",
            Browser::Safari => "Safari",
            Browser::Unknown => "Unknown",
        })
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperatingSystem::Windows => "Windows",
            OperatingSystem::MacOs => "macOS",
            OperatingSystem::Ios => "iOS",
            OperatingSystem::Android => "Android",
            OperatingSystem::ChromeOs => "ChromeOS",
            OperatingSystem::Linux => "Linux",
            OperatingSystem::Unknown => "Unknown",
        })
    }
}

//! Process-wide ambient context.
//!
//! Holds the "what's going on right now" snapshot: time, timezone, host,
//! focused application, today's calendar and the user's mood. Timezone and
//! hostname are resolved once at construction; the time is recomputed on
//! every read.

use crate::config::Config;
use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

/// Inferred or reported mood.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Calm,
    Focused,
    Tired,
    Stressed,
    Happy,
    #[default]
    Neutral,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Calm => "calm",
            Mood::Focused => "focused",
            Mood::Tired => "tired",
            Mood::Stressed => "stressed",
            Mood::Happy => "happy",
            Mood::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "calm" => Ok(Mood::Calm),
            "focused" => Ok(Mood::Focused),
            "tired" => Ok(Mood::Tired),
            "stressed" => Ok(Mood::Stressed),
            "happy" => Ok(Mood::Happy),
            "neutral" => Ok(Mood::Neutral),
            other => Err(ContextError::InvalidMood(other.to_string())),
        }
    }
}

/// One calendar entry for today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub title: String,
    pub when: String,
}

impl CalendarEntry {
    pub fn new(title: impl Into<String>, when: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            when: when.into(),
        }
    }
}

/// Copy of the ambient context handed to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextState {
    /// Current instant (RFC3339, UTC), fresh on every read
    #[serde(rename = "timeISO")]
    pub time_iso: String,
    pub timezone: String,
    pub hostname: String,
    pub focused_app: Option<String>,
    /// In the order supplied
    pub calendar_today: Vec<CalendarEntry>,
    pub mood: Mood,
}

/// Invalid input to the context service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    InvalidMood(String),
    InvalidType(String),
}

impl std::fmt::Display for ContextError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextError::InvalidMood(m) => write!(
                f,
                "Unknown mood '{m}' (expected calm, focused, tired, stressed, happy or neutral)"
            ),
            ContextError::InvalidType(t) => write!(
                f,
                "Unknown context type '{t}' (expected browser, communication, insight, learning or device)"
            ),
        }
    }
}

impl std::error::Error for ContextError {}

#[derive(Debug, Default)]
struct MutableState {
    focused_app: Option<String>,
    calendar_today: Vec<CalendarEntry>,
    mood: Mood,
}

/// Owner of the ambient context snapshot.
///
/// Reads and writes go through one lock, so each call observes and
/// produces a coherent state even on a multi-threaded runtime.
#[derive(Debug)]
pub struct ContextManager {
    hostname: String,
    timezone: Tz,
    state: RwLock<MutableState>,
}

impl ContextManager {
    /// Create a manager, resolving hostname and timezone from the host.
    pub fn new(config: &Config) -> Self {
        let timezone = resolve_timezone(config.timezone.as_deref());
        let hostname = resolve_hostname();
        tracing::debug!("Ambient context on {} ({})", hostname, timezone);
        Self::with_identity(hostname, timezone)
    }

    /// Create a manager with a fixed identity.
    pub fn with_identity(hostname: impl Into<String>, timezone: Tz) -> Self {
        Self {
            hostname: hostname.into(),
            timezone,
            state: RwLock::new(MutableState::default()),
        }
    }

    /// Current ambient context with a fresh timestamp.
    pub fn status(&self) -> ContextState {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        self.snapshot(&state)
    }

    /// Replace the mood. `None` leaves it unchanged.
    pub fn set_mood(&self, mood: Option<Mood>) -> ContextState {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(mood) = mood {
            state.mood = mood;
        }
        self.snapshot(&state)
    }

    /// Replace the mood from user input.
    ///
    /// Empty input is a no-op; an unrecognised mood is rejected.
    pub fn set_mood_str(&self, mood: &str) -> Result<ContextState, ContextError> {
        if mood.trim().is_empty() {
            return Ok(self.status());
        }
        let mood: Mood = mood.parse()?;
        Ok(self.set_mood(Some(mood)))
    }

    pub fn set_focused_app(&self, app: Option<String>) -> ContextState {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.focused_app = app.filter(|a| !a.trim().is_empty());
        self.snapshot(&state)
    }

    pub fn set_calendar_today(&self, entries: Vec<CalendarEntry>) -> ContextState {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.calendar_today = entries;
        self.snapshot(&state)
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// The current instant in the resolved timezone.
    pub fn local_time(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.timezone)
    }

    fn snapshot(&self, state: &MutableState) -> ContextState {
        ContextState {
            time_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            timezone: self.timezone.name().to_string(),
            hostname: self.hostname.clone(),
            focused_app: state.focused_app.clone(),
            calendar_today: state.calendar_today.clone(),
            mood: state.mood,
        }
    }
}

/// Thread-safe shared context manager.
pub type SharedContextManager = Arc<ContextManager>;

/// Create a new shared context manager.
pub fn create_shared_manager(config: &Config) -> SharedContextManager {
    Arc::new(ContextManager::new(config))
}

/// Hostname of this machine, `"unknown"` when it cannot be read.
pub fn resolve_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Resolve the local timezone: explicit override, `TZ`, `/etc/timezone`,
/// the `/etc/localtime` link target, then UTC.
pub fn resolve_timezone(override_tz: Option<&str>) -> Tz {
    let candidates = [
        override_tz.map(str::to_string),
        std::env::var("TZ").ok(),
        std::fs::read_to_string("/etc/timezone").ok(),
        std::fs::read_link("/etc/localtime")
            .ok()
            .and_then(|p| zone_from_path(&p.to_string_lossy())),
    ];
    first_valid_zone(candidates.into_iter().flatten()).unwrap_or(Tz::UTC)
}

fn first_valid_zone(candidates: impl IntoIterator<Item = String>) -> Option<Tz> {
    candidates.into_iter().find_map(|c| {
        let name = c.trim().trim_start_matches(':');
        match name.parse::<Tz>() {
            Ok(tz) => Some(tz),
            Err(_) => {
                if !name.is_empty() {
                    tracing::debug!("Ignoring unrecognised timezone '{}'", name);
                }
                None
            }
        }
    })
}

fn zone_from_path(path: &str) -> Option<String> {
    path.split_once("zoneinfo/").map(|(_, zone)| zone.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ContextManager {
        ContextManager::with_identity("test-host", chrono_tz::Europe::Berlin)
    }

    #[test]
    fn test_default_mood_is_neutral() {
        let state = manager().status();
        assert_eq!(state.mood, Mood::Neutral);
        assert_eq!(state.hostname, "test-host");
        assert_eq!(state.timezone, "Europe/Berlin");
        assert!(state.focused_app.is_none());
        assert!(state.calendar_today.is_empty());
    }

    #[test]
    fn test_status_refreshes_time_only() {
        let manager = manager();
        let first = manager.status();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = manager.status();

        assert_ne!(first.time_iso, second.time_iso);
        assert_eq!(first.hostname, second.hostname);
        assert_eq!(first.timezone, second.timezone);
    }

    #[test]
    fn test_set_mood() {
        let manager = manager();
        let state = manager.set_mood(Some(Mood::Happy));
        assert_eq!(state.mood, Mood::Happy);

        let state = manager.set_mood(None);
        assert_eq!(state.mood, Mood::Happy);
        assert_eq!(manager.status().mood, Mood::Happy);
    }

    #[test]
    fn test_set_mood_str_validates() {
        let manager = manager();
        assert_eq!(manager.set_mood_str("Tired").unwrap().mood, Mood::Tired);
        assert_eq!(manager.set_mood_str("  ").unwrap().mood, Mood::Tired);
        assert_eq!(
            manager.set_mood_str("furious").unwrap_err(),
            ContextError::InvalidMood("furious".to_string())
        );
        assert_eq!(manager.status().mood, Mood::Tired);
    }

    #[test]
    fn test_returned_state_is_a_copy() {
        let manager = manager();
        let mut state = manager.status();
        state.mood = Mood::Stressed;
        state.calendar_today.push(CalendarEntry::new("Dentist", "15:00"));
        state.hostname = "elsewhere".to_string();

        let fresh = manager.status();
        assert_eq!(fresh.mood, Mood::Neutral);
        assert!(fresh.calendar_today.is_empty());
        assert_eq!(fresh.hostname, "test-host");
    }

    #[test]
    fn test_calendar_order_is_preserved() {
        let manager = manager();
        let entries = vec![
            CalendarEntry::new("Standup", "09:30"),
            CalendarEntry::new("Lunch", "12:00"),
            CalendarEntry::new("Flight to Oslo", "18:45"),
        ];
        let state = manager.set_calendar_today(entries.clone());
        assert_eq!(state.calendar_today, entries);
    }

    #[test]
    fn test_focused_app_blank_clears() {
        let manager = manager();
        assert_eq!(
            manager
                .set_focused_app(Some("Spotify".to_string()))
                .focused_app
                .as_deref(),
            Some("Spotify")
        );
        assert!(manager
            .set_focused_app(Some("   ".to_string()))
            .focused_app
            .is_none());
    }

    #[test]
    fn test_state_serializes_with_time_iso_key() {
        let json = serde_json::to_value(manager().status()).unwrap();
        assert!(json["timeISO"].as_str().unwrap().ends_with('Z'));
        assert_eq!(json["mood"], "neutral");
        assert!(json["calendarToday"].is_array());
    }

    #[test]
    fn test_timezone_candidates() {
        let zone = first_valid_zone(vec![
            "Not/AZone".to_string(),
            ":America/New_York\n".to_string(),
            "Asia/Tokyo".to_string(),
        ]);
        assert_eq!(zone, Some(chrono_tz::America::New_York));
        assert_eq!(first_valid_zone(Vec::<String>::new()), None);
        assert_eq!(
            zone_from_path("/usr/share/zoneinfo/Europe/Paris").as_deref(),
            Some("Europe/Paris")
        );
        assert_eq!(resolve_timezone(Some("Asia/Tokyo")), chrono_tz::Asia::Tokyo);
    }
}

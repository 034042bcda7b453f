//! Point-in-time environment signals.
//!
//! Each reading is stamped with the time it was fetched (`ts`). None of
//! these are persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether the user's calendar currently shows them as busy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarBusy {
    pub busy: bool,
    /// Which calendar backend produced the reading
    pub source: String,
    pub ts: DateTime<Utc>,
}

impl CalendarBusy {
    /// Reading used when the calendar cannot be consulted.
    pub fn unknown() -> Self {
        Self {
            busy: false,
            source: "unknown".to_string(),
            ts: Utc::now(),
        }
    }
}

/// Power mode of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyMode {
    Normal,
    Charging,
    Saver,
    Unknown,
}

/// Battery and power state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEnergy {
    /// Battery level in percent, `None` without a battery
    pub battery: Option<u8>,
    pub mode: EnergyMode,
    pub ts: DateTime<Utc>,
}

impl DeviceEnergy {
    /// Reading used when power state cannot be read.
    pub fn unknown() -> Self {
        Self {
            battery: None,
            mode: EnergyMode::Unknown,
            ts: Utc::now(),
        }
    }
}

/// Kind of network link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkKind {
    Wifi,
    Ethernet,
    Cellular,
    None,
    Unknown,
}

/// Network connectivity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkState {
    pub kind: NetworkKind,
    pub online: bool,
    pub ts: DateTime<Utc>,
}

impl NetworkState {
    /// Reading used when connectivity cannot be determined.
    pub fn unknown(assume_online: bool) -> Self {
        Self {
            kind: NetworkKind::Unknown,
            online: assume_online,
            ts: Utc::now(),
        }
    }
}

/// All three signals, fetched together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub busy: CalendarBusy,
    pub energy: DeviceEnergy,
    pub net: NetworkState,
}

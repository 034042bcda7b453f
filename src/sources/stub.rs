//! Fixed-reading signal source.
//!
//! Used on platforms without a system-backed implementation, and as a
//! predictable source for callers that only need the signal shape.

use crate::sources::types::{
    CalendarBusy, DeviceEnergy, EnergyMode, NetworkKind, NetworkState,
};
use crate::sources::{SignalSource, SourceError};
use async_trait::async_trait;
use chrono::Utc;

/// A signal source that always reports an idle, plugged-in, online device.
#[derive(Debug, Clone, Default)]
pub struct StubSignals;

impl StubSignals {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SignalSource for StubSignals {
    async fn calendar_busy(&self) -> Result<CalendarBusy, SourceError> {
        Ok(CalendarBusy {
            busy: false,
            source: "stub".to_string(),
            ts: Utc::now(),
        })
    }

    async fn device_energy(&self) -> Result<DeviceEnergy, SourceError> {
        Ok(DeviceEnergy {
            battery: Some(100),
            mode: EnergyMode::Normal,
            ts: Utc::now(),
        })
    }

    async fn network_state(&self) -> Result<NetworkState, SourceError> {
        Ok(NetworkState {
            kind: NetworkKind::Wifi,
            online: true,
            ts: Utc::now(),
        })
    }
}

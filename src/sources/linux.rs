//! Linux implementation of the environment signals.
//!
//! Power and network state come from sysfs. There is no system calendar on
//! Linux, so the calendar is always reported as free.

use crate::sources::types::{
    CalendarBusy, DeviceEnergy, EnergyMode, NetworkKind, NetworkState,
};
use crate::sources::{SignalSource, SourceError};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};

/// Signal source backed by `/sys`.
#[derive(Debug, Clone)]
pub struct SystemSignals {
    sysfs_root: PathBuf,
}

impl Default for SystemSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemSignals {
    pub fn new() -> Self {
        Self::with_root("/sys")
    }

    /// Read from an alternative sysfs root.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            sysfs_root: root.into(),
        }
    }

    async fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| SourceError::Unavailable(format!("{}: {e}", dir.display())))?;
        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SourceError::Unavailable(format!("{}: {e}", dir.display())))?
        {
            paths.push(entry.path());
        }
        paths.sort();
        Ok(paths)
    }
}

async fn read_trimmed(path: &Path) -> Option<String> {
    tokio::fs::read_to_string(path)
        .await
        .ok()
        .map(|s| s.trim().to_string())
}

#[async_trait]
impl SignalSource for SystemSignals {
    async fn calendar_busy(&self) -> Result<CalendarBusy, SourceError> {
        Ok(CalendarBusy {
            busy: false,
            source: "none".to_string(),
            ts: Utc::now(),
        })
    }

    async fn device_energy(&self) -> Result<DeviceEnergy, SourceError> {
        let supplies = self
            .list_dir(&self.sysfs_root.join("class/power_supply"))
            .await?;

        let mut battery = None;
        let mut charging = false;
        for supply in supplies {
            if read_trimmed(&supply.join("type")).await.as_deref() != Some("Battery") {
                continue;
            }
            battery = read_trimmed(&supply.join("capacity"))
                .await
                .and_then(|c| c.parse::<u8>().ok())
                .map(|c| c.min(100));
            charging = read_trimmed(&supply.join("status")).await.as_deref() == Some("Charging");
            break;
        }

        let profile = read_trimmed(&self.sysfs_root.join("firmware/acpi/platform_profile")).await;
        let mode = if charging {
            EnergyMode::Charging
        } else if profile.as_deref() == Some("low-power") {
            EnergyMode::Saver
        } else {
            EnergyMode::Normal
        };

        Ok(DeviceEnergy {
            battery,
            mode,
            ts: Utc::now(),
        })
    }

    async fn network_state(&self) -> Result<NetworkState, SourceError> {
        let interfaces = self.list_dir(&self.sysfs_root.join("class/net")).await?;

        let mut up = Vec::new();
        for iface in interfaces {
            let name = iface
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if name == "lo" {
                continue;
            }
            if read_trimmed(&iface.join("operstate")).await.as_deref() != Some("up") {
                continue;
            }
            let kind = if iface.join("wireless").exists() || iface.join("phy80211").exists() {
                NetworkKind::Wifi
            } else if name.starts_with("wwan") {
                NetworkKind::Cellular
            } else {
                NetworkKind::Ethernet
            };
            up.push(kind);
        }

        let kind = [NetworkKind::Ethernet, NetworkKind::Wifi, NetworkKind::Cellular]
            .into_iter()
            .find(|k| up.contains(k))
            .unwrap_or(NetworkKind::None);

        Ok(NetworkState {
            kind,
            online: kind != NetworkKind::None,
            ts: Utc::now(),
        })
    }
}

//! Environment signal sources.
//!
//! Each source reports the calendar-busy flag, device power state and
//! network connectivity. [`get_context_snapshot`] is the composition seam:
//! it fetches all three concurrently and never fails, substituting a safe
//! default for any signal that errors or does not answer in time.

pub mod stub;
pub mod types;

#[cfg(target_os = "linux")]
pub mod linux;

// Re-export commonly used types
pub use stub::StubSignals;
pub use types::{
    CalendarBusy, ContextSnapshot, DeviceEnergy, EnergyMode, NetworkKind, NetworkState,
};

#[cfg(target_os = "linux")]
pub use linux::SystemSignals;

/// Platform-agnostic signal source type alias
#[cfg(target_os = "linux")]
pub type PlatformSignals = SystemSignals;

/// Platform-agnostic signal source type alias
#[cfg(not(target_os = "linux"))]
pub type PlatformSignals = StubSignals;

use crate::config::SignalConfig;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// A provider of point-in-time environment signals.
#[async_trait]
pub trait SignalSource: Send + Sync {
    async fn calendar_busy(&self) -> Result<CalendarBusy, SourceError>;

    async fn device_energy(&self) -> Result<DeviceEnergy, SourceError>;

    async fn network_state(&self) -> Result<NetworkState, SourceError>;
}

/// Errors that can occur while reading a signal.
#[derive(Debug)]
pub enum SourceError {
    Unavailable(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Unavailable(msg) => write!(f, "Signal unavailable: {msg}"),
        }
    }
}

impl std::error::Error for SourceError {}

/// Fetch all three signals concurrently.
///
/// Completes once every signal has answered or timed out, so its latency
/// is bounded by the slowest source (at most `source_timeout`).
pub async fn get_context_snapshot<S>(source: &S, config: &SignalConfig) -> ContextSnapshot
where
    S: SignalSource + ?Sized,
{
    let limit = config.source_timeout;
    let (busy, energy, net) = tokio::join!(
        bounded("calendar", limit, source.calendar_busy()),
        bounded("energy", limit, source.device_energy()),
        bounded("network", limit, source.network_state()),
    );

    ContextSnapshot {
        busy: busy.unwrap_or_else(CalendarBusy::unknown),
        energy: energy.unwrap_or_else(DeviceEnergy::unknown),
        net: net.unwrap_or_else(|| NetworkState::unknown(config.assume_online_when_unknown)),
    }
}

async fn bounded<T, F>(signal: &str, limit: Duration, fetch: F) -> Option<T>
where
    F: Future<Output = Result<T, SourceError>>,
{
    match tokio::time::timeout(limit, fetch).await {
        Ok(Ok(reading)) => Some(reading),
        Ok(Err(e)) => {
            warn!("{} signal failed, using default: {}", signal, e);
            None
        }
        Err(_) => {
            warn!("{} signal timed out after {:?}, using default", signal, limit);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tokio::time::{sleep, Instant};

    /// Source with a fixed delay per signal; `None` never answers.
    struct SlowSignals {
        calendar: Option<Duration>,
        energy: Option<Duration>,
        network: Option<Duration>,
        fail_network: bool,
    }

    async fn wait(delay: Option<Duration>) {
        match delay {
            Some(d) => sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    }

    #[async_trait]
    impl SignalSource for SlowSignals {
        async fn calendar_busy(&self) -> Result<CalendarBusy, SourceError> {
            wait(self.calendar).await;
            Ok(CalendarBusy {
                busy: true,
                source: "slow".to_string(),
                ts: Utc::now(),
            })
        }

        async fn device_energy(&self) -> Result<DeviceEnergy, SourceError> {
            wait(self.energy).await;
            Ok(DeviceEnergy {
                battery: Some(55),
                mode: EnergyMode::Normal,
                ts: Utc::now(),
            })
        }

        async fn network_state(&self) -> Result<NetworkState, SourceError> {
            wait(self.network).await;
            if self.fail_network {
                return Err(SourceError::Unavailable("no netlink".to_string()));
            }
            Ok(NetworkState {
                kind: NetworkKind::Ethernet,
                online: true,
                ts: Utc::now(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_latency_is_the_slowest_source() {
        let source = SlowSignals {
            calendar: Some(Duration::from_millis(100)),
            energy: Some(Duration::from_millis(300)),
            network: Some(Duration::from_millis(200)),
            fail_network: false,
        };
        let config = SignalConfig::default();

        let started = Instant::now();
        let snapshot = get_context_snapshot(&source, &config).await;
        let elapsed = started.elapsed();

        assert!(elapsed >= Duration::from_millis(300));
        assert!(elapsed < Duration::from_millis(600));
        assert!(snapshot.busy.busy);
        assert_eq!(snapshot.energy.battery, Some(55));
        assert_eq!(snapshot.net.kind, NetworkKind::Ethernet);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_source_falls_back_after_timeout() {
        let source = SlowSignals {
            calendar: None,
            energy: Some(Duration::from_millis(10)),
            network: Some(Duration::from_millis(10)),
            fail_network: false,
        };
        let config = SignalConfig {
            source_timeout: Duration::from_secs(1),
            assume_online_when_unknown: false,
        };

        let started = Instant::now();
        let snapshot = get_context_snapshot(&source, &config).await;

        assert!(started.elapsed() >= Duration::from_secs(1));
        assert_eq!(snapshot.busy.source, "unknown");
        assert_eq!(snapshot.energy.battery, Some(55));
    }

    #[tokio::test]
    async fn test_failed_network_uses_configured_default() {
        let source = SlowSignals {
            calendar: Some(Duration::ZERO),
            energy: Some(Duration::ZERO),
            network: Some(Duration::ZERO),
            fail_network: true,
        };

        let pessimistic = get_context_snapshot(&source, &SignalConfig::default()).await;
        assert_eq!(pessimistic.net.kind, NetworkKind::Unknown);
        assert!(!pessimistic.net.online);

        let config = SignalConfig {
            assume_online_when_unknown: true,
            ..SignalConfig::default()
        };
        let optimistic = get_context_snapshot(&source, &config).await;
        assert!(optimistic.net.online);
    }

    #[tokio::test]
    async fn test_snapshot_through_trait_object() {
        let source: Box<dyn SignalSource> = Box::new(StubSignals::new());
        let snapshot = get_context_snapshot(source.as_ref(), &SignalConfig::default()).await;
        assert_eq!(snapshot.busy.source, "stub");
        assert!(snapshot.net.online);
    }
}

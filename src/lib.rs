//! Hearth Context - ambient context and ranked context feed for a
//! smart-home assistant.
//!
//! This library answers two questions for the assistant and the dashboard:
//! "what is the situation right now" and "which recent events matter most".
//!
//! # Components
//!
//! - **Ambient context**: a single owner of time, timezone, host, focused
//!   app, today's calendar and mood ([`ContextManager`])
//! - **Signal sources**: point-in-time calendar, power and network readings,
//!   fetched together with per-source timeouts ([`get_context_snapshot`])
//! - **Top context**: recency-decayed, keyword-boosted ranking across
//!   browsing history, communications, insights and learning events
//!   ([`TopContextGetter`])
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Hearth Context                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │ RecordStore │──▶│   Scoring   │──▶│   Ranking   │──▶ feed│
//! │  │ (4 queries) │   │(decay+boost)│   │ (sort, top) │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │                                                             │
//! │  ┌─────────────┐                     ┌─────────────┐       │
//! │  │SignalSource │────────────────────▶│  Snapshot   │       │
//! │  │ (3 signals) │                     │ {busy,...}  │       │
//! │  └─────────────┘                     └─────────────┘       │
//! │                                                             │
//! │  ┌─────────────┐                                            │
//! │  │  Ambient    │──▶ status / set_mood                       │
//! │  │  Context    │                                            │
//! │  └─────────────┘                                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use hearth_context::{MemoryStore, TopContextGetter};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let tcg = TopContextGetter::new(store);
//!
//! for item in tcg.get_top_context(20, &[]).await? {
//!     println!("{:.3} {}", item.score, item.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod ambient;
pub mod config;
pub mod core;
pub mod sources;
pub mod store;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use ambient::{
    CalendarEntry, ContextError, ContextManager, ContextState, Mood, SharedContextManager,
};
pub use config::{CandidatePool, Config, RankingConfig, SignalConfig, SourceSelection};
pub use core::{ContextItem, ContextType, RankedContext, RankingError, TopContextGetter};
pub use sources::{get_context_snapshot, ContextSnapshot, PlatformSignals, SignalSource, StubSignals};
pub use store::{MemoryStore, RecordStore, StoreError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

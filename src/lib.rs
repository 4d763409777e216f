//! # signal-relay
//!
//! Notification fan-out service for trading-signal events. Producers POST
//! events (copy-trade opens, closed positions, TP/SL updates, holding and
//! weekly reports, CMS announcements); the relay validates them, resolves
//! destination channels through the social-graph service, renders a
//! locale-aware message per destination and delivers them concurrently
//! with per-channel failure isolation.
//!
//! ## Architecture
//!
//! ```text
//! Producers (HTTP POST)            Content queue (polled)
//!     │                                │
//!     ├── REST Handlers (api/)        ├── IngestLoop (ingest/)
//!     │       │ validate + ack        │
//!     │       ▼                       ▼
//!     │   Dispatcher (dispatch/) ◄────┘
//!     │       │ resolve: social graph (social/)
//!     │       │ render:  format/ + i18n/ + render/
//!     │       ▼
//!     │   Transport (transport/) → chat platform bot API
//!     │
//!     └── Verification (verify/) + PostgreSQL stores (store/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod format;
pub mod i18n;
pub mod ingest;
pub mod locale;
pub mod render;
pub mod social;
pub mod store;
pub mod transport;
pub mod verify;

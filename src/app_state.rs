//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::dispatch::Dispatcher;
use crate::store::groups::GroupStore;
use crate::transport::ChannelCache;
use crate::verify::VerificationService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Fan-out orchestrator for every event kind.
    pub dispatcher: Arc<Dispatcher>,
    /// Verification flow (store + external authority).
    pub verification: Arc<VerificationService>,
    /// Group roster reads.
    pub groups: GroupStore,
    /// Channel metadata cache shared with the transport; group lifecycle
    /// endpoints evict entries here.
    pub cache: Arc<ChannelCache>,
}

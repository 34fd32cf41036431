//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the external collaborators (data store, payment gateway) behind
//! trait objects and the registry of open booking wizards. A wizard lives
//! in the registry from open to close; nothing else in here outlives a
//! request except through the data store.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::PortalConfig;
use crate::payment::PaymentGateway;
use crate::services::wizard::BookingWizard;
use crate::store::DataStore;

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PortalConfig>,
    pub store: Arc<dyn DataStore>,
    pub payments: Arc<dyn PaymentGateway>,
    /// Open booking wizards keyed by wizard ID.
    pub wizards: Arc<RwLock<HashMap<Uuid, BookingWizard>>>,
}

impl AppState {
    #[must_use]
    pub fn new(config: PortalConfig, store: Arc<dyn DataStore>, payments: Arc<dyn PaymentGateway>) -> Self {
        Self { config: Arc::new(config), store, payments, wizards: Arc::new(RwLock::new(HashMap::new())) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_state_has_no_wizards() {
        let (state, _, _) = test_helpers::test_app_state();
        assert!(state.wizards.read().await.is_empty());
    }

    #[tokio::test]
    async fn clones_share_wizard_registry() {
        let (state, _, _) = test_helpers::test_app_state();
        let clone = state.clone();
        assert!(Arc::ptr_eq(&state.wizards, &clone.wizards));
        assert!(Arc::ptr_eq(&state.config, &clone.config));
    }
}

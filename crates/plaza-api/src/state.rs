//! Shared application state.

use std::sync::Arc;

use plaza_core::clock::Clock;
use plaza_core::credential::CredentialProvider;
use plaza_town::application::registry::TownsStore;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Registry of live towns.
    pub towns: Arc<TownsStore>,
    /// Clock used to timestamp admissions and messages.
    pub clock: Arc<dyn Clock>,
    /// Issues media credentials during admission.
    pub credentials: Arc<dyn CredentialProvider>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        towns: Arc<TownsStore>,
        clock: Arc<dyn Clock>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            towns,
            clock,
            credentials,
        }
    }
}

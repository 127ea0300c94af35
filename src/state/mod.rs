//! Shared application state wiring the store, rooms, and collaborators.

pub mod live_match;
pub mod match_store;
pub mod rooms;
pub mod sequencer;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    services::{
        finalize::{FinalizeSink, NoopFinalizeSink},
        identity::{DevIdentityResolver, IdentityResolver},
    },
    state::{match_store::MatchStore, rooms::RoomRegistry},
};

/// Cheaply cloneable handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state owned by the server process.
///
/// The room registry is an explicit instance injected here rather than a
/// process-wide global, so tests can stand up several isolated engines in
/// one process.
pub struct AppState {
    config: AppConfig,
    store: Arc<MatchStore>,
    rooms: RoomRegistry,
    identity: Arc<dyn IdentityResolver>,
}

impl AppState {
    /// Construct the state with the default collaborators: the dev identity
    /// resolver and a finalization sink chosen from the configuration.
    pub fn new(config: AppConfig) -> SharedState {
        let sink = default_finalize_sink(&config);
        Self::with_collaborators(config, Arc::new(DevIdentityResolver), sink)
    }

    /// Construct the state with explicit collaborator implementations.
    pub fn with_collaborators(
        config: AppConfig,
        identity: Arc<dyn IdentityResolver>,
        finalizer: Arc<dyn FinalizeSink>,
    ) -> SharedState {
        let store = Arc::new(MatchStore::new());
        let rooms = RoomRegistry::new(store.clone(), finalizer);
        Arc::new(Self {
            config,
            store,
            rooms,
            identity,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The live match store.
    pub fn store(&self) -> &Arc<MatchStore> {
        &self.store
    }

    /// Registry of active rooms keyed by match id.
    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    /// External identity resolver consulted once per connection.
    pub fn identity(&self) -> &Arc<dyn IdentityResolver> {
        &self.identity
    }
}

#[cfg(feature = "http-finalizer")]
fn default_finalize_sink(config: &AppConfig) -> Arc<dyn FinalizeSink> {
    match &config.finalizer_url {
        Some(url) => Arc::new(crate::services::finalize::http::HttpFinalizeSink::new(
            url.clone(),
        )),
        None => Arc::new(NoopFinalizeSink),
    }
}

#[cfg(not(feature = "http-finalizer"))]
fn default_finalize_sink(_config: &AppConfig) -> Arc<dyn FinalizeSink> {
    Arc::new(NoopFinalizeSink)
}

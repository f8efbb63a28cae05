// Shared application state
// Built once at startup and handed to every connection behind an Arc

use super::types::Config;
use crate::store::ItemStore;

pub struct AppState {
    pub config: Config,
    pub store: ItemStore,
}

impl AppState {
    /// State with an empty store
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            store: ItemStore::new(),
        }
    }
}

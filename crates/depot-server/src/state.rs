use std::sync::Arc;

use depot_store::Driver;

use crate::config::ServerConfig;

/// Shared by every handler. Cloning is cheap.
#[derive(Clone, Debug)]
pub struct AppState {
    driver: Driver,
    config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(driver: Driver, config: ServerConfig) -> Self {
        Self {
            driver,
            config: Arc::new(config),
        }
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

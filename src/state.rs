use std::sync::Arc;

use crate::{config::AppConfig, notify::OrderNotifier, steam::SteamClient, storage::Storage};

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub notifier: Arc<dyn OrderNotifier>,
    pub steam: SteamClient,
    pub config: AppConfig,
}

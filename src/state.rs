use crate::config::Config;
use crate::storage::BatchStore;
use std::sync::Arc;

pub struct AppState {
    pub config: Arc<Config>,
    pub http: reqwest::Client,
    pub batches: BatchStore,
}

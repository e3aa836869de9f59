use std::sync::Arc;

use crate::config::Config;
use crate::db::Database;
use crate::story::client::TextGenerator;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub config: Arc<Config>,
    pub generator: Arc<dyn TextGenerator>,
}

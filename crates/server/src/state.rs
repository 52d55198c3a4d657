use std::sync::Arc;

use cartelera_browse::settings::SettingsStore;
use cartelera_tmdb::TmdbClient;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub tmdb: Arc<TmdbClient>,
    pub settings: SettingsStore,
}

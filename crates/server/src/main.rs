use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let api_key =
        std::env::var("CARTELERA_TMDB_KEY").context("CARTELERA_TMDB_KEY must be set")?;
    let language = std::env::var("CARTELERA_LANGUAGE").unwrap_or_else(|_| "es-ES".to_string());
    let region = std::env::var("CARTELERA_REGION").unwrap_or_else(|_| "ES".to_string());

    let mut tmdb = cartelera_tmdb::TmdbClient::new(api_key)
        .with_language(language.clone())
        .with_region(region.clone());
    if let Ok(base_url) = std::env::var("CARTELERA_TMDB_BASE_URL") {
        tmdb = tmdb.with_base_url(base_url);
    }
    info!(language = %language, region = %region, "metadata client ready");

    // Settings file lives in the data dir
    let data_dir: std::path::PathBuf = std::env::var("CARTELERA_DATA_DIR")
        .unwrap_or_else(|_| "/tmp/cartelera".to_string())
        .into();
    std::fs::create_dir_all(&data_dir).context("failed to create data dir")?;

    let settings =
        cartelera_browse::settings::SettingsStore::load(data_dir.join("settings.json"))
            .context("failed to load settings")?;

    let app_state = cartelera_server::state::AppState {
        tmdb: std::sync::Arc::new(tmdb),
        settings,
    };
    let app = cartelera_server::routes::build_router(app_state);

    let bind_addr = std::env::var("CARTELERA_BIND").unwrap_or_else(|_| "0.0.0.0:8230".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .context("failed to bind")?;
    info!(addr = %bind_addr, "server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

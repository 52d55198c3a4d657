use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use cartelera_core::error::ApiError;
use cartelera_core::types::SearchMode;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use cartelera_browse::detail::{ActorDetail, MovieDetail, load_actor_detail, load_movie_detail};
use cartelera_browse::home::{
    AwardedMovie, BannerFeed, FEATURED_COLLECTIONS, FeaturedCollection, load_awarded,
    load_banner, load_collection,
};
use cartelera_browse::search::{SearchPage, SearchQuery, SearchResults, fetch_page};
use cartelera_browse::settings::Preferences;
use cartelera_tmdb::TmdbError;
use cartelera_tmdb::models::{Collection, GenreList, Page, PersonSummary};

use crate::error::AppError;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_router() -> Router<AppState> {
    Router::new()
        // Search & discovery
        .route("/search/titles", get(search_titles))
        .route("/search/people", get(search_people))
        .route("/discover", get(discover))
        // Movies
        .route("/movies/popular", get(banner_feed))
        .route("/movies/awarded", get(awarded_movies))
        .route("/movies/{id}", get(movie_detail))
        // People
        .route("/people/popular", get(popular_people))
        .route("/people/{id}", get(actor_detail))
        // Home widgets
        .route("/genres", get(genre_list))
        .route("/collections", get(featured_collections))
        .route("/collections/{id}", get(collection_detail))
        // Preferences
        .route("/preferences/theme", get(get_theme).put(put_theme))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

// ---------------------------------------------------------------------------
// Search & discovery
// ---------------------------------------------------------------------------

fn default_page() -> u32 {
    1
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: String,
    #[serde(default = "default_page")]
    page: u32,
}

#[derive(Deserialize)]
struct DiscoverParams {
    genre: Option<u64>,
    #[serde(default = "default_page")]
    page: u32,
}

#[derive(Serialize)]
struct SearchPageResponse {
    mode: SearchMode,
    query: String,
    page: u32,
    total_pages: u32,
    results: SearchResults,
}

/// Run one page fetch for an already validated query. A provider failure is
/// not an error for the caller: it yields an empty, unpaginated page.
async fn run_search(state: &AppState, query: SearchQuery, page: u32) -> SearchPageResponse {
    let page = match fetch_page(state.tmdb.as_ref(), &query, page).await {
        Ok(page) => page,
        Err(e) => {
            warn!(mode = %query.mode(), query = query.term(), error = %e, "search fetch failed");
            SearchPage::empty(query.mode())
        }
    };
    SearchPageResponse {
        mode: query.mode(),
        query: query.term().to_string(),
        page: page.page,
        total_pages: page.total_pages,
        results: page.results,
    }
}

async fn search_titles(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchPageResponse>, AppError> {
    let query = SearchQuery::by_title(&params.query)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(Json(run_search(&state, query, params.page).await))
}

async fn search_people(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchPageResponse>, AppError> {
    let query = SearchQuery::by_person(&params.query)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(Json(run_search(&state, query, params.page).await))
}

async fn discover(
    State(state): State<AppState>,
    Query(params): Query<DiscoverParams>,
) -> Result<Json<SearchPageResponse>, AppError> {
    let genre_id = params
        .genre
        .ok_or_else(|| ApiError::BadRequest("genre id required".into()))?;
    let query = SearchQuery::by_genre(genre_id);
    Ok(Json(run_search(&state, query, params.page).await))
}

// ---------------------------------------------------------------------------
// Movie & actor detail
// ---------------------------------------------------------------------------

fn detail_error(kind: &str, id: u64, e: TmdbError) -> AppError {
    match e {
        TmdbError::NotFound => ApiError::NotFound(format!("{kind} {id} not found")).into(),
        other => ApiError::BadGateway(format!("metadata provider: {other}")).into(),
    }
}

async fn movie_detail(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<MovieDetail>, AppError> {
    load_movie_detail(state.tmdb.as_ref(), id)
        .await
        .map(Json)
        .map_err(|e| detail_error("movie", id, e))
}

async fn actor_detail(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ActorDetail>, AppError> {
    load_actor_detail(state.tmdb.as_ref(), id)
        .await
        .map(Json)
        .map_err(|e| detail_error("person", id, e))
}

// ---------------------------------------------------------------------------
// Home widgets
// ---------------------------------------------------------------------------

async fn banner_feed(State(state): State<AppState>) -> Json<BannerFeed> {
    Json(load_banner(&state.tmdb).await)
}

async fn awarded_movies(State(state): State<AppState>) -> Json<Vec<AwardedMovie>> {
    Json(load_awarded(&state.tmdb).await)
}

async fn genre_list(State(state): State<AppState>) -> Json<GenreList> {
    let genres = match state.tmdb.genres().await {
        Ok(list) => list,
        Err(e) => {
            warn!(error = %e, "genre list fetch failed");
            GenreList { genres: Vec::new() }
        }
    };
    Json(genres)
}

async fn popular_people(State(state): State<AppState>) -> Json<Page<PersonSummary>> {
    let page = match state.tmdb.popular_people(1).await {
        Ok(page) => page,
        Err(e) => {
            warn!(error = %e, "popular people fetch failed");
            Page {
                page: 1,
                results: Vec::new(),
                total_pages: 0,
                total_results: 0,
            }
        }
    };
    Json(page)
}

async fn featured_collections() -> Json<&'static [FeaturedCollection]> {
    Json(FEATURED_COLLECTIONS)
}

async fn collection_detail(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Collection>, AppError> {
    load_collection(&state.tmdb, id)
        .await
        .map(Json)
        .map_err(|e| detail_error("collection", id, e))
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ThemeRequest {
    dark_mode: bool,
}

async fn get_theme(State(state): State<AppState>) -> Json<Preferences> {
    Json(state.settings.preferences())
}

async fn put_theme(
    State(state): State<AppState>,
    Json(body): Json<ThemeRequest>,
) -> Result<Json<Preferences>, AppError> {
    let prefs = state
        .settings
        .set_dark_mode(body.dark_mode)
        .map_err(|e| ApiError::Internal(format!("persist settings: {e}")))?;
    Ok(Json(prefs))
}

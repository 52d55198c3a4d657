use serde::de::DeserializeOwned;
use tracing::debug;

use crate::TmdbError;
use crate::models::{
    Collection, Credits, GenreList, MovieRecord, MovieSummary, Page, PersonRecord, PersonSummary,
    ReleaseDatesResponse, VideoList, WatchProviderResponse,
};

const BASE_URL: &str = "https://api.themoviedb.org/3";

/// The deepest page TMDB will serve; requests beyond it are rejected by the
/// API, so outgoing page numbers are clamped to this ceiling.
pub const MAX_PAGE: u32 = 500;

pub struct TmdbClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    language: String,
    region: String,
}

impl TmdbClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            base_url: BASE_URL.to_string(),
            language: "es-ES".to_string(),
            region: "ES".to_string(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Point the client at a different host. Used by tests to talk to a
    /// local stub instead of the real API.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, TmdbError> {
        let mut all_params = vec![
            ("api_key", self.api_key.as_str()),
            ("language", self.language.as_str()),
        ];
        all_params.extend_from_slice(params);

        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "TMDB request");

        let resp = self
            .client
            .get(&url)
            .query(&all_params)
            .send()
            .await
            .map_err(|e| TmdbError::Network(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(TmdbError::NotFound);
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(TmdbError::Api {
                status: status.as_u16(),
                message,
            });
        }

        resp.json().await.map_err(|e| TmdbError::Decode(e.to_string()))
    }

    pub async fn search_movies(
        &self,
        query: &str,
        page: u32,
    ) -> Result<Page<MovieSummary>, TmdbError> {
        let page = clamp_page(page);
        self.get("/search/movie", &[("query", query), ("page", &page)])
            .await
    }

    pub async fn search_people(
        &self,
        query: &str,
        page: u32,
    ) -> Result<Page<PersonSummary>, TmdbError> {
        let page = clamp_page(page);
        self.get("/search/person", &[("query", query), ("page", &page)])
            .await
    }

    pub async fn discover_movies_by_genre(
        &self,
        genre_id: u64,
        page: u32,
    ) -> Result<Page<MovieSummary>, TmdbError> {
        let page = clamp_page(page);
        let genre = genre_id.to_string();
        self.get("/discover/movie", &[("with_genres", &genre), ("page", &page)])
            .await
    }

    pub async fn popular_movies(&self, page: u32) -> Result<Page<MovieSummary>, TmdbError> {
        let page = clamp_page(page);
        self.get("/movie/popular", &[("page", &page)]).await
    }

    pub async fn popular_people(&self, page: u32) -> Result<Page<PersonSummary>, TmdbError> {
        let page = clamp_page(page);
        self.get("/person/popular", &[("page", &page)]).await
    }

    pub async fn movie(&self, id: u64) -> Result<MovieRecord, TmdbError> {
        self.get(&format!("/movie/{id}"), &[]).await
    }

    pub async fn movie_credits(&self, id: u64) -> Result<Credits, TmdbError> {
        self.get(&format!("/movie/{id}/credits"), &[]).await
    }

    pub async fn movie_recommendations(
        &self,
        id: u64,
    ) -> Result<Page<MovieSummary>, TmdbError> {
        self.get(&format!("/movie/{id}/recommendations"), &[]).await
    }

    pub async fn movie_videos(&self, id: u64) -> Result<VideoList, TmdbError> {
        self.get(&format!("/movie/{id}/videos"), &[]).await
    }

    pub async fn movie_watch_providers(
        &self,
        id: u64,
    ) -> Result<WatchProviderResponse, TmdbError> {
        self.get(&format!("/movie/{id}/watch/providers"), &[]).await
    }

    pub async fn movie_release_dates(&self, id: u64) -> Result<ReleaseDatesResponse, TmdbError> {
        self.get(&format!("/movie/{id}/release_dates"), &[]).await
    }

    /// Person record with filmography and external profile ids embedded
    /// server-side in a single response.
    pub async fn person(&self, id: u64) -> Result<PersonRecord, TmdbError> {
        self.get(
            &format!("/person/{id}"),
            &[("append_to_response", "movie_credits,external_ids")],
        )
        .await
    }

    pub async fn genres(&self) -> Result<GenreList, TmdbError> {
        self.get("/genre/movie/list", &[]).await
    }

    pub async fn collection(&self, id: u64) -> Result<Collection, TmdbError> {
        self.get(&format!("/collection/{id}"), &[]).await
    }
}

fn clamp_page(page: u32) -> String {
    page.clamp(1, MAX_PAGE).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outgoing_page_is_clamped_to_api_ceiling() {
        assert_eq!(clamp_page(0), "1");
        assert_eq!(clamp_page(1), "1");
        assert_eq!(clamp_page(37), "37");
        assert_eq!(clamp_page(500), "500");
        assert_eq!(clamp_page(9_999), "500");
    }
}

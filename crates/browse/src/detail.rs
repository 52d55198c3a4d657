use async_trait::async_trait;
use cartelera_tmdb::models::{
    CastMember, Credits, ExternalIds, Genre, MovieRecord, MovieSummary, Page, PersonRecord,
    ProductionCompany, ProductionCountry, RegionOffers, ReleaseDatesResponse, SpokenLanguage,
    Video, VideoList, WatchProviderResponse,
};
use cartelera_tmdb::{TmdbClient, TmdbError};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

/// Secondary region scanned for a certification when the preferred one has
/// none.
const CERTIFICATION_FALLBACK_REGION: &str = "US";

/// Everything the movie detail screen needs, merged from one primary and
/// five ancillary fetches.
#[derive(Debug, Clone, Serialize)]
pub struct MovieDetail {
    pub id: u64,
    pub title: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub genres: Vec<Genre>,
    pub runtime_minutes: Option<u32>,
    pub certification: String,
    pub tagline: Option<String>,
    pub budget: Option<u64>,
    pub revenue: Option<u64>,
    pub vote_average: f64,
    pub production_companies: Vec<ProductionCompany>,
    pub production_countries: Vec<ProductionCountry>,
    pub spoken_languages: Vec<SpokenLanguage>,
    pub cast: Vec<CastMember>,
    pub director: Option<String>,
    pub recommendations: Vec<MovieSummary>,
    pub trailer: Option<Video>,
    pub watch_providers: Option<RegionOffers>,
}

/// One filmography credit, with the actor's age when the film came out
/// (when both dates are known).
#[derive(Debug, Clone, Serialize)]
pub struct FilmographyEntry {
    pub id: u64,
    pub title: String,
    pub poster_path: Option<String>,
    pub overview: String,
    pub character: Option<String>,
    pub release_date: Option<String>,
    pub age_at_release: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActorDetail {
    pub id: u64,
    pub name: String,
    pub biography: String,
    pub birthday: Option<String>,
    pub deathday: Option<String>,
    pub place_of_birth: Option<String>,
    pub profile_path: Option<String>,
    pub external_ids: ExternalIds,
    pub filmography: Vec<FilmographyEntry>,
}

/// The provider calls the aggregator fans out to.
#[async_trait]
pub trait DetailBackend: Send + Sync {
    async fn movie(&self, id: u64) -> Result<MovieRecord, TmdbError>;
    async fn movie_credits(&self, id: u64) -> Result<Credits, TmdbError>;
    async fn movie_recommendations(&self, id: u64) -> Result<Page<MovieSummary>, TmdbError>;
    async fn movie_videos(&self, id: u64) -> Result<VideoList, TmdbError>;
    async fn movie_watch_providers(&self, id: u64) -> Result<WatchProviderResponse, TmdbError>;
    async fn movie_release_dates(&self, id: u64) -> Result<ReleaseDatesResponse, TmdbError>;
    async fn person(&self, id: u64) -> Result<PersonRecord, TmdbError>;
    fn region(&self) -> &str;
}

#[async_trait]
impl DetailBackend for TmdbClient {
    async fn movie(&self, id: u64) -> Result<MovieRecord, TmdbError> {
        TmdbClient::movie(self, id).await
    }

    async fn movie_credits(&self, id: u64) -> Result<Credits, TmdbError> {
        TmdbClient::movie_credits(self, id).await
    }

    async fn movie_recommendations(&self, id: u64) -> Result<Page<MovieSummary>, TmdbError> {
        TmdbClient::movie_recommendations(self, id).await
    }

    async fn movie_videos(&self, id: u64) -> Result<VideoList, TmdbError> {
        TmdbClient::movie_videos(self, id).await
    }

    async fn movie_watch_providers(&self, id: u64) -> Result<WatchProviderResponse, TmdbError> {
        TmdbClient::movie_watch_providers(self, id).await
    }

    async fn movie_release_dates(&self, id: u64) -> Result<ReleaseDatesResponse, TmdbError> {
        TmdbClient::movie_release_dates(self, id).await
    }

    async fn person(&self, id: u64) -> Result<PersonRecord, TmdbError> {
        TmdbClient::person(self, id).await
    }

    fn region(&self) -> &str {
        TmdbClient::region(self)
    }
}

/// Build the movie detail view model.
///
/// The primary record is required; the five ancillary fetches run
/// concurrently and settle independently, so a dead videos endpoint costs
/// the trailer and nothing else.
pub async fn load_movie_detail<B: DetailBackend + ?Sized>(
    backend: &B,
    id: u64,
) -> Result<MovieDetail, TmdbError> {
    let (record, credits, recommendations, videos, providers, releases) = tokio::join!(
        backend.movie(id),
        backend.movie_credits(id),
        backend.movie_recommendations(id),
        backend.movie_videos(id),
        backend.movie_watch_providers(id),
        backend.movie_release_dates(id),
    );

    let record = record?;
    let credits = section(id, "credits", credits).unwrap_or_default();
    let recommendations = section(id, "recommendations", recommendations)
        .map(|p| p.results)
        .unwrap_or_default();
    let videos = section(id, "videos", videos).unwrap_or_default();
    let providers = section(id, "watch_providers", providers).unwrap_or_default();
    let releases = section(id, "release_dates", releases).unwrap_or_default();

    let region = backend.region();
    let certification = releases
        .certification_for(&[region, CERTIFICATION_FALLBACK_REGION])
        .unwrap_or_else(|| "N/A".to_string());

    Ok(MovieDetail {
        id: record.id,
        title: record.title,
        overview: record.overview,
        poster_path: record.poster_path,
        backdrop_path: record.backdrop_path,
        release_date: record.release_date,
        genres: record.genres,
        runtime_minutes: record.runtime,
        certification,
        tagline: record.tagline,
        budget: record.budget,
        revenue: record.revenue,
        vote_average: record.vote_average,
        production_companies: record.production_companies,
        production_countries: record.production_countries,
        spoken_languages: record.spoken_languages,
        director: credits.director().map(|d| d.name.clone()),
        cast: credits.cast,
        recommendations,
        trailer: videos.trailer().cloned(),
        watch_providers: providers.for_region(region).cloned(),
    })
}

/// Build the actor detail view model from the single embedded-resource
/// person fetch.
pub async fn load_actor_detail<B: DetailBackend + ?Sized>(
    backend: &B,
    id: u64,
) -> Result<ActorDetail, TmdbError> {
    let record = backend.person(id).await?;

    let birthday = record.birthday.clone();
    let filmography = record
        .movie_credits
        .map(|c| c.cast)
        .unwrap_or_default()
        .into_iter()
        .map(|credit| {
            let age_at_release = match (&birthday, &credit.release_date) {
                (Some(b), Some(r)) => age_at_release(b, r),
                _ => None,
            };
            FilmographyEntry {
                id: credit.id,
                title: credit.title,
                poster_path: credit.poster_path,
                overview: credit.overview,
                character: credit.character,
                release_date: credit.release_date,
                age_at_release,
            }
        })
        .collect();

    Ok(ActorDetail {
        id: record.id,
        name: record.name,
        biography: record.biography,
        birthday,
        deathday: record.deathday,
        place_of_birth: record.place_of_birth,
        profile_path: record.profile_path,
        external_ids: record.external_ids.unwrap_or_default(),
        filmography,
    })
}

fn section<T>(id: u64, name: &str, outcome: Result<T, TmdbError>) -> Option<T> {
    match outcome {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(movie_id = id, section = name, error = %e, "detail section failed");
            None
        }
    }
}

/// How old someone born on `birthday` was on `release_date`; `None` when
/// either date does not parse as `YYYY-MM-DD` or the release predates the
/// birth.
pub fn age_at_release(birthday: &str, release_date: &str) -> Option<i32> {
    let birth = NaiveDate::parse_from_str(birthday, "%Y-%m-%d").ok()?;
    let release = NaiveDate::parse_from_str(release_date, "%Y-%m-%d").ok()?;
    release.years_since(birth).map(|y| y as i32)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    /// Stub provider with per-section failure injection.
    struct StubDetailBackend {
        failing: HashSet<&'static str>,
    }

    impl StubDetailBackend {
        fn new() -> Self {
            Self {
                failing: HashSet::new(),
            }
        }

        fn failing(sections: &[&'static str]) -> Self {
            Self {
                failing: sections.iter().copied().collect(),
            }
        }

        fn check(&self, section: &str) -> Result<(), TmdbError> {
            if self.failing.contains(section) {
                Err(TmdbError::Network(format!("{section} down")))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl DetailBackend for StubDetailBackend {
        async fn movie(&self, id: u64) -> Result<MovieRecord, TmdbError> {
            self.check("movie")?;
            Ok(serde_json::from_value(serde_json::json!({
                "id": id,
                "title": "Matrix",
                "overview": "…",
                "poster_path": "/p.jpg",
                "release_date": "1999-06-23",
                "runtime": 136,
                "genres": [{ "id": 28, "name": "Acción" }]
            }))
            .unwrap())
        }

        async fn movie_credits(&self, _id: u64) -> Result<Credits, TmdbError> {
            self.check("credits")?;
            Ok(serde_json::from_value(serde_json::json!({
                "cast": [{ "id": 6384, "name": "Keanu Reeves", "character": "Neo",
                           "profile_path": null, "order": 0 }],
                "crew": [{ "id": 905, "name": "Lilly Wachowski", "job": "Director",
                           "profile_path": null }]
            }))
            .unwrap())
        }

        async fn movie_recommendations(
            &self,
            _id: u64,
        ) -> Result<Page<MovieSummary>, TmdbError> {
            self.check("recommendations")?;
            Ok(Page {
                page: 1,
                results: vec![],
                total_pages: 1,
                total_results: 0,
            })
        }

        async fn movie_videos(&self, _id: u64) -> Result<VideoList, TmdbError> {
            self.check("videos")?;
            Ok(serde_json::from_value(serde_json::json!({
                "results": [{ "key": "vKQi3bBA1y8", "name": "Tráiler",
                              "site": "YouTube", "type": "Trailer" }]
            }))
            .unwrap())
        }

        async fn movie_watch_providers(
            &self,
            _id: u64,
        ) -> Result<WatchProviderResponse, TmdbError> {
            self.check("watch_providers")?;
            Ok(serde_json::from_value(serde_json::json!({
                "results": {
                    "ES": { "flatrate": [{ "provider_id": 8, "provider_name": "Netflix",
                                           "logo_path": null }] }
                }
            }))
            .unwrap())
        }

        async fn movie_release_dates(&self, _id: u64) -> Result<ReleaseDatesResponse, TmdbError> {
            self.check("release_dates")?;
            Ok(serde_json::from_value(serde_json::json!({
                "results": [
                    { "iso_3166_1": "ES", "release_dates": [{ "certification": "18" }] }
                ]
            }))
            .unwrap())
        }

        async fn person(&self, id: u64) -> Result<PersonRecord, TmdbError> {
            self.check("person")?;
            Ok(serde_json::from_value(serde_json::json!({
                "id": id,
                "name": "Keanu Reeves",
                "biography": "…",
                "birthday": "1964-09-02",
                "place_of_birth": "Beirut, Lebanon",
                "profile_path": "/k.jpg",
                "external_ids": { "imdb_id": "nm0000206" },
                "movie_credits": {
                    "cast": [{ "id": 603, "title": "Matrix", "character": "Neo",
                               "poster_path": "/m.jpg", "release_date": "1999-06-23" }]
                }
            }))
            .unwrap())
        }

        fn region(&self) -> &str {
            "ES"
        }
    }

    #[tokio::test]
    async fn aggregates_all_sections_when_everything_succeeds() {
        let detail = load_movie_detail(&StubDetailBackend::new(), 603)
            .await
            .unwrap();

        assert_eq!(detail.title, "Matrix");
        assert_eq!(detail.certification, "18");
        assert_eq!(detail.trailer.as_ref().unwrap().key, "vKQi3bBA1y8");
        assert_eq!(
            detail
                .watch_providers
                .as_ref()
                .unwrap()
                .flatrate
                .as_ref()
                .unwrap()[0]
                .provider_name,
            "Netflix"
        );
        assert_eq!(detail.director.as_deref(), Some("Lilly Wachowski"));
    }

    #[tokio::test]
    async fn one_failing_section_does_not_blank_the_rest() {
        let backend = StubDetailBackend::failing(&["videos"]);
        let detail = load_movie_detail(&backend, 603).await.unwrap();

        assert!(detail.trailer.is_none());
        assert_eq!(detail.title, "Matrix");
        assert!(!detail.genres.is_empty());
        assert_eq!(detail.cast[0].name, "Keanu Reeves");
    }

    #[tokio::test]
    async fn missing_certification_falls_back_to_na() {
        let backend = StubDetailBackend::failing(&["release_dates"]);
        let detail = load_movie_detail(&backend, 603).await.unwrap();
        assert_eq!(detail.certification, "N/A");
    }

    #[tokio::test]
    async fn failed_primary_record_fails_the_aggregation() {
        let backend = StubDetailBackend::failing(&["movie"]);
        assert!(load_movie_detail(&backend, 603).await.is_err());
    }

    #[tokio::test]
    async fn actor_detail_carries_age_at_release() {
        let detail = load_actor_detail(&StubDetailBackend::new(), 6384)
            .await
            .unwrap();

        assert_eq!(detail.name, "Keanu Reeves");
        assert_eq!(detail.external_ids.imdb_id.as_deref(), Some("nm0000206"));
        assert_eq!(detail.filmography[0].age_at_release, Some(34));
    }

    #[test]
    fn age_at_release_handles_bad_input() {
        assert_eq!(age_at_release("1964-09-02", "1999-06-23"), Some(34));
        assert_eq!(age_at_release("1964-09-02", "1950-01-01"), None);
        assert_eq!(age_at_release("desconocida", "1999-06-23"), None);
    }
}

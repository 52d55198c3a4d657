use cartelera_tmdb::models::{Collection, Genre, MovieRecord, MovieSummary};
use cartelera_tmdb::{TmdbClient, TmdbError};
use futures::future::join_all;
use serde::Serialize;
use tracing::warn;

/// How many popular movies the home banner rotates through.
pub const BANNER_MOVIE_COUNT: usize = 11;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FeaturedCollection {
    pub id: u64,
    pub name: &'static str,
}

/// The well-known saga collections surfaced on the home screen.
pub const FEATURED_COLLECTIONS: &[FeaturedCollection] = &[
    FeaturedCollection {
        id: 529892,
        name: "Marvel Cinematic Universe",
    },
    FeaturedCollection {
        id: 10,
        name: "Star Wars",
    },
    FeaturedCollection {
        id: 1241,
        name: "Harry Potter",
    },
    FeaturedCollection {
        id: 119,
        name: "El Señor de los Anillos",
    },
    FeaturedCollection {
        id: 9485,
        name: "Fast & Furious",
    },
];

#[derive(Debug, Clone, Serialize)]
pub struct BannerFeed {
    pub movies: Vec<MovieSummary>,
    pub genres: Vec<Genre>,
}

/// Home banner data: the first popular movies plus the genre list for
/// labelling them, fetched concurrently. Either half may come back empty if
/// its fetch fails; the banner renders whatever arrived.
pub async fn load_banner(client: &TmdbClient) -> BannerFeed {
    let (movies, genres) = tokio::join!(client.popular_movies(1), client.genres());

    let movies = match movies {
        Ok(mut page) => {
            page.results.truncate(BANNER_MOVIE_COUNT);
            page.results
        }
        Err(e) => {
            warn!(error = %e, "banner movie fetch failed");
            Vec::new()
        }
    };
    let genres = match genres {
        Ok(list) => list.genres,
        Err(e) => {
            warn!(error = %e, "banner genre fetch failed");
            Vec::new()
        }
    };

    BannerFeed { movies, genres }
}

/// A saga collection with its films in release order.
pub async fn load_collection(client: &TmdbClient, id: u64) -> Result<Collection, TmdbError> {
    let mut collection = client.collection(id).await?;
    collection.sort_parts_by_release();
    Ok(collection)
}

/// One fixed film on the award-winners shelf, with its award blurb.
#[derive(Debug, Clone, Copy)]
pub struct AwardedTitle {
    pub id: u64,
    pub awards: &'static str,
}

pub const AWARDED_TITLES: &[AwardedTitle] = &[
    AwardedTitle {
        id: 598, // Ciudad de Dios
        awards: "4 nominaciones al Oscar, incluyendo Mejor Director",
    },
    AwardedTitle {
        id: 129, // El viaje de Chihiro
        awards: "Oscar a Mejor Película de Animación 2003",
    },
    AwardedTitle {
        id: 680, // Pulp Fiction
        awards: "Oscar a Mejor Guion Original, Palma de Oro en Cannes",
    },
    AwardedTitle {
        id: 155, // El caballero oscuro
        awards: "2 Oscars, incluyendo Mejor Actor de Reparto para Heath Ledger",
    },
    AwardedTitle {
        id: 13, // Forrest Gump
        awards: "6 Oscars, incluyendo Mejor Película y Mejor Director",
    },
    AwardedTitle {
        id: 274, // El silencio de los corderos
        awards: "5 Oscars principales, incluyendo Mejor Película",
    },
    AwardedTitle {
        id: 240, // El Padrino
        awards: "3 Oscars, incluyendo Mejor Película y Mejor Actor",
    },
    AwardedTitle {
        id: 11216, // Cinema Paradiso
        awards: "Oscar a Mejor Película Extranjera",
    },
    AwardedTitle {
        id: 637, // La vida es bella
        awards: "3 Oscars, incluyendo Mejor Actor y Película Extranjera",
    },
    AwardedTitle {
        id: 77338, // The Artist
        awards: "5 Oscars, incluyendo Mejor Película",
    },
];

#[derive(Debug, Clone, Serialize)]
pub struct AwardedMovie {
    pub awards: &'static str,
    #[serde(flatten)]
    pub record: MovieRecord,
}

/// Award-winners shelf: one record fetch per fixed id, issued concurrently.
/// A film whose fetch fails is dropped from the shelf rather than failing
/// it.
pub async fn load_awarded(client: &TmdbClient) -> Vec<AwardedMovie> {
    let fetches = AWARDED_TITLES
        .iter()
        .map(|title| async move { (title, client.movie(title.id).await) });

    join_all(fetches)
        .await
        .into_iter()
        .filter_map(|(title, outcome)| match outcome {
            Ok(record) => Some(AwardedMovie {
                awards: title.awards,
                record,
            }),
            Err(e) => {
                warn!(movie_id = title.id, error = %e, "awarded movie fetch failed");
                None
            }
        })
        .collect()
}

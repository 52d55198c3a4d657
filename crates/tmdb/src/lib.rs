//! TMDB (The Movie Database) API v3 client.
//!
//! https://developer.themoviedb.org/docs

pub mod client;
pub mod models;

pub use client::TmdbClient;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TmdbError {
    #[error("network error: {0}")]
    Network(String),
    #[error("tmdb returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("not found")]
    NotFound,
    #[error("decode response: {0}")]
    Decode(String),
}

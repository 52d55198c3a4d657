use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use cartelera_core::types::SearchMode;
use cartelera_tmdb::client::MAX_PAGE;
use cartelera_tmdb::models::{MovieSummary, Page, PersonSummary};
use cartelera_tmdb::{TmdbClient, TmdbError};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tracing::warn;

use crate::pager::{PageRejected, Pager};

/// Where a search page comes from, per mode:
///
/// | mode        | endpoint family            | query param        |
/// |-------------|----------------------------|--------------------|
/// | `by_title`  | title search               | free-text query    |
/// | `by_person` | person search              | free-text query    |
/// | `by_genre`  | genre-filtered discovery   | genre id as filter |
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn movie_page(&self, query: &str, page: u32) -> Result<Page<MovieSummary>, TmdbError>;

    async fn person_page(&self, query: &str, page: u32)
    -> Result<Page<PersonSummary>, TmdbError>;

    async fn genre_page(
        &self,
        genre_id: u64,
        page: u32,
    ) -> Result<Page<MovieSummary>, TmdbError>;
}

#[async_trait]
impl SearchBackend for TmdbClient {
    async fn movie_page(&self, query: &str, page: u32) -> Result<Page<MovieSummary>, TmdbError> {
        self.search_movies(query, page).await
    }

    async fn person_page(
        &self,
        query: &str,
        page: u32,
    ) -> Result<Page<PersonSummary>, TmdbError> {
        self.search_people(query, page).await
    }

    async fn genre_page(
        &self,
        genre_id: u64,
        page: u32,
    ) -> Result<Page<MovieSummary>, TmdbError> {
        self.discover_movies_by_genre(genre_id, page).await
    }
}

/// A validated search input: non-empty free text for the title/person modes,
/// a numeric genre identifier for discovery.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    mode: SearchMode,
    term: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid query: {0}")]
pub struct InvalidQuery(pub String);

impl SearchQuery {
    pub fn by_title(query: &str) -> Result<Self, InvalidQuery> {
        Self::free_text(SearchMode::ByTitle, query)
    }

    pub fn by_person(query: &str) -> Result<Self, InvalidQuery> {
        Self::free_text(SearchMode::ByPerson, query)
    }

    pub fn by_genre(genre_id: u64) -> Self {
        Self {
            mode: SearchMode::ByGenre,
            term: genre_id.to_string(),
        }
    }

    fn free_text(mode: SearchMode, query: &str) -> Result<Self, InvalidQuery> {
        let term = query.trim();
        if term.is_empty() {
            return Err(InvalidQuery(format!("{mode} query must be non-empty")));
        }
        Ok(Self {
            mode,
            term: term.to_string(),
        })
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    fn genre_id(&self) -> u64 {
        // Only reachable for ByGenre, whose constructor stored a number.
        self.term.parse().unwrap_or_default()
    }
}

/// Result elements of one page; the variant is determined solely by the
/// search mode.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SearchResults {
    Movies(Vec<MovieSummary>),
    People(Vec<PersonSummary>),
}

impl SearchResults {
    pub fn empty_for(mode: SearchMode) -> Self {
        match mode {
            SearchMode::ByTitle | SearchMode::ByGenre => Self::Movies(Vec::new()),
            SearchMode::ByPerson => Self::People(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Movies(v) => v.len(),
            Self::People(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One fetched and clamped result page.
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub page: u32,
    pub total_pages: u32,
    pub results: SearchResults,
}

impl SearchPage {
    /// The deterministic shape of a failed fetch: nothing to show, nothing
    /// to paginate.
    pub fn empty(mode: SearchMode) -> Self {
        Self {
            page: 1,
            total_pages: 0,
            results: SearchResults::empty_for(mode),
        }
    }
}

/// Fetch one result page for `query`. The requested page is clamped to
/// `[1, 500]` before dispatch and the reported total is clamped on the way
/// back, so callers never see the provider's uncapped numbers.
pub async fn fetch_page<B: SearchBackend + ?Sized>(
    backend: &B,
    query: &SearchQuery,
    page: u32,
) -> Result<SearchPage, TmdbError> {
    let page = page.clamp(1, MAX_PAGE);
    match query.mode() {
        SearchMode::ByTitle => backend
            .movie_page(query.term(), page)
            .await
            .map(movie_results),
        SearchMode::ByPerson => backend
            .person_page(query.term(), page)
            .await
            .map(person_results),
        SearchMode::ByGenre => backend
            .genre_page(query.genre_id(), page)
            .await
            .map(movie_results),
    }
}

fn movie_results(page: Page<MovieSummary>) -> SearchPage {
    SearchPage {
        page: page.page,
        total_pages: page.total_pages.min(MAX_PAGE),
        results: SearchResults::Movies(page.results),
    }
}

fn person_results(page: Page<PersonSummary>) -> SearchPage {
    SearchPage {
        page: page.page,
        total_pages: page.total_pages.min(MAX_PAGE),
        results: SearchResults::People(page.results),
    }
}

/// Snapshot of an ongoing search, published through the session's watch
/// channel. Settled frames (`is_loading == false`) always carry a page
/// number and a result list that belong together.
#[derive(Debug, Clone, Serialize)]
pub struct SearchState {
    pub mode: SearchMode,
    pub query: String,
    pub current_page: u32,
    pub total_pages: u32,
    pub results: SearchResults,
    pub is_loading: bool,
}

impl SearchState {
    fn idle() -> Self {
        Self {
            mode: SearchMode::ByTitle,
            query: String::new(),
            current_page: 1,
            total_pages: 0,
            results: SearchResults::Movies(Vec::new()),
            is_loading: false,
        }
    }

    fn emptied(query: &SearchQuery) -> Self {
        Self {
            mode: query.mode(),
            query: query.term().to_string(),
            current_page: 1,
            total_pages: 0,
            results: SearchResults::empty_for(query.mode()),
            is_loading: false,
        }
    }
}

/// Viewport side effects for whatever front end renders the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvent {
    ScrollToTop,
}

/// Outcome of a page-selection intent.
#[derive(Debug)]
pub enum PageSelection {
    /// The page was fetched and the state swapped.
    Applied(u32),
    /// Target outside `[1, total_pages]`; nothing changed, nothing was sent.
    Rejected(PageRejected),
    /// A newer search or page intent was issued while this one was in
    /// flight; its response was discarded.
    Superseded,
    /// The fetch failed; the pane was cleared.
    Failed,
}

/// Owns one `SearchState` and serializes all mutations of it.
///
/// Every dispatch is tagged with a monotonically increasing sequence number;
/// a response that is no longer the latest issued when it resolves is
/// discarded, so a slow page 1 can never overwrite a fast page 2 issued
/// after it.
pub struct SearchSession<B: SearchBackend> {
    backend: B,
    seq: AtomicU64,
    publish: Mutex<()>,
    pager: Mutex<Pager>,
    active_query: Mutex<Option<SearchQuery>>,
    state_tx: watch::Sender<SearchState>,
    events_tx: broadcast::Sender<SessionEvent>,
}

impl<B: SearchBackend> SearchSession<B> {
    pub fn new(backend: B) -> Self {
        let (state_tx, _) = watch::channel(SearchState::idle());
        let (events_tx, _) = broadcast::channel(16);
        Self {
            backend,
            seq: AtomicU64::new(0),
            publish: Mutex::new(()),
            pager: Mutex::new(Pager::new()),
            active_query: Mutex::new(None),
            state_tx,
            events_tx,
        }
    }

    /// Read-only view of the state stream; consumers may not mutate it.
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state_tx.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    pub fn state(&self) -> SearchState {
        self.state_tx.borrow().clone()
    }

    /// Run a fresh search: page 1 of the mode-appropriate endpoint, result
    /// set replaced in one frame.
    pub async fn search(&self, query: SearchQuery) -> SearchState {
        let seq = self.next_seq();
        self.state_tx.send_modify(|s| s.is_loading = true);

        let outcome = fetch_page(&self.backend, &query, 1).await;

        let _guard = self.publish.lock().unwrap();
        if !self.is_latest(seq) {
            return self.state();
        }

        *self.active_query.lock().unwrap() = Some(query.clone());
        let next = match outcome {
            Ok(page) => {
                self.pager.lock().unwrap().reset(page.total_pages);
                SearchState {
                    mode: query.mode(),
                    query: query.term().to_string(),
                    current_page: 1,
                    total_pages: page.total_pages,
                    results: page.results,
                    is_loading: false,
                }
            }
            Err(e) => {
                warn!(mode = %query.mode(), query = query.term(), error = %e, "search failed");
                self.pager.lock().unwrap().reset(0);
                SearchState::emptied(&query)
            }
        };
        self.state_tx.send_replace(next.clone());
        next
    }

    /// Map a user page-change intent to a re-fetch of the active query.
    pub async fn select_page(&self, target: u32) -> PageSelection {
        let selected = self.pager.lock().unwrap().select(target);
        let target = match selected {
            Ok(t) => t,
            Err(rejected) => return PageSelection::Rejected(rejected),
        };
        let Some(query) = self.active_query.lock().unwrap().clone() else {
            return PageSelection::Rejected(PageRejected {
                target,
                total_pages: 0,
            });
        };

        let seq = self.next_seq();
        self.state_tx.send_modify(|s| {
            s.current_page = target;
            s.is_loading = true;
        });

        let outcome = fetch_page(&self.backend, &query, target).await;

        let _guard = self.publish.lock().unwrap();
        if !self.is_latest(seq) {
            return PageSelection::Superseded;
        }

        match outcome {
            Ok(page) => {
                let mut pager = self.pager.lock().unwrap();
                pager.settle_ok(page.total_pages);
                let current_page = pager.current_page();
                drop(pager);

                self.state_tx.send_modify(|s| {
                    s.current_page = current_page;
                    s.total_pages = page.total_pages;
                    s.results = page.results;
                    s.is_loading = false;
                });
                let _ = self.events_tx.send(SessionEvent::ScrollToTop);
                PageSelection::Applied(current_page)
            }
            Err(e) => {
                warn!(mode = %query.mode(), query = query.term(), page = target, error = %e,
                    "page fetch failed");
                self.pager.lock().unwrap().settle_err();
                self.state_tx.send_replace(SearchState::emptied(&query));
                PageSelection::Failed
            }
        }
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest(&self, seq: u64) -> bool {
        self.seq.load(Ordering::SeqCst) == seq
    }
}

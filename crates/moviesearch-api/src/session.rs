//! `SearchSession` - incremental paginated search.
//!
//! The session owns the query, the page cursor and the accumulated results.
//! The API client stays stateless. At most one page request is in flight at
//! a time; a `load_more` issued while another is pending returns
//! [`LoadOutcome::AlreadyLoading`] without touching the cursor.
//!
//! The cursor counts pages that were loaded successfully. A failed request
//! leaves it unchanged, so the next `load_more` asks for the same page again.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::instrument;

use crate::omdb::{LocalOmdbApi, Movie, OmdbError, SearchPage};

/// What a `new_search` / `load_more` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page arrived; carries the number of movies appended.
    Appended(usize),
    /// No query is active (never searched, or searched for an empty string).
    NoQuery,
    /// Another page request is in flight; nothing was sent.
    AlreadyLoading,
    /// The provider has no further pages; nothing was sent.
    Exhausted,
    /// A newer `new_search` replaced the query while this request was in
    /// flight; its response was discarded.
    Superseded,
}

/// Mutable session state, guarded by a mutex that is never held across
/// an `.await`.
#[derive(Debug, Default)]
struct SessionState {
    query: Option<String>,
    current_page: u32,
    results: Vec<Movie>,
    total_results: Option<u32>,
    end_reached: bool,
    loading: bool,
    generation: u64,
}

impl SessionState {
    fn reset(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.query = None;
        self.current_page = 0;
        self.results.clear();
        self.total_results = None;
        self.end_reached = false;
        self.loading = false;
    }

    fn is_exhausted(&self) -> bool {
        if self.end_reached {
            return true;
        }
        self.total_results
            .and_then(|total| usize::try_from(total).ok())
            .is_some_and(|total| self.results.len() >= total)
    }

    /// Appends a page and returns how many movies it carried.
    fn append(&mut self, page: SearchPage) -> usize {
        let count = page.movies.len();
        if count == 0 {
            self.end_reached = true;
        }
        if page.total_results.is_some() {
            self.total_results = page.total_results;
        }
        self.results.extend(page.movies);
        count
    }
}

/// Clears the in-flight flag if the request future is dropped before it
/// completes.
struct InFlight<'a> {
    state: &'a Mutex<SessionState>,
    generation: u64,
    armed: bool,
}

impl InFlight<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = lock(self.state);
        if state.generation == self.generation {
            tracing::debug!("Page request dropped before completion");
            state.loading = false;
        }
    }
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A search session bound to one API client.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct SearchSession<A> {
    api: Arc<A>,
    state: Mutex<SessionState>,
}

impl<A> SearchSession<A> {
    /// Creates an idle session.
    #[must_use]
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Active query, if any.
    #[must_use]
    pub fn query(&self) -> Option<String> {
        lock(&self.state).query.clone()
    }

    /// Number of pages loaded for the active query.
    #[must_use]
    pub fn current_page(&self) -> u32 {
        lock(&self.state).current_page
    }

    /// Snapshot of accumulated results in arrival order.
    #[must_use]
    pub fn results(&self) -> Vec<Movie> {
        lock(&self.state).results.clone()
    }

    /// Number of accumulated results.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.state).results.len()
    }

    /// Returns `true` if no results are accumulated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.state).results.is_empty()
    }

    /// Provider-reported hit count for the active query.
    #[must_use]
    pub fn total_results(&self) -> Option<u32> {
        lock(&self.state).total_results
    }

    /// Returns `true` while a page request is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        lock(&self.state).loading
    }

    /// Returns `true` once the provider has no further pages.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        lock(&self.state).is_exhausted()
    }
}

impl<A: LocalOmdbApi> SearchSession<A> {
    /// Starts a fresh search, replacing any previous results.
    ///
    /// The query is trimmed. An empty query clears the session and sends
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns the API error; results stay empty and the cursor stays at 0
    /// so that [`Self::load_more`] retries the first page. The same holds
    /// if the returned future is dropped before the response arrives.
    #[instrument(skip_all)]
    pub async fn new_search(&self, query: &str) -> Result<LoadOutcome, OmdbError> {
        let query = query.trim();
        let generation = {
            let mut state = lock(&self.state);
            state.reset();
            if query.is_empty() {
                tracing::debug!("Empty query; session cleared");
                return Ok(LoadOutcome::NoQuery);
            }
            state.query = Some(String::from(query));
            state.loading = true;
            state.generation
        };
        let mut in_flight = InFlight {
            state: &self.state,
            generation,
            armed: true,
        };

        tracing::debug!(%query, "New search");
        let result = self.api.search_by_query(query).await;

        let mut state = lock(&self.state);
        in_flight.disarm();
        if state.generation != generation {
            tracing::debug!(%query, "Search superseded by a newer query");
            return Ok(LoadOutcome::Superseded);
        }
        state.loading = false;

        match result {
            Ok(page) => {
                state.current_page = 1;
                let appended = state.append(page);
                tracing::info!(
                    %query,
                    appended,
                    total = ?state.total_results,
                    "First page loaded"
                );
                Ok(LoadOutcome::Appended(appended))
            }
            Err(e) => {
                tracing::warn!(%query, error = %e, "Search failed");
                Err(e)
            }
        }
    }

    /// Loads the page after the cursor and appends it.
    ///
    /// Safe to call repeatedly from a "near end of list" trigger: while a
    /// request is in flight further calls return
    /// [`LoadOutcome::AlreadyLoading`] and neither advance the cursor nor
    /// send anything.
    ///
    /// # Errors
    ///
    /// Returns the API error; accumulated results and the cursor are left
    /// unchanged.
    #[instrument(skip_all)]
    pub async fn load_more(&self) -> Result<LoadOutcome, OmdbError> {
        let (query, next_page, generation) = {
            let mut state = lock(&self.state);
            let Some(query) = state.query.clone() else {
                return Ok(LoadOutcome::NoQuery);
            };
            if state.loading {
                tracing::debug!(%query, page = state.current_page, "Page load already in flight");
                return Ok(LoadOutcome::AlreadyLoading);
            }
            if state.is_exhausted() {
                tracing::debug!(%query, loaded = state.results.len(), "No more pages");
                return Ok(LoadOutcome::Exhausted);
            }
            state.loading = true;
            (query, state.current_page.saturating_add(1), state.generation)
        };
        let mut in_flight = InFlight {
            state: &self.state,
            generation,
            armed: true,
        };

        tracing::debug!(%query, page = next_page, "Loading next page");
        let result = self.api.search_next_page(&query, next_page).await;

        let mut state = lock(&self.state);
        in_flight.disarm();
        if state.generation != generation {
            tracing::debug!(%query, page = next_page, "Page discarded; query changed");
            return Ok(LoadOutcome::Superseded);
        }
        state.loading = false;

        match result {
            Ok(page) => {
                state.current_page = next_page;
                let appended = state.append(page);
                tracing::info!(
                    %query,
                    page = next_page,
                    appended,
                    accumulated = state.results.len(),
                    "Page loaded"
                );
                Ok(LoadOutcome::Appended(appended))
            }
            Err(e) => {
                tracing::warn!(
                    %query,
                    page = next_page,
                    error = %e,
                    "Page load failed; cursor unchanged"
                );
                Err(e)
            }
        }
    }
}

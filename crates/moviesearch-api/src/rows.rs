//! `RowFetcher` - per-row poster and plot fetches.
//!
//! Each visible row gets one task keyed by movie id that fetches the
//! poster (and decodes it) and the plot concurrently. Leaving view cancels
//! the task. Results are delivered on an unbounded channel as [`RowEvent`]s.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::omdb::{DecodedPoster, Movie, OmdbApi, decode_poster};

/// Update for a single row.
#[derive(Debug)]
pub enum RowEvent {
    /// Poster fetched and decoded.
    PosterReady {
        /// Movie id.
        id: String,
        /// Decoded poster.
        poster: DecodedPoster,
    },
    /// Poster missing or failed; show a placeholder.
    PosterUnavailable {
        /// Movie id.
        id: String,
    },
    /// Plot text; empty if the lookup failed.
    PlotReady {
        /// Movie id.
        id: String,
        /// Short plot.
        plot: String,
    },
}

impl RowEvent {
    /// Movie id the event belongs to.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::PosterReady { id, .. }
            | Self::PosterUnavailable { id }
            | Self::PlotReady { id, .. } => id,
        }
    }
}

#[derive(Debug)]
struct RowTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Spawns and cancels per-row fetch tasks.
#[derive(Debug)]
pub struct RowFetcher<A> {
    api: Arc<A>,
    events: mpsc::UnboundedSender<RowEvent>,
    tasks: HashMap<String, RowTask>,
    fetch_posters: bool,
}

impl<A> RowFetcher<A> {
    /// Cancels the task for `id`. Returns `false` if none was tracked.
    pub fn row_disappeared(&mut self, id: &str) -> bool {
        let Some(task) = self.tasks.remove(id) else {
            return false;
        };
        if !task.handle.is_finished() {
            tracing::debug!(%id, "Cancelling row fetch");
        }
        task.token.cancel();
        true
    }

    /// Cancels every tracked task.
    pub fn cancel_all(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.token.cancel();
        }
    }

    /// Forgets tasks that already completed.
    pub fn prune_finished(&mut self) {
        self.tasks.retain(|_, task| !task.handle.is_finished());
    }

    /// Number of tasks still running.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.tasks
            .values()
            .filter(|task| !task.handle.is_finished())
            .count()
    }
}

impl<A> RowFetcher<A>
where
    A: OmdbApi + Sync + 'static,
{
    /// Creates a fetcher and the receiver for its events.
    #[must_use]
    pub fn new(api: Arc<A>) -> (Self, mpsc::UnboundedReceiver<RowEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let fetcher = Self {
            api,
            events,
            tasks: HashMap::new(),
            fetch_posters: true,
        };
        (fetcher, rx)
    }

    /// Enables or disables poster fetches (plots are always fetched).
    #[must_use]
    pub fn fetch_posters(mut self, enabled: bool) -> Self {
        self.fetch_posters = enabled;
        self
    }

    /// Starts fetching for a row that became visible.
    ///
    /// Returns `false` if a task for the same id is still running.
    /// Entries of finished tasks are dropped first, so the tracked set
    /// never outgrows the rows that are still being fetched.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn row_appeared(&mut self, movie: &Movie) -> bool {
        self.prune_finished();
        if let Some(task) = self.tasks.get(movie.id())
            && !task.handle.is_finished()
        {
            tracing::trace!(id = %movie.id(), "Row fetch already running");
            return false;
        }

        let id = String::from(movie.id());
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        let movie = movie.clone();
        let fetch_posters = self.fetch_posters;

        let handle = tokio::spawn(async move {
            tokio::select! {
                () = cancelled.cancelled() => {
                    tracing::debug!(id = %movie.id(), "Row fetch cancelled");
                }
                () = fetch_row(api.as_ref(), &movie, fetch_posters, &events) => {}
            }
        });

        self.tasks.insert(id, RowTask { token, handle });
        true
    }
}

/// Fetches the short plot of every movie concurrently and returns them by
/// id. Duplicate ids are fetched once; failed lookups map to `""`.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
pub async fn collect_plots<A>(api: Arc<A>, movies: &[Movie]) -> HashMap<String, String>
where
    A: OmdbApi + Sync + 'static,
{
    let (fetcher, mut rx) = RowFetcher::new(api);
    let mut fetcher = fetcher.fetch_posters(false);

    let mut pending = movies
        .iter()
        .filter(|movie| fetcher.row_appeared(movie))
        .count();

    let mut plots = HashMap::with_capacity(pending);
    while pending > 0 {
        let Some(event) = rx.recv().await else {
            break;
        };
        if let RowEvent::PlotReady { id, plot } = event {
            plots.insert(id, plot);
        }
        pending = pending.saturating_sub(1);
    }
    tracing::debug!(fetched = plots.len(), "Plots collected");

    plots
}

impl<A> Drop for RowFetcher<A> {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// Fetches poster and plot for one row concurrently, emitting each as it
/// completes.
async fn fetch_row<A: OmdbApi + Sync>(
    api: &A,
    movie: &Movie,
    fetch_posters: bool,
    events: &mpsc::UnboundedSender<RowEvent>,
) {
    let poster = async {
        if fetch_posters {
            emit(events, poster_event(api, movie).await);
        }
    };
    let plot = async {
        emit(events, plot_event(api, movie).await);
    };
    tokio::join!(poster, plot);
}

fn emit(events: &mpsc::UnboundedSender<RowEvent>, event: RowEvent) {
    if events.send(event).is_err() {
        tracing::debug!("Row event receiver dropped");
    }
}

async fn poster_event<A: OmdbApi + Sync>(api: &A, movie: &Movie) -> RowEvent {
    let id = String::from(movie.id());
    if !movie.has_poster() {
        tracing::debug!(%id, "Movie has no poster");
        return RowEvent::PosterUnavailable { id };
    }

    match api
        .fetch_poster(movie.poster_url())
        .await
        .and_then(decode_poster)
    {
        Ok(poster) => RowEvent::PosterReady { id, poster },
        Err(e) => {
            tracing::warn!(%id, error = %e, "Could not load poster");
            RowEvent::PosterUnavailable { id }
        }
    }
}

async fn plot_event<A: OmdbApi + Sync>(api: &A, movie: &Movie) -> RowEvent {
    let id = String::from(movie.id());
    let plot = match api.fetch_plot(movie.id()).await {
        Ok(plot) => plot,
        Err(e) => {
            tracing::warn!(%id, error = %e, "Could not load plot");
            String::new()
        }
    };
    RowEvent::PlotReady { id, plot }
}

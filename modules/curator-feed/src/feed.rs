//! The feed actor: a single task owning filter state and the visible window,
//! with fetches and writes running as spawned tasks so user input is never
//! blocked behind I/O.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{debug, warn};

use curator_common::error::Result;
use curator_common::{
    CatalogSort, Category, CategoryFilter, CategoryUsage, ListQuery, ReviewStatus,
};

use crate::query::FeedQuery;
use crate::source::{FeedRow, FeedSource};

/// Keystrokes quieter than this apply the pending search.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);
/// External change notifications are coalesced for this long before a refetch.
pub const REFRESH_DEBOUNCE: Duration = Duration::from_secs(2);
/// Background refetch cadence when nothing else triggers one.
pub const POLL_INTERVAL: Duration = Duration::from_secs(15 * 60);
/// Extra attempts after a failed fetch before the error is surfaced.
const FETCH_RETRIES: u32 = 2;

/// What the UI renders. Published through a `watch` channel on every change.
#[derive(Debug, Clone)]
pub struct FeedSnapshot<R> {
    pub rows: Vec<R>,
    pub total: u64,
    pub counts: Vec<CategoryUsage>,
    pub uncategorized: i64,
    pub loading: bool,
    pub error: Option<String>,
}

impl<R> Default for FeedSnapshot<R> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            total: 0,
            counts: Vec::new(),
            uncategorized: 0,
            loading: false,
            error: None,
        }
    }
}

enum Command {
    SetSearch(String),
    SetCategory(CategoryFilter),
    SetReview(Option<ReviewStatus>),
    SetSort(CatalogSort),
    LoadMore,
    AssignCategory {
        ids: Vec<i64>,
        category: Option<Category>,
    },
    Refresh,
}

struct FetchedData<R> {
    rows: Vec<R>,
    total: u64,
    counts: Vec<CategoryUsage>,
    uncategorized: i64,
}

enum TaskMsg<R> {
    Fetched {
        generation: u64,
        append: bool,
        outcome: Result<FetchedData<R>>,
    },
    AssignDone {
        outcome: Result<()>,
    },
}

/// Control half of a running feed. Cheap to clone; dropping every handle
/// shuts the actor down.
#[derive(Clone)]
pub struct FeedHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl FeedHandle {
    pub fn set_search(&self, search: impl Into<String>) {
        let _ = self.tx.send(Command::SetSearch(search.into()));
    }

    pub fn set_category_filter(&self, filter: CategoryFilter) {
        let _ = self.tx.send(Command::SetCategory(filter));
    }

    pub fn set_review_filter(&self, review: Option<ReviewStatus>) {
        let _ = self.tx.send(Command::SetReview(review));
    }

    pub fn set_sort(&self, sort: CatalogSort) {
        let _ = self.tx.send(Command::SetSort(sort));
    }

    /// Fetch the next page and append it (infinite scroll).
    pub fn load_more(&self) {
        let _ = self.tx.send(Command::LoadMore);
    }

    /// Optimistically assign (or clear) a category on the given rows.
    pub fn assign_category(&self, ids: Vec<i64>, category: Option<Category>) {
        let _ = self.tx.send(Command::AssignCategory { ids, category });
    }

    /// Force an immediate refetch.
    pub fn refresh(&self) {
        let _ = self.tx.send(Command::Refresh);
    }
}

pub struct Feed;

impl Feed {
    /// Spawn a feed with no external change stream.
    pub fn spawn<S: FeedSource>(
        source: S,
        query: FeedQuery,
    ) -> (FeedHandle, watch::Receiver<FeedSnapshot<S::Row>>) {
        let (_tx, rx) = mpsc::unbounded_channel();
        Self::spawn_with_refresh(source, query, rx)
    }

    /// Spawn a feed that also refetches (debounced) whenever `refresh_rx`
    /// delivers an event, e.g. bridged from the database change listener.
    pub fn spawn_with_refresh<S: FeedSource>(
        source: S,
        query: FeedQuery,
        refresh_rx: mpsc::UnboundedReceiver<()>,
    ) -> (FeedHandle, watch::Receiver<FeedSnapshot<S::Row>>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (task_tx, task_rx) = mpsc::unbounded_channel();
        let (watch_tx, watch_rx) = watch::channel(FeedSnapshot::default());

        let mut actor = Actor {
            source: Arc::new(source),
            query,
            generation: 0,
            pending_search: None,
            search_deadline: None,
            refresh_deadline: None,
            next_poll: Instant::now() + POLL_INTERVAL,
            refresh_open: true,
            snapshot: FeedSnapshot::default(),
            watch_tx,
            task_tx,
        };

        tokio::spawn(async move {
            actor.start_fetch(false);
            run(actor, cmd_rx, refresh_rx, task_rx).await;
        });

        (FeedHandle { tx: cmd_tx }, watch_rx)
    }
}

struct Actor<S: FeedSource> {
    source: Arc<S>,
    query: FeedQuery,
    /// Bumped whenever the filter set changes; in-flight fetches from older
    /// generations are discarded on arrival.
    generation: u64,
    pending_search: Option<String>,
    search_deadline: Option<Instant>,
    refresh_deadline: Option<Instant>,
    next_poll: Instant,
    refresh_open: bool,
    snapshot: FeedSnapshot<S::Row>,
    watch_tx: watch::Sender<FeedSnapshot<S::Row>>,
    task_tx: mpsc::UnboundedSender<TaskMsg<S::Row>>,
}

async fn run<S: FeedSource>(
    mut actor: Actor<S>,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    mut refresh_rx: mpsc::UnboundedReceiver<()>,
    mut task_rx: mpsc::UnboundedReceiver<TaskMsg<S::Row>>,
) {
    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(cmd) => actor.handle_command(cmd),
                None => break,
            },
            Some(msg) = task_rx.recv() => actor.handle_task(msg),
            evt = refresh_rx.recv(), if actor.refresh_open => match evt {
                Some(()) => actor.note_external_change(),
                None => actor.refresh_open = false,
            },
            _ = maybe_sleep(actor.search_deadline), if actor.search_deadline.is_some() => {
                actor.apply_pending_search();
            }
            _ = maybe_sleep(actor.refresh_deadline), if actor.refresh_deadline.is_some() => {
                actor.refresh_deadline = None;
                debug!("Coalesced external changes, refetching");
                actor.start_fetch(false);
            }
            _ = sleep_until(actor.next_poll) => {
                debug!("Feed poll interval elapsed, refetching");
                actor.start_fetch(false);
            }
        }
    }
}

async fn maybe_sleep(deadline: Option<Instant>) {
    match deadline {
        Some(d) => sleep_until(d).await,
        None => std::future::pending::<()>().await,
    }
}

impl<S: FeedSource> Actor<S> {
    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::SetSearch(search) => {
                self.pending_search = Some(search);
                self.search_deadline = Some(Instant::now() + SEARCH_DEBOUNCE);
            }
            Command::SetCategory(filter) => {
                if self.query.category != filter {
                    self.query.category = filter;
                    self.start_fetch(false);
                }
            }
            Command::SetReview(review) => {
                if self.query.review != review {
                    self.query.review = review;
                    self.start_fetch(false);
                }
            }
            Command::SetSort(sort) => {
                if self.query.sort != sort {
                    self.query.sort = sort;
                    self.start_fetch(false);
                }
            }
            Command::LoadMore => {
                let have = self.snapshot.rows.len() as u64;
                if !self.snapshot.loading && have < self.snapshot.total {
                    self.start_fetch(true);
                }
            }
            Command::AssignCategory { ids, category } => {
                self.optimistic_assign(ids, category);
            }
            Command::Refresh => self.start_fetch(false),
        }
    }

    fn apply_pending_search(&mut self) {
        self.search_deadline = None;
        if let Some(search) = self.pending_search.take() {
            if search != self.query.search {
                self.query.search = search;
                self.start_fetch(false);
            }
        }
    }

    fn note_external_change(&mut self) {
        self.refresh_deadline = Some(Instant::now() + REFRESH_DEBOUNCE);
    }

    /// Kick off a fetch. Replacing fetches start a new generation; appending
    /// fetches stay on the current one so a filter change invalidates them.
    fn start_fetch(&mut self, append: bool) {
        if !append {
            self.generation += 1;
        }
        let generation = self.generation;
        let offset = if append {
            self.snapshot.rows.len() as i64
        } else {
            0
        };
        let limit = self.query.page_size as i64;
        let list_query = self.query.to_list_query();
        let source = self.source.clone();
        let task_tx = self.task_tx.clone();

        self.snapshot.loading = true;
        self.publish();
        self.next_poll = Instant::now() + POLL_INTERVAL;

        tokio::spawn(async move {
            let outcome = fetch_with_retry(source.as_ref(), &list_query, offset, limit).await;
            let _ = task_tx.send(TaskMsg::Fetched {
                generation,
                append,
                outcome,
            });
        });
    }

    fn handle_task(&mut self, msg: TaskMsg<S::Row>) {
        match msg {
            TaskMsg::Fetched {
                generation,
                append,
                outcome,
            } => {
                if generation != self.generation {
                    debug!(generation, current = self.generation, "Discarding stale fetch");
                    return;
                }
                match outcome {
                    Ok(data) => {
                        if append {
                            self.snapshot.rows.extend(data.rows);
                        } else {
                            self.snapshot.rows = data.rows;
                        }
                        self.snapshot.total = data.total;
                        self.snapshot.counts = data.counts;
                        self.snapshot.uncategorized = data.uncategorized;
                        self.snapshot.loading = false;
                        self.snapshot.error = None;
                    }
                    Err(e) => {
                        warn!(error = %e, "Feed fetch failed");
                        self.snapshot.loading = false;
                        self.snapshot.error = Some(e.to_string());
                    }
                }
                self.publish();
            }
            TaskMsg::AssignDone { outcome } => {
                if let Err(e) = outcome {
                    warn!(error = %e, "Category assignment failed, refetching to revert");
                    self.snapshot.error = Some(e.to_string());
                    self.start_fetch(false);
                }
            }
        }
    }

    /// Patch the local window and counters before the write lands, then
    /// persist. A failed write reverts by refetching.
    fn optimistic_assign(&mut self, ids: Vec<i64>, category: Option<Category>) {
        if ids.is_empty() {
            return;
        }
        let id_set: HashSet<i64> = ids.iter().copied().collect();
        let new_id = category.as_ref().map(|c| c.id);

        let mut departures: Vec<Option<i64>> = Vec::new();
        for row in &mut self.snapshot.rows {
            if !id_set.contains(&row.id()) {
                continue;
            }
            let old = row.category_id();
            if old != new_id {
                departures.push(old);
            }
            row.apply_category(category.as_ref());
        }

        let moved = departures.len() as i64;
        for old in departures {
            self.bump_count(old, -1);
        }
        if moved > 0 {
            self.bump_target_count(category.as_ref(), moved);
        }

        // Rows the active filter no longer matches drop out of the window.
        let before = self.snapshot.rows.len();
        match self.query.category {
            CategoryFilter::All => {}
            CategoryFilter::Uncategorized => {
                self.snapshot
                    .rows
                    .retain(|r| !(id_set.contains(&r.id()) && r.category_id().is_some()));
            }
            CategoryFilter::Id(cid) => {
                self.snapshot
                    .rows
                    .retain(|r| !(id_set.contains(&r.id()) && r.category_id() != Some(cid)));
            }
        }
        let dropped = (before - self.snapshot.rows.len()) as u64;
        self.snapshot.total = self.snapshot.total.saturating_sub(dropped);

        self.publish();

        let source = self.source.clone();
        let task_tx = self.task_tx.clone();
        tokio::spawn(async move {
            let outcome = source.assign_category(&ids, category.as_ref()).await;
            let _ = task_tx.send(TaskMsg::AssignDone { outcome });
        });
    }

    fn bump_count(&mut self, category_id: Option<i64>, delta: i64) {
        match category_id {
            None => self.snapshot.uncategorized = (self.snapshot.uncategorized + delta).max(0),
            Some(id) => {
                if let Some(entry) = self.snapshot.counts.iter_mut().find(|c| c.id == id) {
                    entry.usage_count = (entry.usage_count + delta).max(0);
                }
            }
        }
    }

    fn bump_target_count(&mut self, category: Option<&Category>, delta: i64) {
        match category {
            None => self.snapshot.uncategorized += delta,
            Some(cat) => {
                if let Some(entry) = self.snapshot.counts.iter_mut().find(|c| c.id == cat.id) {
                    entry.usage_count += delta;
                } else {
                    self.snapshot.counts.push(CategoryUsage {
                        id: cat.id,
                        name: cat.name.clone(),
                        color: cat.color.clone(),
                        icon: cat.icon.clone(),
                        parent_id: cat.parent_id,
                        sort_order: cat.sort_order,
                        usage_count: delta,
                    });
                }
            }
        }
    }

    fn publish(&self) {
        self.watch_tx.send_replace(self.snapshot.clone());
    }
}

async fn fetch_with_retry<S: FeedSource>(
    source: &S,
    query: &ListQuery,
    offset: i64,
    limit: i64,
) -> Result<FetchedData<S::Row>> {
    let mut attempt = 0;
    loop {
        match try_fetch(source, query, offset, limit).await {
            Ok(data) => return Ok(data),
            Err(e) if attempt < FETCH_RETRIES => {
                attempt += 1;
                warn!(error = %e, attempt, "Feed fetch failed, retrying");
            }
            Err(e) => return Err(e),
        }
    }
}

async fn try_fetch<S: FeedSource>(
    source: &S,
    query: &ListQuery,
    offset: i64,
    limit: i64,
) -> Result<FetchedData<S::Row>> {
    let page = source.fetch_page(query, offset, limit).await?;
    let (counts, uncategorized) = source.category_counts().await?;
    Ok(FetchedData {
        rows: page.rows,
        total: page.total,
        counts,
        uncategorized,
    })
}

//! Dual-mode search over a live collection snapshot.
//!
//! ```text
//! store.observe() ──snapshot──▶ rebuild task ──(debounce)──▶ DocumentIndex
//!        │                                                        │
//!        └────────────── live snapshot ──────▶ search() ◀─────────┘
//! ```
//!
//! The rebuild task owns index construction. Queries never wait on it: fast
//! mode reads whatever index was last published, accurate mode always scans
//! the live snapshot.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::{IndexSchema, Record, RecordId, SearchMode, SearchQuery};
use crate::ports::Snapshot;
use crate::services::index::DocumentIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    /// Upper bound on records returned for blank and accurate queries.
    pub result_cap: usize,
    /// Distinct ids requested from the index in fast mode.
    pub index_limit: usize,
    /// Quiet period after the last snapshot change before rebuilding.
    pub rebuild_debounce: Duration,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            result_cap: 100,
            index_limit: 100,
            rebuild_debounce: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub term: String,
    pub mode: SearchMode,
    pub results: Vec<Record>,
}

type PublishedIndex = Option<Arc<DocumentIndex>>;

/// Search for one collection. Must be created inside a tokio runtime.
pub struct SearchController {
    settings: SearchSettings,
    snapshots: watch::Receiver<Snapshot>,
    index: watch::Receiver<PublishedIndex>,
    state: SearchState,
    rebuild_task: JoinHandle<()>,
}

impl SearchController {
    pub fn spawn(
        schema: IndexSchema,
        snapshots: watch::Receiver<Snapshot>,
        settings: SearchSettings,
    ) -> Self {
        let (index_tx, index_rx) = watch::channel(None);
        let rebuild_task = tokio::spawn(rebuild_loop(
            schema,
            snapshots.clone(),
            index_tx,
            settings.rebuild_debounce,
        ));

        let mut controller = Self {
            settings,
            snapshots,
            index: index_rx,
            state: SearchState::default(),
            rebuild_task,
        };
        controller.refresh();
        controller
    }

    /// Runs one query against the current snapshot and index.
    pub fn search(&self, term: &str, mode: SearchMode) -> Vec<Record> {
        let snapshot = Arc::clone(&self.snapshots.borrow());
        let query = SearchQuery::new(term).with_mode(mode);

        if query.is_blank() {
            return snapshot
                .iter()
                .take(self.settings.result_cap)
                .cloned()
                .collect();
        }

        match query.mode {
            SearchMode::Fast => self.search_index(&snapshot, &query.term),
            SearchMode::Accurate => self.search_exact(&snapshot, &query.term),
        }
    }

    fn search_index(&self, snapshot: &[Record], term: &str) -> Vec<Record> {
        let Some(index) = self.index.borrow().clone() else {
            tracing::debug!("Fast search requested before the first index build");
            return Vec::new();
        };

        let ids: HashSet<RecordId> = index
            .search(term, self.settings.index_limit)
            .into_iter()
            .flat_map(|hits| hits.ids)
            .collect();

        snapshot
            .iter()
            .filter(|record| record.id.is_some_and(|id| ids.contains(&id)))
            .cloned()
            .collect()
    }

    fn search_exact(&self, snapshot: &[Record], term: &str) -> Vec<Record> {
        let needle = term.to_lowercase();
        snapshot
            .iter()
            .filter(|record| {
                record
                    .display_values()
                    .any(|value| value.to_lowercase().contains(&needle))
            })
            .take(self.settings.result_cap)
            .cloned()
            .collect()
    }

    pub fn set_term(&mut self, term: impl Into<String>) -> &[Record] {
        self.state.term = term.into();
        self.refresh()
    }

    /// Switching modes only re-runs the query; the index is left alone.
    pub fn set_mode(&mut self, mode: SearchMode) -> &[Record] {
        self.state.mode = mode;
        self.refresh()
    }

    pub fn toggle_mode(&mut self) -> &[Record] {
        self.set_mode(self.state.mode.toggled())
    }

    pub fn refresh(&mut self) -> &[Record] {
        self.state.results = self.search(&self.state.term, self.state.mode);
        &self.state.results
    }

    /// Waits until the snapshot or the index changes, then re-runs the
    /// current query. Returns `false` once the snapshot source is gone.
    pub async fn updated(&mut self) -> bool {
        let changed = tokio::select! {
            r = self.snapshots.changed() => r.is_ok(),
            r = self.index.changed() => r.is_ok(),
        };
        if changed {
            self.refresh();
        }
        changed
    }

    pub const fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn term(&self) -> &str {
        &self.state.term
    }

    pub const fn mode(&self) -> SearchMode {
        self.state.mode
    }

    pub fn results(&self) -> &[Record] {
        &self.state.results
    }

    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.snapshots.borrow())
    }

    pub fn index_ready(&self) -> bool {
        self.index.borrow().is_some()
    }

    /// Resolves once an index has been published. Returns `false` if the
    /// rebuild task stopped first.
    pub async fn wait_for_index(&self) -> bool {
        let mut updates = self.index.clone();
        updates.wait_for(Option::is_some).await.is_ok()
    }

    /// Receiver that sees every newly published index.
    pub fn index_updates(&self) -> watch::Receiver<PublishedIndex> {
        self.index.clone()
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        self.rebuild_task.abort();
    }
}

async fn rebuild_loop(
    schema: IndexSchema,
    mut snapshots: watch::Receiver<Snapshot>,
    index_tx: watch::Sender<PublishedIndex>,
    debounce: Duration,
) {
    let mut generation = 0u64;
    // the snapshot present at startup needs an index too
    snapshots.mark_changed();

    loop {
        if snapshots.changed().await.is_err() {
            break;
        }

        // a source that closes mid-debounce still gets its last snapshot indexed
        let mut source_open = true;
        while source_open {
            tokio::select! {
                () = tokio::time::sleep(debounce) => break,
                changed = snapshots.changed() => source_open = changed.is_ok(),
            }
        }

        let snapshot = Arc::clone(&snapshots.borrow_and_update());
        if snapshot.is_empty() {
            tracing::debug!("Snapshot is empty, keeping previous index");
            continue;
        }

        generation += 1;
        let started = Instant::now();
        let index = DocumentIndex::from_records(schema.clone(), snapshot.iter())
            .with_generation(generation);
        tracing::info!(
            generation,
            documents = index.len(),
            elapsed = ?started.elapsed(),
            "Rebuilt search index"
        );

        if index_tx.send(Some(Arc::new(index))).is_err() || !source_open {
            break;
        }
    }

    tracing::debug!("Snapshot source closed, stopping index rebuilds");
}

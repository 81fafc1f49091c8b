use crate::{gateway::ApiGateway, models::Meme};
use tokio::sync::Mutex;

/// Number of memes kept in the leaderboard cache.
pub const LEADERBOARD_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum ListState {
    Loading,
    Loaded(Vec<Meme>),
    /// Retryable; holds the inline message.
    Failed(String),
}

/// Which meme the detail dialog targets.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    NoSelection,
    /// Waiting for the list to finish loading.
    Pending { id: String },
    /// Not in the list; the single-meme fetch is in flight.
    Fetching { id: String },
    Resolved(Meme),
    /// The single fetch failed; the whole list is being reloaded.
    Refetching { id: String },
}

#[derive(Debug)]
struct LeaderboardState {
    list: ListState,
    selection: Selection,
    // Bumped on every selection change; results tagged with an older value are dropped.
    generation: u64,
}

impl LeaderboardState {
    fn cached(&self, id: &str) -> Option<Meme> {
        match &self.list {
            ListState::Loaded(memes) => memes.iter().find(|m| m.meme_id == id).cloned(),
            _ => None,
        }
    }
}

/// Loads the ranked meme list and keeps the dialog selection in sync with it.
pub struct Leaderboard {
    gateway: ApiGateway,
    state: Mutex<LeaderboardState>,
}

impl Leaderboard {
    pub fn new(gateway: ApiGateway) -> Self {
        Self {
            gateway,
            state: Mutex::new(LeaderboardState {
                list: ListState::Loading,
                selection: Selection::NoSelection,
                generation: 0,
            }),
        }
    }

    pub async fn list_state(&self) -> ListState {
        self.state.lock().await.list.clone()
    }

    pub async fn selection(&self) -> Selection {
        self.state.lock().await.selection.clone()
    }

    pub async fn memes(&self) -> Vec<Meme> {
        match &self.state.lock().await.list {
            ListState::Loaded(memes) => memes.clone(),
            _ => Vec::new(),
        }
    }

    /// Fetches the list, then resumes a selection that was waiting for it.
    pub async fn load(&self) -> ListState {
        let list = self.fetch_list().await;

        let pending = {
            let state = self.state.lock().await;
            match &state.selection {
                Selection::Pending { id } => Some((id.clone(), state.generation)),
                _ => None,
            }
        };
        if let Some((id, generation)) = pending {
            self.resume(id, generation).await;
        }
        list
    }

    /// Same as `load`; the failed list state offers this as its retry action.
    pub async fn retry(&self) -> ListState {
        self.load().await
    }

    async fn fetch_list(&self) -> ListState {
        tracing::debug!("Loading meme list");
        let response = self.gateway.list_memes().await;
        let next = match response.into_data() {
            Some(data) => {
                let mut memes = data.memes;
                memes.sort_by(|a, b| b.votes.cmp(&a.votes));
                memes.truncate(LEADERBOARD_SIZE);
                tracing::info!("Leaderboard loaded with {} memes", memes.len());
                ListState::Loaded(memes)
            }
            None => {
                tracing::warn!("Failed to load meme list");
                ListState::Failed("Failed to load memes".to_string())
            }
        };
        self.state.lock().await.list = next.clone();
        next
    }

    /// Points the selection at the meme named by the route, or clears it.
    pub async fn select(&self, id: Option<&str>) -> Selection {
        let Some(id) = id else {
            let mut state = self.state.lock().await;
            state.generation += 1;
            state.selection = Selection::NoSelection;
            return Selection::NoSelection;
        };

        let generation = {
            let mut state = self.state.lock().await;
            state.generation += 1;

            if let Some(meme) = state.cached(id) {
                tracing::debug!(meme_id = %id, "Selection resolved from cache");
                state.selection = Selection::Resolved(meme);
                return state.selection.clone();
            }

            if state.list == ListState::Loading {
                // `load` picks this up once the list arrives.
                state.selection = Selection::Pending { id: id.to_string() };
                return state.selection.clone();
            }
            state.selection = Selection::Fetching { id: id.to_string() };
            state.generation
        };

        self.resolve_missing(id, generation).await;
        self.selection().await
    }

    async fn resume(&self, id: String, generation: u64) {
        {
            let mut state = self.state.lock().await;
            let waiting = matches!(&state.selection, Selection::Pending { id: pending } if *pending == id);
            if state.generation != generation || !waiting {
                return;
            }
            if let Some(meme) = state.cached(&id) {
                state.selection = Selection::Resolved(meme);
                return;
            }
            state.selection = Selection::Fetching { id: id.clone() };
        }
        self.resolve_missing(&id, generation).await;
    }

    /// Resolves `id` from the cached list only, without touching the network.
    pub async fn select_cached(&self, id: &str) -> Selection {
        let mut state = self.state.lock().await;
        state.generation += 1;
        state.selection = match state.cached(id) {
            Some(meme) => Selection::Resolved(meme),
            None => Selection::NoSelection,
        };
        state.selection.clone()
    }

    // One single fetch, then at most one list refetch. Never loops.
    async fn resolve_missing(&self, id: &str, generation: u64) {
        tracing::debug!(meme_id = %id, "Meme not in leaderboard, fetching it directly");
        let response = self.gateway.get_meme(id).await;

        {
            let mut state = self.state.lock().await;
            if state.generation != generation {
                tracing::debug!(meme_id = %id, "Discarding stale single-meme result");
                return;
            }
            if let Some(meme) = response.into_data() {
                state.selection = Selection::Resolved(meme);
                return;
            }
            tracing::warn!(meme_id = %id, "Single meme fetch failed, refreshing the list");
            state.selection = Selection::Refetching { id: id.to_string() };
        }

        self.fetch_list().await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            tracing::debug!(meme_id = %id, "Discarding stale refetch result");
            return;
        }
        state.selection = match state.cached(id) {
            Some(meme) => Selection::Resolved(meme),
            None => {
                tracing::debug!(meme_id = %id, "Meme still missing after refetch, closing dialog");
                Selection::NoSelection
            }
        };
    }

    /// Patches a cached entry after a successful vote. The selection is left alone; the open
    /// dialog owns its own vote state.
    pub async fn apply_vote_update(&self, updated: &Meme) {
        let mut state = self.state.lock().await;
        if let ListState::Loaded(memes) = &mut state.list {
            if let Some(slot) = memes.iter_mut().find(|m| m.meme_id == updated.meme_id) {
                *slot = updated.clone();
            }
        }
    }

    /// Drops a deleted meme from the cache and closes it if it was selected.
    pub async fn remove(&self, id: &str) {
        let mut state = self.state.lock().await;
        if let ListState::Loaded(memes) = &mut state.list {
            memes.retain(|m| m.meme_id != id);
        }
        let selected = match &state.selection {
            Selection::Resolved(meme) => meme.meme_id == id,
            Selection::Pending { id: pending }
            | Selection::Fetching { id: pending }
            | Selection::Refetching { id: pending } => pending == id,
            Selection::NoSelection => false,
        };
        if selected {
            state.generation += 1;
            state.selection = Selection::NoSelection;
        }
    }
}

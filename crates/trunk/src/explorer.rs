use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chordstats::StatisticalRecommender;
use harmony::{build_progression_map, ChordId, Key};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::expand::build_candidates;
use crate::node::TrunkNodeId;
use crate::settings::ExplorerSettings;
use crate::state::ExplorerState;
use crate::Result;

/// Owner of one exploration session.
///
/// All mutations go through `&self`: each builds the next snapshot from the
/// current one and publishes it on a watch channel. Rejected mutations log a
/// warning and leave the published snapshot untouched.
pub struct TrunkExplorer {
    recommender: Arc<dyn StatisticalRecommender>,
    settings: ExplorerSettings,
    state: watch::Sender<Arc<ExplorerState>>,
    tickets: AtomicU64,
    /// Latest expansion ticket issued per node.
    pending: Mutex<HashMap<TrunkNodeId, u64>>,
}

impl TrunkExplorer {
    pub fn new(recommender: Arc<dyn StatisticalRecommender>, settings: ExplorerSettings) -> Self {
        let (state, _) = watch::channel(Arc::new(ExplorerState::default()));
        Self {
            recommender,
            settings,
            state,
            tickets: AtomicU64::new(0),
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &ExplorerSettings {
        &self.settings
    }

    /// Current snapshot. Cheap; holds no lock.
    pub fn snapshot(&self) -> Arc<ExplorerState> {
        self.state.borrow().clone()
    }

    /// Receiver that sees every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ExplorerState>> {
        self.state.subscribe()
    }

    /// Start a fresh session in `key`, discarding the previous tree.
    pub fn initialize(&self, key: Key) -> TrunkNodeId {
        let map = build_progression_map(key);
        let mut root = TrunkNodeId(0);
        self.state.send_modify(|current| {
            let (next, id) = current.initialized(map, self.settings.max_trunks);
            root = id;
            *current = Arc::new(next);
        });
        self.lock_pending().clear();

        info!(
            key = %key,
            root = %root,
            heads = self.snapshot().heads().count(),
            "initialized explorer"
        );
        root
    }

    /// Compute and cache candidates for a leaf.
    ///
    /// Returns true if the candidates were committed. A newer expansion of
    /// the same node, or the node being deleted or growing children in the
    /// meantime, discards the result.
    pub async fn expand_node(&self, id: TrunkNodeId) -> bool {
        let snapshot = self.snapshot();
        match snapshot.node(id) {
            None => {
                warn!(node = %id, "cannot expand unknown node");
                return false;
            }
            Some(node) if !node.is_leaf => {
                warn!(node = %id, "cannot expand a node that has children");
                return false;
            }
            Some(_) => {}
        }

        let ticket = self.tickets.fetch_add(1, Ordering::Relaxed) + 1;
        self.lock_pending().insert(id, ticket);

        let Some(candidates) =
            build_candidates(self.recommender.as_ref(), &self.settings, &snapshot, id).await
        else {
            warn!(node = %id, "cannot resolve node chord for expansion");
            return false;
        };

        {
            let mut pending = self.lock_pending();
            if pending.get(&id) != Some(&ticket) {
                debug!(node = %id, ticket, "discarding superseded expansion");
                return false;
            }
            pending.remove(&id);
        }

        self.apply("expand_node", |state| {
            state.with_candidates(id, candidates).map(|next| (next, ()))
        })
        .is_some()
    }

    /// Grow `parent` by one node. Returns the new node's id.
    pub fn select_candidate(&self, parent: TrunkNodeId, chord: &ChordId) -> Option<TrunkNodeId> {
        let max_trunks = self.settings.max_trunks;
        let id = self.apply("select_candidate", |state| {
            state.with_selection(parent, chord, max_trunks)
        })?;
        debug!(parent = %parent, node = %id, chord = %chord, "selected candidate");
        Some(id)
    }

    /// Remove a node and everything under it.
    pub fn delete_node(&self, id: TrunkNodeId) -> bool {
        self.apply("delete_node", |state| {
            state.with_deletion(id).map(|next| (next, ()))
        })
        .is_some()
    }

    pub fn toggle_mute(&self, id: TrunkNodeId) -> bool {
        self.apply("toggle_mute", |state| {
            state.with_mute_toggled(id).map(|next| (next, ()))
        })
        .is_some()
    }

    pub fn enter_practice_mode(&self, leaf: TrunkNodeId) -> bool {
        self.apply("enter_practice_mode", |state| {
            state.with_practice(leaf).map(|next| (next, ()))
        })
        .is_some()
    }

    /// Leave practice mode. Returns false if it was not active.
    pub fn exit_practice_mode(&self) -> bool {
        self.state.send_if_modified(|current| {
            if !current.in_practice_mode() {
                return false;
            }
            *current = Arc::new(current.without_practice());
            true
        })
    }

    /// Chords from the root to the practice leaf, muted nodes skipped.
    /// Empty outside practice mode.
    pub fn practice_path(&self) -> Vec<ChordId> {
        let snapshot = self.snapshot();
        snapshot
            .practice_target()
            .map(|leaf| {
                snapshot
                    .playable_path(leaf)
                    .into_iter()
                    .map(|n| n.chord.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Run one transition against the current snapshot and publish the
    /// result, or log why it was rejected.
    fn apply<T>(
        &self,
        operation: &'static str,
        transition: impl FnOnce(&ExplorerState) -> Result<(ExplorerState, T)>,
    ) -> Option<T> {
        let mut outcome = None;
        self.state.send_if_modified(|current| match transition(&**current) {
            Ok((next, value)) => {
                *current = Arc::new(next);
                outcome = Some(value);
                true
            }
            Err(e) => {
                warn!(operation, error = %e, "rejected explorer mutation");
                false
            }
        });
        outcome
    }

    fn lock_pending(&self) -> MutexGuard<'_, HashMap<TrunkNodeId, u64>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for TrunkExplorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrunkExplorer")
            .field("settings", &self.settings)
            .field("nodes", &self.snapshot().nodes().count())
            .finish_non_exhaustive()
    }
}

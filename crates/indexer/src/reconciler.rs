use crate::state::IncrementalState;
use context_vector_store::QdrantStore;

/// Runs once before the first scan of a process, healing divergence between
/// the vector collection and the persisted state that a crash or an external
/// deletion could have introduced.
pub struct Reconciler<'a> {
    store: &'a QdrantStore,
    collection: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    /// Collection created fresh; any prior `indexed_files` entries are stale.
    CreatedCollection,
    /// Collection was present but empty while state was not: externally wiped.
    WipedExternally,
    /// Collection has points; trust `indexed_files` as-is.
    Trusted,
}

impl<'a> Reconciler<'a> {
    #[must_use]
    pub fn new(store: &'a QdrantStore, collection: &'a str) -> Self {
        Self { store, collection }
    }

    pub async fn reconcile(
        &self,
        state: &mut IncrementalState,
        dim: usize,
    ) -> context_vector_store::Result<ReconcileAction> {
        if !self.store.collection_exists(self.collection).await? {
            self.store.ensure_collection(self.collection, dim).await?;
            state.indexed_files.clear();
            return Ok(ReconcileAction::CreatedCollection);
        }

        let point_count = self.store.point_count(self.collection).await?;
        if point_count == 0 && !state.indexed_files.is_empty() {
            log::warn!(
                "reconciler: collection {} has 0 points but state tracks {} indexed files; \
                 a prior collection was likely deleted externally, re-ingesting everything",
                self.collection,
                state.indexed_files.len()
            );
            state.indexed_files.clear();
            return Ok(ReconcileAction::WipedExternally);
        }

        Ok(ReconcileAction::Trusted)
    }
}

//! Link expansion — one-hop transitive closure.
//!
//! When A is linked to B and B to C, the portal shows C as related to A.
//! Rather than computing that view on every read, expansion materializes
//! the edge A–C once. It is deliberately limited to one hop: secondary
//! neighbors are linked, their neighbors are not, which keeps the closure
//! from growing without bound.
//!
//! Expansion is idempotent — once the closure is complete, re-running it
//! creates nothing.

use crate::records::models::EntityRef;
use crate::records::traits::RecordStore;
use crate::relations::models::Relationship;
use anyhow::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Materializes one-hop transitive links for an entity.
pub struct ExpansionEngine {
    store: Arc<dyn RecordStore>,
}

impl ExpansionEngine {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Expand `origin`'s links: for every record C linked to a direct
    /// neighbor B of `origin` (C ≠ origin, C not already linked), create
    /// the edge origin–C. Returns the number of edges created.
    ///
    /// Structural edges carry no creator and no metadata. Existence is
    /// re-checked against the store immediately before each create; the
    /// store's uniqueness constraint remains the authoritative backstop
    /// against concurrent expansion runs.
    pub async fn expand(&self, origin: EntityRef) -> Result<usize> {
        let direct_edges = self.store.relations_for(&origin).await?;
        let neighbors: Vec<EntityRef> = direct_edges
            .iter()
            .filter_map(|e| e.other_side(&origin))
            .collect();
        let existing: HashSet<EntityRef> = neighbors.iter().copied().collect();

        let mut seen: HashSet<EntityRef> = HashSet::new();
        let mut created = 0usize;

        for neighbor in &neighbors {
            let secondary_edges = self.store.relations_for(neighbor).await?;
            for edge in &secondary_edges {
                let Some(candidate) = edge.other_side(neighbor) else {
                    continue;
                };
                if candidate == origin {
                    continue;
                }
                if existing.contains(&candidate) {
                    continue;
                }
                if !seen.insert(candidate) {
                    continue;
                }
                // Re-validate right before creating: another request may
                // have linked the pair since we loaded the neighbor set.
                if self.store.relation_exists(&origin, &candidate).await? {
                    continue;
                }
                if self
                    .store
                    .create_relation(&Relationship::structural(origin, candidate))
                    .await?
                {
                    debug!(origin = %origin, linked = %candidate, via = %neighbor, "expanded link");
                    created += 1;
                }
            }
        }
        Ok(created)
    }
}

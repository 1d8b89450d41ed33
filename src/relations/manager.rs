//! Relationship manager — linking, unlinking, and the loader/partitioner.
//!
//! `RelationManager` is the write path for user-initiated links and the
//! read path for the "linked vs. available" record pickers. Both sides of
//! every edge lookup go through [`Relationship::other_side`], so
//! orientation never leaks into call sites.

use crate::error::PortalError;
use crate::records::models::{EntityKind, EntityRef, PortalRecord};
use crate::records::traits::RecordStore;
use crate::relations::models::{RelatedPartition, Relationship};
use anyhow::Result;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// The acting user, as this subsystem sees them: an id plus the
/// permission strings the caller's auth layer already evaluated.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub user_id: Uuid,
    pub permissions: Vec<String>,
}

impl Viewer {
    pub fn new(user_id: Uuid, permissions: Vec<String>) -> Self {
        Self {
            user_id,
            permissions,
        }
    }

    pub fn has(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Result of a link attempt. A duplicate link is a successful no-op,
/// never an error surfaced to the user.
#[derive(Debug, Clone)]
pub enum LinkOutcome {
    /// A new edge was persisted.
    Created(Relationship),
    /// An edge between the unordered pair already existed.
    Ignored,
}

impl LinkOutcome {
    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Manager for relationship edges.
pub struct RelationManager {
    store: Arc<dyn RecordStore>,
}

impl RelationManager {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Link two records.
    ///
    /// Both endpoints must exist. Linking an already-linked pair (in
    /// either orientation) returns [`LinkOutcome::Ignored`]; the store's
    /// uniqueness constraint is the backstop for the race where two
    /// requests link the same pair simultaneously.
    pub async fn link(
        &self,
        a: EntityRef,
        b: EntityRef,
        created_by: Option<Uuid>,
        metadata: Option<serde_json::Value>,
    ) -> Result<LinkOutcome> {
        if a == b {
            return Err(
                PortalError::ValidationFailed(format!("cannot link {} to itself", a)).into(),
            );
        }
        for endpoint in [&a, &b] {
            if self.store.get_record(endpoint).await?.is_none() {
                return Err(PortalError::NotFound(endpoint.to_string()).into());
            }
        }

        if self.store.relation_exists(&a, &b).await? {
            return Ok(LinkOutcome::Ignored);
        }

        let edge = Relationship::new(a, b, created_by, metadata);
        if self.store.create_relation(&edge).await? {
            Ok(LinkOutcome::Created(edge))
        } else {
            // Lost the race against a concurrent identical link.
            Ok(LinkOutcome::Ignored)
        }
    }

    /// Remove the edge between two records, if any.
    pub async fn unlink(&self, a: EntityRef, b: EntityRef) -> Result<()> {
        self.store.delete_relation_pair(&a, &b).await
    }

    /// Loader/partitioner: for each requested related kind, the records
    /// already linked to `entity` and the records still eligible to link.
    ///
    /// `available` is permission-filtered through `viewer`; `linked` is
    /// not (an existing link is already visible context). Edges whose
    /// far record no longer exists are dropped silently — they are stale
    /// leftovers of out-of-band deletes, not an error.
    pub async fn load_partitions(
        &self,
        entity: EntityRef,
        related_kinds: &[EntityKind],
        viewer: &Viewer,
    ) -> Result<HashMap<EntityKind, RelatedPartition>> {
        if self.store.get_record(&entity).await?.is_none() {
            return Err(PortalError::NotFound(entity.to_string()).into());
        }

        let edges = self.store.relations_for(&entity).await?;
        let neighbors: Vec<EntityRef> = edges
            .iter()
            .filter_map(|e| e.other_side(&entity))
            .collect();

        let mut partitions = HashMap::new();
        for &kind in related_kinds {
            let mut linked = Vec::new();
            let mut linked_ids = HashSet::new();
            for neighbor in neighbors.iter().filter(|n| n.kind == kind) {
                match self.store.get_record(neighbor).await? {
                    Some(record) => {
                        linked_ids.insert(neighbor.id);
                        linked.push(record);
                    }
                    None => {
                        debug!(entity = %entity, dangling = %neighbor, "dropping dangling edge");
                    }
                }
            }

            let available = self
                .store
                .list_records(kind)
                .await?
                .into_iter()
                .filter(|r| r.entity_ref() != entity)
                .filter(|r| !linked_ids.contains(&r.id()))
                .filter(|r| record_visible(r, viewer))
                .collect();

            partitions.insert(kind, RelatedPartition { linked, available });
        }
        Ok(partitions)
    }
}

/// Per-kind visibility rule for `available` lists.
///
/// Permission evaluation itself happens outside this crate; these rules
/// only decide which records a viewer may be offered for linking.
pub fn record_visible(record: &PortalRecord, viewer: &Viewer) -> bool {
    match record {
        PortalRecord::Reimbursement(r) => {
            viewer.has("treasury.manage") || r.purchaser_id == Some(viewer.user_id)
        }
        PortalRecord::Submission(s) => {
            viewer.has("submissions.manage") || s.submitter_id == Some(viewer.user_id)
        }
        PortalRecord::Mail(_) => viewer.has("mail.read"),
        PortalRecord::Receipt(_)
        | PortalRecord::Transaction(_)
        | PortalRecord::Budget(_)
        | PortalRecord::Inventory(_)
        | PortalRecord::Minute(_)
        | PortalRecord::News(_)
        | PortalRecord::Faq(_)
        | PortalRecord::Poll(_)
        | PortalRecord::Social(_)
        | PortalRecord::Event(_) => true,
    }
}

//! RecordStore trait definition
//!
//! Abstract interface over the portal's record storage and its
//! relationship primitives. The engine only ever talks to storage through
//! `Arc<dyn RecordStore>`, which keeps it testable against the in-memory
//! implementation and lets the real backend live elsewhere.

use crate::records::models::{EntityKind, EntityRef, PortalRecord, UserProfile};
use crate::relations::models::Relationship;
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Abstract interface for record storage and relationship persistence.
///
/// Implementations must uphold two storage-level guarantees the engine
/// relies on (spelled out because they are referential-integrity
/// concerns, not application logic):
///
/// - **Unordered-pair uniqueness**: at most one edge may exist between a
///   given pair of records, regardless of which side was stored as A.
///   [`create_relation`](Self::create_relation) is the final guard — a
///   duplicate create is a no-op, never an error.
/// - **Cascade delete**: deleting a record deletes every edge that
///   references it on either side.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // ========================================================================
    // Record operations
    // ========================================================================

    /// Fetch a record by graph identity. `None` if it does not exist.
    async fn get_record(&self, entity: &EntityRef) -> Result<Option<PortalRecord>>;

    /// List all records of one kind, oldest first.
    async fn list_records(&self, kind: EntityKind) -> Result<Vec<PortalRecord>>;

    /// Persist a new record. Fails if a record with the same identity
    /// already exists.
    async fn create_record(&self, record: &PortalRecord) -> Result<()>;

    /// Replace an existing record. Fails if it does not exist.
    async fn update_record(&self, record: &PortalRecord) -> Result<()>;

    /// Delete a record. Cascades to every edge referencing it.
    async fn delete_record(&self, entity: &EntityRef) -> Result<()>;

    // ========================================================================
    // User profiles
    // ========================================================================

    /// Look up the acting user's profile (drives purchaser autofill).
    async fn get_user_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>>;

    // ========================================================================
    // Relationship primitives
    // ========================================================================

    /// Persist an edge. Returns `true` if the edge was created, `false`
    /// if an edge between the same unordered pair already existed (the
    /// duplicate create is silently ignored).
    ///
    /// Self-loops are rejected with a validation error.
    async fn create_relation(&self, edge: &Relationship) -> Result<bool>;

    /// Whether an edge exists between `x` and `y`, in either orientation.
    async fn relation_exists(&self, x: &EntityRef, y: &EntityRef) -> Result<bool>;

    /// All edges touching `entity` on either side, in creation order.
    async fn relations_for(&self, entity: &EntityRef) -> Result<Vec<Relationship>>;

    /// Delete the edge between `x` and `y` (either orientation), if any.
    async fn delete_relation_pair(&self, x: &EntityRef, y: &EntityRef) -> Result<()>;
}

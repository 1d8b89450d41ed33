//! In-memory implementation of `RecordStore`.
//!
//! Backs every record kind and the edge table with
//! `tokio::sync::RwLock` collections. This is the reference store the
//! test suite runs against, and it enforces the same two constraints the
//! production storage layer enforces with a unique index and
//! `ON DELETE CASCADE`: unordered-pair uniqueness and cascade delete.

use crate::records::models::{EntityKind, EntityRef, PortalRecord, UserProfile};
use crate::records::traits::RecordStore;
use crate::relations::models::Relationship;
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory `RecordStore`.
///
/// Fields are public so tests can seed or inspect state directly, the
/// same way the portal's other in-memory collaborators work.
#[derive(Default)]
pub struct MemoryStore {
    pub records: RwLock<HashMap<EntityRef, PortalRecord>>,
    pub users: RwLock<HashMap<Uuid, UserProfile>>,
    /// Edge table, in creation order.
    pub relations: RwLock<Vec<Relationship>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user profile (convenience for tests and local setups).
    pub async fn put_user(&self, profile: UserProfile) {
        self.users.write().await.insert(profile.id, profile);
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get_record(&self, entity: &EntityRef) -> Result<Option<PortalRecord>> {
        Ok(self.records.read().await.get(entity).cloned())
    }

    async fn list_records(&self, kind: EntityKind) -> Result<Vec<PortalRecord>> {
        let records = self.records.read().await;
        let mut matching: Vec<PortalRecord> = records
            .values()
            .filter(|r| r.kind() == kind)
            .cloned()
            .collect();
        // HashMap iteration order is arbitrary; callers expect oldest first.
        matching.sort_by_key(|r| (r.created_at(), r.id()));
        Ok(matching)
    }

    async fn create_record(&self, record: &PortalRecord) -> Result<()> {
        let key = record.entity_ref();
        let mut records = self.records.write().await;
        if records.contains_key(&key) {
            bail!("record {} already exists", key);
        }
        records.insert(key, record.clone());
        Ok(())
    }

    async fn update_record(&self, record: &PortalRecord) -> Result<()> {
        let key = record.entity_ref();
        let mut records = self.records.write().await;
        if !records.contains_key(&key) {
            bail!("record {} does not exist", key);
        }
        records.insert(key, record.clone());
        Ok(())
    }

    async fn delete_record(&self, entity: &EntityRef) -> Result<()> {
        self.records.write().await.remove(entity);
        // Cascade: drop every edge referencing the deleted record.
        self.relations.write().await.retain(|e| !e.touches(entity));
        Ok(())
    }

    async fn get_user_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn create_relation(&self, edge: &Relationship) -> Result<bool> {
        let (a, b) = (edge.a(), edge.b());
        if a == b {
            bail!("self-loop rejected: {}", a);
        }
        let mut relations = self.relations.write().await;
        if relations.iter().any(|e| e.connects(&a, &b)) {
            return Ok(false);
        }
        relations.push(edge.clone());
        Ok(true)
    }

    async fn relation_exists(&self, x: &EntityRef, y: &EntityRef) -> Result<bool> {
        Ok(self
            .relations
            .read()
            .await
            .iter()
            .any(|e| e.connects(x, y)))
    }

    async fn relations_for(&self, entity: &EntityRef) -> Result<Vec<Relationship>> {
        Ok(self
            .relations
            .read()
            .await
            .iter()
            .filter(|e| e.touches(entity))
            .cloned()
            .collect())
    }

    async fn delete_relation_pair(&self, x: &EntityRef, y: &EntityRef) -> Result<()> {
        self.relations.write().await.retain(|e| !e.connects(x, y));
        Ok(())
    }
}

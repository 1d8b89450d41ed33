//! Relationship edge model.
//!
//! An edge is a stored, *logically undirected* link between two typed
//! records. It is persisted with an A side and a B side, but every lookup
//! must treat the pair as unordered: [`Relationship::other_side`] is the
//! single place that resolves orientation, so call sites never hand-roll
//! the A/B check.
//!
//! The serialized field names (`relationAType`, `relationId`,
//! `relationBType`, `relationBId`, …) match the persisted edge schema the
//! portal frontend already consumes — note that the A-side id serializes
//! as `relationId`, not `relationAId`.

use crate::records::models::{EntityKind, EntityRef, PortalRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored edge between two records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub id: Uuid,
    #[serde(rename = "relationAType")]
    pub a_kind: EntityKind,
    #[serde(rename = "relationId")]
    pub a_id: Uuid,
    #[serde(rename = "relationBType")]
    pub b_kind: EntityKind,
    #[serde(rename = "relationBId")]
    pub b_id: Uuid,
    /// Free-form edge metadata (e.g. [`RelationMetadata`] for
    /// analyzer-created edges). `None` for plain user links and for
    /// structural edges created by expansion.
    pub metadata: Option<serde_json::Value>,
    #[serde(rename = "createdBy")]
    pub created_by: Option<Uuid>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Relationship {
    /// Create a new edge between `a` and `b`.
    pub fn new(
        a: EntityRef,
        b: EntityRef,
        created_by: Option<Uuid>,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            a_kind: a.kind,
            a_id: a.id,
            b_kind: b.kind,
            b_id: b.id,
            metadata,
            created_by,
            created_at: Utc::now(),
        }
    }

    /// Create a structural edge, as materialized by link expansion.
    /// Carries no creator and no metadata: it records topology, not intent.
    pub fn structural(a: EntityRef, b: EntityRef) -> Self {
        Self::new(a, b, None, None)
    }

    /// The A side as a graph identity.
    pub fn a(&self) -> EntityRef {
        EntityRef::new(self.a_kind, self.a_id)
    }

    /// The B side as a graph identity.
    pub fn b(&self) -> EntityRef {
        EntityRef::new(self.b_kind, self.b_id)
    }

    /// Whether this edge references `entity` on either side.
    pub fn touches(&self, entity: &EntityRef) -> bool {
        self.a() == *entity || self.b() == *entity
    }

    /// Resolve the side of this edge that is *not* `known`.
    ///
    /// Returns `None` if `known` is on neither side — for a correctly
    /// loaded edge set that indicates a caller bug, so callers usually
    /// `filter_map` over it.
    pub fn other_side(&self, known: &EntityRef) -> Option<EntityRef> {
        if self.a() == *known {
            Some(self.b())
        } else if self.b() == *known {
            Some(self.a())
        } else {
            None
        }
    }

    /// Whether this edge connects the unordered pair `(x, y)`.
    pub fn connects(&self, x: &EntityRef, y: &EntityRef) -> bool {
        (self.a() == *x && self.b() == *y) || (self.a() == *y && self.b() == *x)
    }
}

/// Metadata attached to edges created by the draft analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationMetadata {
    pub ai_created: bool,
    pub confidence: f64,
    pub reasoning: String,
}

impl RelationMetadata {
    /// Serialize into the edge's JSON metadata blob.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("relation metadata serializes")
    }

    /// Parse from an edge's metadata blob, if present and well-formed.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

/// The loader's per-kind output: records already linked to the entity,
/// and records of that kind still eligible to link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelatedPartition {
    pub linked: Vec<PortalRecord>,
    pub available: Vec<PortalRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::models::EntityKind;

    fn refs() -> (EntityRef, EntityRef) {
        (
            EntityRef::new(EntityKind::Receipt, Uuid::new_v4()),
            EntityRef::new(EntityKind::Transaction, Uuid::new_v4()),
        )
    }

    #[test]
    fn test_other_side_resolves_both_orientations() {
        let (a, b) = refs();
        let edge = Relationship::new(a, b, None, None);
        assert_eq!(edge.other_side(&a), Some(b));
        assert_eq!(edge.other_side(&b), Some(a));

        let stranger = EntityRef::new(EntityKind::Poll, Uuid::new_v4());
        assert_eq!(edge.other_side(&stranger), None);
    }

    #[test]
    fn test_connects_is_unordered() {
        let (a, b) = refs();
        let edge = Relationship::new(a, b, None, None);
        assert!(edge.connects(&a, &b));
        assert!(edge.connects(&b, &a));
        assert!(edge.touches(&a));
        assert!(edge.touches(&b));
    }

    #[test]
    fn test_structural_edge_has_no_provenance() {
        let (a, b) = refs();
        let edge = Relationship::structural(a, b);
        assert!(edge.created_by.is_none());
        assert!(edge.metadata.is_none());
    }

    #[test]
    fn test_persisted_schema_field_names() {
        let (a, b) = refs();
        let edge = Relationship::new(a, b, Some(Uuid::new_v4()), None);
        let value = serde_json::to_value(&edge).unwrap();

        assert_eq!(value["relationAType"], "receipt");
        assert_eq!(value["relationBType"], "transaction");
        // Compat quirk: the A-side id is persisted as `relationId`.
        assert_eq!(value["relationId"], a.id.to_string());
        assert_eq!(value["relationBId"], b.id.to_string());
        assert!(value.get("relationAId").is_none());
        assert!(value.get("createdBy").is_some());
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn test_relation_metadata_round_trip() {
        let meta = RelationMetadata {
            ai_created: true,
            confidence: 0.82,
            reasoning: "Receipt totals match the reimbursement".to_string(),
        };
        let value = meta.to_value();
        let back = RelationMetadata::from_value(&value).unwrap();
        assert!(back.ai_created);
        assert!((back.confidence - 0.82).abs() < f64::EPSILON);

        assert!(RelationMetadata::from_value(&serde_json::json!("not an object")).is_none());
    }
}

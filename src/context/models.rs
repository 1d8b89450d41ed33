//! Relationship context models.
//!
//! The context is a derived, read-only projection: the "best known
//! value" view of an entity, computed from its linked records. It is
//! recomputed on every read and never persisted, so it always reflects
//! the live edge set and live record fields.

use crate::records::models::{EntityKind, LineItem};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Which linked kind supplied the context's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ValueSource {
    /// A linked record of this kind is authoritative.
    Entity(EntityKind),
    /// The entity's own, hand-entered values stand.
    Manual,
    /// Nothing value-bearing is linked.
    Unknown,
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity(kind) => write!(f, "{}", kind),
            Self::Manual => write!(f, "manual"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl From<ValueSource> for String {
    fn from(source: ValueSource) -> Self {
        source.to_string()
    }
}

impl TryFrom<String> for ValueSource {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "manual" => Ok(Self::Manual),
            "unknown" => Ok(Self::Unknown),
            other => other.parse::<EntityKind>().map(Self::Entity),
        }
    }
}

/// The merged "best value" view over an entity's linked records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipContext {
    pub total_amount: Option<f64>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub currency: Option<String>,
    pub category: Option<String>,
    pub purchaser_id: Option<Uuid>,
    pub line_items: Vec<LineItem>,
    pub value_source: ValueSource,
    /// Ids of every related record, across all kinds.
    pub linked_entity_ids: HashSet<Uuid>,
}

impl Default for RelationshipContext {
    fn default() -> Self {
        Self {
            total_amount: None,
            description: None,
            date: None,
            currency: None,
            category: None,
            purchaser_id: None,
            line_items: Vec::new(),
            value_source: ValueSource::Unknown,
            linked_entity_ids: HashSet::new(),
        }
    }
}

/// One field where the entity's own stored value disagrees with the
/// resolved context value. Reported, never auto-corrected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Divergence {
    pub field: String,
    pub own: String,
    pub resolved: String,
}

/// Caller-facing verdict on an entity's context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextStatus {
    /// No value-bearing record linked; nothing to compare against.
    Unknown,
    /// Own values agree with the resolved context.
    Aligned,
    /// At least one field disagrees; reconciliation is up to a human.
    Diverged,
}

/// Resolved context plus the divergence check against the entity's own
/// stored values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextReport {
    pub context: RelationshipContext,
    pub divergences: Vec<Divergence>,
    pub status: ContextStatus,
}

//! Context resolver — value dominance across linked records.
//!
//! When several linked records carry the same shared field (amount,
//! description, date, …) and disagree, exactly one kind wins, decided by
//! [`VALUE_PRECEDENCE`]. Receipts always win: a receipt is a pure value
//! *source* (the paper trail), never a consumer. The other value-bearing
//! kinds are consumers first and fall-back sources second.
//!
//! Divergence between an entity's own stored values and the resolved
//! context is detected and reported, never auto-corrected; only empty
//! fields are ever filled (by the autofill orchestrator), populated ones
//! are surfaced as a mismatch for human reconciliation.

use crate::context::models::{
    ContextReport, ContextStatus, Divergence, RelationshipContext, ValueSource,
};
use crate::error::PortalError;
use crate::records::models::{EntityKind, EntityRef, PortalRecord};
use crate::records::traits::RecordStore;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Fixed precedence order among value-bearing kinds. Walked front to
/// back; the first kind with a populated linked record supplies the
/// context values.
pub const VALUE_PRECEDENCE: [EntityKind; 5] = [
    EntityKind::Receipt,
    EntityKind::Reimbursement,
    EntityKind::Transaction,
    EntityKind::Budget,
    EntityKind::Inventory,
];

/// Tuning for divergence detection.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Amounts closer than this are considered equal (currency rounding).
    pub divergence_epsilon: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            divergence_epsilon: 0.01,
        }
    }
}

/// Computes the relationship context of an entity on demand.
pub struct ContextResolver {
    store: Arc<dyn RecordStore>,
    config: ResolverConfig,
}

impl ContextResolver {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            config: ResolverConfig::default(),
        }
    }

    pub fn with_config(store: Arc<dyn RecordStore>, config: ResolverConfig) -> Self {
        Self { store, config }
    }

    /// Resolve the context of `entity` from its current linked set.
    ///
    /// Computed fresh on every call — the context is never cached, so it
    /// always reflects live edges and live record fields.
    pub async fn resolve(&self, entity: EntityRef) -> Result<RelationshipContext> {
        if self.store.get_record(&entity).await?.is_none() {
            return Err(PortalError::NotFound(entity.to_string()).into());
        }

        let edges = self.store.relations_for(&entity).await?;
        let neighbors: Vec<EntityRef> = edges
            .iter()
            .filter_map(|e| e.other_side(&entity))
            .collect();

        let mut ctx = RelationshipContext {
            linked_entity_ids: neighbors.iter().map(|n| n.id).collect(),
            ..Default::default()
        };

        // Load the linked records of each value-bearing kind, keeping
        // edge-creation order within a kind. Dangling edges are skipped.
        let mut by_kind: HashMap<EntityKind, Vec<PortalRecord>> = HashMap::new();
        for neighbor in &neighbors {
            if !VALUE_PRECEDENCE.contains(&neighbor.kind) {
                continue;
            }
            if let Some(record) = self.store.get_record(neighbor).await? {
                by_kind.entry(neighbor.kind).or_default().push(record);
            }
        }

        for kind in VALUE_PRECEDENCE {
            let source = by_kind
                .get(&kind)
                .and_then(|records| records.iter().find(|r| r.has_monetary_value()));
            if let Some(record) = source {
                ctx.total_amount = effective_amount(record);
                ctx.description = record.description().map(str::to_string);
                ctx.date = record.value_date();
                ctx.currency = record.currency().map(str::to_string);
                ctx.category = record.category().map(str::to_string);
                ctx.line_items = record.line_items().to_vec();
                ctx.value_source = ValueSource::Entity(kind);
                break;
            }
        }

        // Only reimbursements carry a purchaser; take the first one
        // linked regardless of which kind won the value precedence.
        if let Some(reimbursements) = by_kind.get(&EntityKind::Reimbursement) {
            ctx.purchaser_id = reimbursements.iter().find_map(|r| r.purchaser_id());
        }

        Ok(ctx)
    }

    /// Compare an entity's own stored values against a resolved context.
    ///
    /// A field diverges only when both sides carry a value and they
    /// disagree (beyond `divergence_epsilon` for amounts). Empty own
    /// fields never diverge — they are autofill candidates instead.
    pub fn divergences(
        &self,
        record: &PortalRecord,
        ctx: &RelationshipContext,
    ) -> Vec<Divergence> {
        let mut out = Vec::new();

        if let (Some(own), Some(resolved)) = (record.amount(), ctx.total_amount) {
            if (own - resolved).abs() > self.config.divergence_epsilon {
                out.push(Divergence {
                    field: "amount".to_string(),
                    own: format!("{:.2}", own),
                    resolved: format!("{:.2}", resolved),
                });
            }
        }
        if let (Some(own), Some(resolved)) = (record.description(), ctx.description.as_deref()) {
            if !own.trim().eq_ignore_ascii_case(resolved.trim()) {
                out.push(Divergence {
                    field: "description".to_string(),
                    own: own.to_string(),
                    resolved: resolved.to_string(),
                });
            }
        }
        if let (Some(own), Some(resolved)) = (record.value_date(), ctx.date) {
            if own != resolved {
                out.push(Divergence {
                    field: "date".to_string(),
                    own: own.to_string(),
                    resolved: resolved.to_string(),
                });
            }
        }
        if let (Some(own), Some(resolved)) = (record.category(), ctx.category.as_deref()) {
            if !own.trim().eq_ignore_ascii_case(resolved.trim()) {
                out.push(Divergence {
                    field: "category".to_string(),
                    own: own.to_string(),
                    resolved: resolved.to_string(),
                });
            }
        }
        out
    }

    /// Resolve the context and run the divergence check in one call.
    pub async fn report(&self, entity: EntityRef) -> Result<ContextReport> {
        let record = self
            .store
            .get_record(&entity)
            .await?
            .ok_or_else(|| PortalError::NotFound(entity.to_string()))?;
        let context = self.resolve(entity).await?;
        let divergences = self.divergences(&record, &context);
        let status = if context.value_source == ValueSource::Unknown {
            ContextStatus::Unknown
        } else if divergences.is_empty() {
            ContextStatus::Aligned
        } else {
            ContextStatus::Diverged
        };
        Ok(ContextReport {
            context,
            divergences,
            status,
        })
    }
}

/// A record's amount, falling back to the sum of its line items when the
/// total itself was not extracted.
fn effective_amount(record: &PortalRecord) -> Option<f64> {
    record.amount().or_else(|| {
        let items = record.line_items();
        if items.is_empty() {
            None
        } else {
            Some(items.iter().map(|i| i.total_price).sum())
        }
    })
}

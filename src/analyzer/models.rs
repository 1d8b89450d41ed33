//! Draft analyzer models.

use crate::records::models::{EntityKind, EntityRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One proposed related entity, as returned by the generative capability
/// (or synthesized by a deterministic rule).
///
/// The wire format uses camelCase keys (`entityType`, …) — the same
/// contract the prompt spells out to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedEntity {
    pub entity_type: EntityKind,
    pub name: String,
    /// Kind-specific payload (amount, date, quantity, …). Only the
    /// fields the target kind requires are read; the rest is ignored.
    #[serde(default)]
    pub data: serde_json::Value,
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
}

/// Overall verdict of an analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisOutcome {
    /// Everything that was proposed was created.
    Success,
    /// Some drafts were created, but the run also hit errors.
    Partial,
    /// The analysis itself failed and nothing was created.
    Failed,
}

/// Result of one analyzer run: what was created, what failed, and
/// whether the analysis step itself succeeded.
///
/// `success` reflects the *top-level* analysis only — an unreachable or
/// unparseable generator flips it to `false`. Individual suggestion
/// failures land in `errors` without touching `success`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub source: EntityRef,
    pub started_at: DateTime<Utc>,
    pub success: bool,
    /// Total suggestions proposed, before confidence gating.
    pub suggestions_considered: usize,
    /// Drafts created and linked back to the source.
    pub created: Vec<EntityRef>,
    pub errors: Vec<String>,
}

impl AnalysisReport {
    pub fn new(source: EntityRef) -> Self {
        Self {
            source,
            started_at: Utc::now(),
            success: true,
            suggestions_considered: 0,
            created: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Derive the run's completion state.
    pub fn outcome(&self) -> AnalysisOutcome {
        if !self.success && self.created.is_empty() {
            AnalysisOutcome::Failed
        } else if !self.success || !self.errors.is_empty() {
            AnalysisOutcome::Partial
        } else {
            AnalysisOutcome::Success
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn report() -> AnalysisReport {
        AnalysisReport::new(EntityRef::new(EntityKind::Reimbursement, Uuid::new_v4()))
    }

    #[test]
    fn test_outcome_success() {
        let mut r = report();
        r.created
            .push(EntityRef::new(EntityKind::Transaction, Uuid::new_v4()));
        assert_eq!(r.outcome(), AnalysisOutcome::Success);
    }

    #[test]
    fn test_outcome_partial_on_suggestion_errors() {
        let mut r = report();
        r.created
            .push(EntityRef::new(EntityKind::Transaction, Uuid::new_v4()));
        r.errors.push("inventory 'Drill': boom".to_string());
        assert!(r.success);
        assert_eq!(r.outcome(), AnalysisOutcome::Partial);
    }

    #[test]
    fn test_outcome_partial_when_ai_failed_but_drafts_created() {
        let mut r = report();
        r.success = false;
        r.created
            .push(EntityRef::new(EntityKind::Transaction, Uuid::new_v4()));
        assert_eq!(r.outcome(), AnalysisOutcome::Partial);
    }

    #[test]
    fn test_outcome_failed_when_nothing_created() {
        let mut r = report();
        r.success = false;
        assert_eq!(r.outcome(), AnalysisOutcome::Failed);
    }

    #[test]
    fn test_suggested_entity_camel_case_wire_format() {
        let json = r#"{
            "entityType": "inventory",
            "name": "Cordless drill",
            "data": { "purchase_price": 84.9 },
            "confidence": 0.82,
            "reasoning": "Durable good on the receipt"
        }"#;
        let s: SuggestedEntity = serde_json::from_str(json).unwrap();
        assert_eq!(s.entity_type, EntityKind::Inventory);
        assert_eq!(s.name, "Cordless drill");
        assert!((s.confidence - 0.82).abs() < f64::EPSILON);
    }
}

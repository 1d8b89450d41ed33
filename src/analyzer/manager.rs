//! Draft-entity analyzer.
//!
//! Looks at one source record and proposes *new* related records. Every
//! accepted proposal is created in `draft` status and immediately linked
//! back to the source with `ai_created` edge metadata, so nothing the
//! analyzer produces is treated as authoritative until a human confirms
//! it.
//!
//! Two kinds of rules feed the proposal list:
//! - deterministic rules, which need no model (a reimbursement without an
//!   expense transaction always gets one proposed)
//! - the generative capability, whose whole batch is accepted or
//!   rejected atomically by the parse step
//!
//! A failing generator degrades the run, it never aborts it: the
//! deterministic proposals still become drafts and the report carries
//! the error.

use crate::ai::traits::TextGenerator;
use crate::analyzer::models::{AnalysisReport, SuggestedEntity};
use crate::analyzer::parse::parse_suggestion_batch;
use crate::analyzer::prompts::{analysis_prompt, SourceDigest};
use crate::error::PortalError;
use crate::records::models::{
    Budget, CommitteeEvent, EntityKind, EntityRef, FaqEntry, InventoryItem, MailThread, Minute,
    NewsItem, Poll, PortalRecord, Receipt, RecordStatus, Reimbursement, SocialPost, Submission,
    Transaction, TransactionDirection,
};
use crate::records::traits::RecordStore;
use crate::relations::models::{RelationMetadata, Relationship};
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Confidence of the rule-based "reimbursement needs an expense
/// transaction" proposal. Not AI-gated: the rule is unconditional.
pub const TRANSACTION_SUGGESTION_CONFIDENCE: f64 = 0.95;

/// Confidence of rule-based inventory proposals from receipt line items.
const INVENTORY_SUGGESTION_CONFIDENCE: f64 = 0.85;

/// Keywords marking a receipt line as a durable good. Consumables never
/// become inventory, whatever their price.
const DURABLE_KEYWORDS: &[&str] = &[
    "drill",
    "ladder",
    "printer",
    "projector",
    "beamer",
    "speaker",
    "grill",
    "tent",
    "table",
    "chair",
    "bench",
    "shelf",
    "cabinet",
    "tool",
    "machine",
    "kettle",
    "heater",
];

/// Tuning for the analyzer.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Suggestions below this confidence are discarded.
    pub confidence_threshold: f64,
    /// Minimum line price before a durable good becomes an inventory
    /// proposal.
    pub durable_min_price: f64,
    /// Model name handed to the generator.
    pub model: String,
    /// Hard bound on each generate call.
    pub ai_timeout_secs: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            durable_min_price: 50.0,
            model: "llama3.1:8b".to_string(),
            ai_timeout_secs: 30,
        }
    }
}

/// Analyzes a source record and creates draft related records.
pub struct DraftAnalyzer {
    store: Arc<dyn RecordStore>,
    generator: Option<Arc<dyn TextGenerator>>,
    config: AnalyzerConfig,
}

impl DraftAnalyzer {
    pub fn new(
        store: Arc<dyn RecordStore>,
        generator: Option<Arc<dyn TextGenerator>>,
        config: AnalyzerConfig,
    ) -> Self {
        Self {
            store,
            generator,
            config,
        }
    }

    /// Run one analysis for `source`, acting as `user_id`.
    ///
    /// Fails fast when the source record is missing or its kind-specific
    /// precondition is unmet (a receipt must be OCR-processed first).
    /// Everything after that is collected into the report: per-suggestion
    /// creation failures land in `errors`, and a failing generator flips
    /// `success` without discarding the deterministic proposals.
    pub async fn analyze(&self, source: EntityRef, user_id: Uuid) -> Result<AnalysisReport> {
        let record = self
            .store
            .get_record(&source)
            .await?
            .ok_or_else(|| PortalError::NotFound(source.to_string()))?;

        if let PortalRecord::Receipt(receipt) = &record {
            if !receipt.ocr_processed {
                return Err(PortalError::ValidationFailed(format!(
                    "receipt {} has not been OCR-processed yet",
                    source
                ))
                .into());
            }
        }

        let mut report = AnalysisReport::new(source);
        let mut suggestions = self.deterministic_suggestions(&source, &record).await?;

        if let Some(generator) = &self.generator {
            let prompt = analysis_prompt(&SourceDigest::from_record(&record));
            let generated = tokio::time::timeout(
                Duration::from_secs(self.config.ai_timeout_secs),
                generator.generate(&prompt, &self.config.model),
            )
            .await;

            match generated {
                Err(_elapsed) => {
                    warn!(source = %source, "analysis generation timed out");
                    report.success = false;
                    report.errors.push("text generation timed out".to_string());
                }
                Ok(Err(e)) => {
                    warn!(source = %source, error = %e, "analysis generation failed");
                    report.success = false;
                    report.errors.push(format!("text generation failed: {}", e));
                }
                Ok(Ok(raw)) => match parse_suggestion_batch(&raw) {
                    Ok(batch) => suggestions.extend(batch),
                    Err(e) => {
                        warn!(source = %source, error = %e, "suggestion batch rejected");
                        report.success = false;
                        report.errors.push(format!("suggestion batch rejected: {}", e));
                    }
                },
            }
        }

        report.suggestions_considered = suggestions.len();

        let accepted: Vec<SuggestedEntity> = suggestions
            .into_iter()
            .filter(|s| s.confidence >= self.config.confidence_threshold)
            .filter(|s| self.passes_durable_gate(&record, s))
            .collect();

        for suggestion in accepted {
            match self.create_draft(&suggestion).await {
                Ok(draft) => {
                    let new_ref = draft.entity_ref();
                    let metadata = RelationMetadata {
                        ai_created: true,
                        confidence: suggestion.confidence,
                        reasoning: suggestion.reasoning.clone(),
                    };
                    let edge =
                        Relationship::new(source, new_ref, Some(user_id), Some(metadata.to_value()));
                    if let Err(e) = self.store.create_relation(&edge).await {
                        report
                            .errors
                            .push(format!("link {} -> {}: {}", source, new_ref, e));
                    } else {
                        report.created.push(new_ref);
                    }
                }
                Err(e) => {
                    report.errors.push(format!(
                        "{} '{}': {}",
                        suggestion.entity_type, suggestion.name, e
                    ));
                }
            }
        }

        info!(
            source = %source,
            considered = report.suggestions_considered,
            created = report.created.len(),
            errors = report.errors.len(),
            outcome = ?report.outcome(),
            "analysis run completed"
        );
        Ok(report)
    }

    /// Rule-based proposals that need no model.
    async fn deterministic_suggestions(
        &self,
        source: &EntityRef,
        record: &PortalRecord,
    ) -> Result<Vec<SuggestedEntity>> {
        let mut suggestions = Vec::new();

        if let PortalRecord::Reimbursement(reimbursement) = record {
            // Every reimbursement needs a matching expense transaction.
            if !self.has_linked_kind(source, EntityKind::Transaction).await? {
                suggestions.push(SuggestedEntity {
                    entity_type: EntityKind::Transaction,
                    name: reimbursement.description.clone(),
                    data: serde_json::json!({
                        "amount": reimbursement.total_amount,
                        "currency": reimbursement.currency,
                        "date": reimbursement.request_date.map(|d| d.to_string()),
                        "direction": "expense",
                        "category": reimbursement.category,
                    }),
                    confidence: TRANSACTION_SUGGESTION_CONFIDENCE,
                    reasoning: "Reimbursement has no expense transaction yet".to_string(),
                });
            }

            // Durable goods on the linked receipts become inventory
            // proposals (keyword + minimum price, see the gate).
            for receipt in self.linked_receipts(source).await? {
                for item in &receipt.line_items {
                    if is_durable(&item.name) && item.unit_price >= self.config.durable_min_price {
                        suggestions.push(SuggestedEntity {
                            entity_type: EntityKind::Inventory,
                            name: item.name.clone(),
                            data: serde_json::json!({
                                "purchase_price": item.unit_price,
                                "quantity": item.quantity,
                                "currency": receipt.currency,
                                "date": receipt.receipt_date.map(|d| d.to_string()),
                            }),
                            confidence: INVENTORY_SUGGESTION_CONFIDENCE,
                            reasoning: format!(
                                "Durable good on receipt '{}'",
                                receipt.name
                            ),
                        });
                    }
                }
            }
        }

        Ok(suggestions)
    }

    /// Inventory proposals from a reimbursement must name a durable good
    /// and carry a price above the configured minimum, whatever their
    /// confidence. Other proposals pass through.
    fn passes_durable_gate(&self, source: &PortalRecord, suggestion: &SuggestedEntity) -> bool {
        if suggestion.entity_type != EntityKind::Inventory {
            return true;
        }
        if !matches!(source, PortalRecord::Reimbursement(_)) {
            return true;
        }
        let price = data_f64(&suggestion.data, "purchase_price")
            .or_else(|| data_f64(&suggestion.data, "amount"));
        match price {
            Some(price) => price >= self.config.durable_min_price && is_durable(&suggestion.name),
            None => false,
        }
    }

    async fn has_linked_kind(&self, source: &EntityRef, kind: EntityKind) -> Result<bool> {
        let edges = self.store.relations_for(source).await?;
        Ok(edges
            .iter()
            .filter_map(|e| e.other_side(source))
            .any(|other| other.kind == kind))
    }

    async fn linked_receipts(&self, source: &EntityRef) -> Result<Vec<Receipt>> {
        let edges = self.store.relations_for(source).await?;
        let mut receipts = Vec::new();
        for neighbor in edges
            .iter()
            .filter_map(|e| e.other_side(source))
            .filter(|n| n.kind == EntityKind::Receipt)
        {
            if let Some(PortalRecord::Receipt(receipt)) = self.store.get_record(&neighbor).await? {
                receipts.push(receipt);
            }
        }
        Ok(receipts)
    }

    /// Build and persist the draft record for one accepted suggestion.
    ///
    /// Only the per-kind required fields are taken from the suggestion;
    /// missing optional fields default (an unset date becomes today).
    async fn create_draft(&self, suggestion: &SuggestedEntity) -> Result<PortalRecord> {
        let data = &suggestion.data;
        let name = suggestion.name.trim().to_string();
        let now = Utc::now();
        let today = now.date_naive();
        let id = Uuid::new_v4();

        let record = match suggestion.entity_type {
            EntityKind::Receipt => PortalRecord::Receipt(Receipt {
                id,
                name: name.clone(),
                store_name: data_str(data, "store_name"),
                file_name: None,
                total_amount: data_f64(data, "amount"),
                currency: data_str(data, "currency"),
                receipt_date: Some(data_date(data, "date").unwrap_or(today)),
                category: data_str(data, "category"),
                line_items: Vec::new(),
                ocr_processed: false,
                status: RecordStatus::Draft,
                created_at: now,
            }),
            EntityKind::Transaction => PortalRecord::Transaction(Transaction {
                id,
                description: name.clone(),
                amount: data_f64(data, "amount"),
                currency: data_str(data, "currency"),
                transaction_date: Some(data_date(data, "date").unwrap_or(today)),
                category: data_str(data, "category"),
                direction: match data_str(data, "direction").as_deref() {
                    Some("income") => TransactionDirection::Income,
                    _ => TransactionDirection::Expense,
                },
                status: RecordStatus::Draft,
                created_at: now,
            }),
            EntityKind::Reimbursement => PortalRecord::Reimbursement(Reimbursement {
                id,
                description: name.clone(),
                total_amount: data_f64(data, "amount"),
                currency: data_str(data, "currency"),
                request_date: Some(data_date(data, "date").unwrap_or(today)),
                category: data_str(data, "category"),
                purchaser_id: None,
                purchaser_name: None,
                iban: None,
                status: RecordStatus::Draft,
                created_at: now,
            }),
            EntityKind::Budget => PortalRecord::Budget(Budget {
                id,
                name: name.clone(),
                description: data_str(data, "description"),
                planned_amount: data_f64(data, "amount"),
                currency: data_str(data, "currency"),
                category: data_str(data, "category"),
                year: data_i32(data, "year"),
                status: RecordStatus::Draft,
                created_at: now,
            }),
            EntityKind::Inventory => PortalRecord::Inventory(InventoryItem {
                id,
                name: name.clone(),
                description: data_str(data, "description"),
                purchase_price: data_f64(data, "purchase_price")
                    .or_else(|| data_f64(data, "amount")),
                currency: data_str(data, "currency"),
                purchase_date: Some(data_date(data, "date").unwrap_or(today)),
                category: data_str(data, "category"),
                location: data_str(data, "location"),
                quantity: data_u32(data, "quantity").unwrap_or(1),
                status: RecordStatus::Draft,
                created_at: now,
            }),
            EntityKind::Minute => PortalRecord::Minute(Minute {
                id,
                title: name.clone(),
                body: data_str(data, "body"),
                meeting_date: Some(data_date(data, "date").unwrap_or(today)),
                status: RecordStatus::Draft,
                created_at: now,
            }),
            EntityKind::News => PortalRecord::News(NewsItem {
                id,
                title_de: Some(name.clone()),
                title_en: None,
                body_de: data_str(data, "body"),
                body_en: None,
                status: RecordStatus::Draft,
                created_at: now,
            }),
            EntityKind::Faq => PortalRecord::Faq(FaqEntry {
                id,
                question_de: Some(name.clone()),
                question_en: None,
                answer_de: data_str(data, "answer").or_else(|| data_str(data, "body")),
                answer_en: None,
                status: RecordStatus::Draft,
                created_at: now,
            }),
            EntityKind::Poll => PortalRecord::Poll(Poll {
                id,
                question: name.clone(),
                options: data_str_list(data, "options"),
                closes_at: None,
                status: RecordStatus::Draft,
                created_at: now,
            }),
            EntityKind::Social => PortalRecord::Social(SocialPost {
                id,
                body: data_str(data, "body").unwrap_or_else(|| name.clone()),
                status: RecordStatus::Draft,
                created_at: now,
            }),
            EntityKind::Event => PortalRecord::Event(CommitteeEvent {
                id,
                title: name.clone(),
                description: data_str(data, "description"),
                starts_at: Some(
                    data_date(data, "date")
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                        .map(|dt| dt.and_utc())
                        .unwrap_or(now),
                ),
                location: data_str(data, "location"),
                status: RecordStatus::Draft,
                created_at: now,
            }),
            EntityKind::Submission => PortalRecord::Submission(Submission {
                id,
                subject: name.clone(),
                body: data_str(data, "body"),
                submitter_id: None,
                status: RecordStatus::Draft,
                created_at: now,
            }),
            EntityKind::Mail => PortalRecord::Mail(MailThread {
                id,
                subject: name.clone(),
                participants: Vec::new(),
                last_message_at: None,
                status: RecordStatus::Draft,
                created_at: now,
            }),
        };

        self.store.create_record(&record).await?;
        Ok(record)
    }
}

/// Keyword match for durable goods.
fn is_durable(name: &str) -> bool {
    let lower = name.to_lowercase();
    DURABLE_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn data_f64(data: &serde_json::Value, key: &str) -> Option<f64> {
    data.get(key).and_then(|v| v.as_f64())
}

fn data_i32(data: &serde_json::Value, key: &str) -> Option<i32> {
    data.get(key).and_then(|v| v.as_i64()).map(|v| v as i32)
}

fn data_u32(data: &serde_json::Value, key: &str) -> Option<u32> {
    data.get(key)
        .and_then(|v| v.as_u64())
        .and_then(|v| u32::try_from(v).ok())
}

fn data_str(data: &serde_json::Value, key: &str) -> Option<String> {
    data.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn data_date(data: &serde_json::Value, key: &str) -> Option<NaiveDate> {
    data.get(key)
        .and_then(|v| v.as_str())
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

fn data_str_list(data: &serde_json::Value, key: &str) -> Vec<String> {
    data.get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

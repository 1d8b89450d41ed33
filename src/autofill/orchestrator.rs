//! Autofill orchestrator.
//!
//! Produces a `field → suggested value` map for a target record's form.
//! Strictly non-destructive: a field is only ever suggested when its
//! current form value is empty (or zero-equivalent), and applying the
//! suggestions is left to the caller.
//!
//! Order of passes:
//! 1. kind-specific deterministic rules (receipt name, purchaser profile)
//! 2. context fill through the static field maps
//! 3. optional AI enrichment (translation, category/description), only
//!    for fields still empty — best-effort, never a hard failure

use crate::ai::traits::TextGenerator;
use crate::autofill::field_map::{field_map, ContextField};
use crate::context::models::RelationshipContext;
use crate::context::resolver::{ContextResolver, ResolverConfig};
use crate::error::PortalError;
use crate::records::models::{EntityKind, EntityRef, PortalRecord};
use crate::records::traits::RecordStore;
use crate::relations::manager::Viewer;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Values the orchestrator treats as "empty" and eligible for filling.
const BLANK_VALUES: &[&str] = &["", "0", "0.00", "0,00"];

/// Tuning for the autofill orchestrator.
#[derive(Debug, Clone)]
pub struct AutofillConfig {
    /// Model name handed to the generator.
    pub model: String,
    /// Hard bound on each generate call.
    pub ai_timeout_secs: u64,
}

impl Default for AutofillConfig {
    fn default() -> Self {
        Self {
            model: "llama3.1:8b".to_string(),
            ai_timeout_secs: 30,
        }
    }
}

/// Suggests values for the empty fields of a record's edit form.
pub struct AutofillOrchestrator {
    store: Arc<dyn RecordStore>,
    resolver: ContextResolver,
    generator: Option<Arc<dyn TextGenerator>>,
    config: AutofillConfig,
}

impl AutofillOrchestrator {
    pub fn new(
        store: Arc<dyn RecordStore>,
        generator: Option<Arc<dyn TextGenerator>>,
        config: AutofillConfig,
    ) -> Self {
        let resolver = ContextResolver::new(store.clone());
        Self {
            store,
            resolver,
            generator,
            config,
        }
    }

    /// Override the resolver tuning (builder pattern).
    pub fn with_resolver_config(mut self, resolver_config: ResolverConfig) -> Self {
        self.resolver = ContextResolver::with_config(self.store.clone(), resolver_config);
        self
    }

    /// Compute suggestions for `target`'s form.
    ///
    /// `form` holds the current (possibly partially filled) form values.
    /// The result maps field names to suggested values; fields with a
    /// non-empty current value never appear in it.
    pub async fn suggest(
        &self,
        target: EntityRef,
        form: &HashMap<String, String>,
        viewer: &Viewer,
    ) -> Result<HashMap<String, String>> {
        let record = self
            .store
            .get_record(&target)
            .await?
            .ok_or_else(|| PortalError::NotFound(target.to_string()))?;

        let mut suggestions: HashMap<String, String> = HashMap::new();

        // 1. Deterministic kind rules
        self.apply_kind_rules(&record, form, viewer, &mut suggestions)
            .await?;

        // 2. Context fill through the static field map
        let map = field_map(record.kind());
        let context = if map.is_empty() {
            None
        } else {
            let context = self.resolver.resolve(target).await?;
            for (field, context_field) in map {
                if !form_blank(form, field) || suggestions.contains_key(*field) {
                    continue;
                }
                if let Some(value) = context_value(&context, *context_field) {
                    suggestions.insert((*field).to_string(), value);
                }
            }
            Some(context)
        };

        // 3. AI enrichment, only for fields still empty
        if self.generator.is_some() {
            match record.kind() {
                EntityKind::News | EntityKind::Faq => {
                    self.translate_language_pairs(&record, form, &mut suggestions)
                        .await;
                }
                EntityKind::Transaction
                | EntityKind::Reimbursement
                | EntityKind::Budget
                | EntityKind::Inventory => {
                    if let Some(context) = &context {
                        self.suggest_category_and_description(form, context, &mut suggestions)
                            .await;
                    }
                }
                EntityKind::Receipt
                | EntityKind::Minute
                | EntityKind::Poll
                | EntityKind::Social
                | EntityKind::Event
                | EntityKind::Submission
                | EntityKind::Mail => {}
            }
        }

        Ok(suggestions)
    }

    /// Kind-specific deterministic defaults.
    async fn apply_kind_rules(
        &self,
        record: &PortalRecord,
        form: &HashMap<String, String>,
        viewer: &Viewer,
        suggestions: &mut HashMap<String, String>,
    ) -> Result<()> {
        match record {
            // A receipt's name defaults to the store name, else the
            // uploaded file name.
            PortalRecord::Receipt(receipt) => {
                if form_blank(form, "name") {
                    if let Some(name) = receipt
                        .store_name
                        .clone()
                        .or_else(|| receipt.file_name.clone())
                    {
                        suggestions.insert("name".to_string(), name);
                    }
                }
            }
            // A reimbursement's purchaser defaults to the acting user.
            PortalRecord::Reimbursement(_) => {
                if form_blank(form, "purchaser_name") || form_blank(form, "iban") {
                    if let Some(profile) = self.store.get_user_profile(viewer.user_id).await? {
                        if form_blank(form, "purchaser_name") {
                            suggestions.insert("purchaser_name".to_string(), profile.name);
                        }
                        if form_blank(form, "iban") {
                            if let Some(iban) = profile.iban {
                                suggestions.insert("iban".to_string(), iban);
                            }
                        }
                    }
                }
            }
            PortalRecord::Transaction(_)
            | PortalRecord::Budget(_)
            | PortalRecord::Inventory(_)
            | PortalRecord::Minute(_)
            | PortalRecord::News(_)
            | PortalRecord::Faq(_)
            | PortalRecord::Poll(_)
            | PortalRecord::Social(_)
            | PortalRecord::Event(_)
            | PortalRecord::Submission(_)
            | PortalRecord::Mail(_) => {}
        }
        Ok(())
    }

    /// Cross-language fill for the two-language kinds: translate each
    /// filled side of a field pair into its empty counterpart.
    async fn translate_language_pairs(
        &self,
        record: &PortalRecord,
        form: &HashMap<String, String>,
        suggestions: &mut HashMap<String, String>,
    ) {
        let pairs: &[(&str, &str)] = match record {
            PortalRecord::News(_) => &[("title_de", "title_en"), ("body_de", "body_en")],
            PortalRecord::Faq(_) => &[("question_de", "question_en"), ("answer_de", "answer_en")],
            _ => return,
        };

        for &(de_field, en_field) in pairs {
            for (src, dst) in [(de_field, en_field), (en_field, de_field)] {
                if form_blank(form, src) || !form_blank(form, dst) || suggestions.contains_key(dst)
                {
                    continue;
                }
                let target_language = if dst.ends_with("_en") {
                    "English"
                } else {
                    "German"
                };
                let text = &form[src];
                let prompt = format!(
                    "Translate the following tenant-committee portal text into {}. \
                     Reply with the translation only, no commentary.\n\n{}",
                    target_language, text
                );
                match self.generate_bounded(&prompt).await {
                    Ok(translated) if !translated.trim().is_empty() => {
                        suggestions.insert(dst.to_string(), translated.trim().to_string());
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(field = dst, error = %e, "translation suggestion failed");
                    }
                }
            }
        }
    }

    /// Ask for a short category (and, with enough material, a short
    /// description) for a value-bearing record.
    async fn suggest_category_and_description(
        &self,
        form: &HashMap<String, String>,
        context: &RelationshipContext,
        suggestions: &mut HashMap<String, String>,
    ) {
        let basis = form
            .get("description")
            .filter(|v| !is_blank(v))
            .cloned()
            .or_else(|| suggestions.get("description").cloned())
            .or_else(|| context.description.clone());

        let Some(basis) = basis else {
            return; // nothing to reason about
        };

        let items: Vec<&str> = context
            .line_items
            .iter()
            .map(|i| i.name.as_str())
            .collect();

        if form_blank(form, "category") && !suggestions.contains_key("category") {
            let prompt = format!(
                "Suggest one short expense category (one or two lowercase words) for a \
                 tenant-committee purchase described as \"{}\"{}. Reply with the category only.",
                basis,
                if items.is_empty() {
                    String::new()
                } else {
                    format!(" with items: {}", items.join(", "))
                }
            );
            match self.generate_bounded(&prompt).await {
                Ok(category) if !category.trim().is_empty() => {
                    suggestions.insert(
                        "category".to_string(),
                        category.trim().to_lowercase(),
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "category suggestion failed");
                }
            }
        }

        if form_blank(form, "description")
            && !suggestions.contains_key("description")
            && !items.is_empty()
        {
            let prompt = format!(
                "Write one short (max 8 words) ledger description for a purchase at \"{}\" \
                 containing: {}. Reply with the description only.",
                basis,
                items.join(", ")
            );
            match self.generate_bounded(&prompt).await {
                Ok(description) if !description.trim().is_empty() => {
                    suggestions.insert("description".to_string(), description.trim().to_string());
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "description suggestion failed");
                }
            }
        }
    }

    /// Run one generate call under the configured timeout.
    async fn generate_bounded(&self, prompt: &str) -> Result<String> {
        let Some(generator) = self.generator.as_ref() else {
            return Err(PortalError::ExternalServiceUnavailable(
                "no text generator configured".to_string(),
            )
            .into());
        };
        match tokio::time::timeout(
            Duration::from_secs(self.config.ai_timeout_secs),
            generator.generate(prompt, &self.config.model),
        )
        .await
        {
            Ok(result) => result,
            Err(_elapsed) => Err(PortalError::ExternalServiceUnavailable(
                "text generation timed out".to_string(),
            )
            .into()),
        }
    }
}

/// Whether a raw form value counts as empty.
pub fn is_blank(value: &str) -> bool {
    BLANK_VALUES.contains(&value.trim())
}

fn form_blank(form: &HashMap<String, String>, field: &str) -> bool {
    form.get(field).map(String::as_str).map_or(true, is_blank)
}

/// Render one context field as a form value.
fn context_value(context: &RelationshipContext, field: ContextField) -> Option<String> {
    match field {
        ContextField::TotalAmount => context.total_amount.map(|v| format!("{:.2}", v)),
        ContextField::Description => context.description.clone(),
        ContextField::Date => context.date.map(|d| d.to_string()),
        ContextField::Currency => context.currency.clone(),
        ContextField::Category => context.category.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::mock::MockTextGenerator;
    use crate::records::memory::MemoryStore;
    use crate::records::models::{NewsItem, RecordStatus, UserProfile};
    use crate::relations::models::Relationship;
    use crate::test_helpers::{test_receipt, test_reimbursement, test_transaction};
    use chrono::Utc;
    use uuid::Uuid;

    fn viewer() -> Viewer {
        Viewer::new(Uuid::new_v4(), vec![])
    }

    fn form(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    async fn transaction_linked_to_receipt(store: &MemoryStore) -> EntityRef {
        let mut tx = test_transaction();
        tx.amount = None;
        tx.category = None;
        let tx = PortalRecord::Transaction(tx);
        let mut receipt = test_receipt();
        receipt.total_amount = Some(40.0);
        let receipt = PortalRecord::Receipt(receipt);
        store.create_record(&tx).await.unwrap();
        store.create_record(&receipt).await.unwrap();
        store
            .create_relation(&Relationship::new(
                tx.entity_ref(),
                receipt.entity_ref(),
                None,
                None,
            ))
            .await
            .unwrap();
        tx.entity_ref()
    }

    #[tokio::test]
    async fn test_autofill_never_overwrites_filled_fields() {
        let store = Arc::new(MemoryStore::new());
        let target = transaction_linked_to_receipt(&store).await;

        let orchestrator =
            AutofillOrchestrator::new(store.clone(), None, AutofillConfig::default());
        let suggestions = orchestrator
            .suggest(target, &form(&[("amount", "12.50")]), &viewer())
            .await
            .unwrap();
        assert!(!suggestions.contains_key("amount"));
    }

    #[tokio::test]
    async fn test_autofill_fills_empty_amount_from_context() {
        let store = Arc::new(MemoryStore::new());
        let target = transaction_linked_to_receipt(&store).await;

        let orchestrator =
            AutofillOrchestrator::new(store.clone(), None, AutofillConfig::default());
        let suggestions = orchestrator
            .suggest(target, &form(&[("amount", "")]), &viewer())
            .await
            .unwrap();
        assert_eq!(suggestions.get("amount").map(String::as_str), Some("40.00"));
    }

    #[tokio::test]
    async fn test_zero_equivalents_count_as_empty() {
        let store = Arc::new(MemoryStore::new());
        let target = transaction_linked_to_receipt(&store).await;

        let orchestrator =
            AutofillOrchestrator::new(store.clone(), None, AutofillConfig::default());
        for zero in ["0", "0.00", "0,00"] {
            let suggestions = orchestrator
                .suggest(target, &form(&[("amount", zero)]), &viewer())
                .await
                .unwrap();
            assert_eq!(
                suggestions.get("amount").map(String::as_str),
                Some("40.00"),
                "form value {:?} should be fillable",
                zero
            );
        }
    }

    #[tokio::test]
    async fn test_receipt_name_defaults_to_store_name_then_file_name() {
        let store = Arc::new(MemoryStore::new());
        let receipt = PortalRecord::Receipt(test_receipt());
        store.create_record(&receipt).await.unwrap();

        let orchestrator =
            AutofillOrchestrator::new(store.clone(), None, AutofillConfig::default());
        let suggestions = orchestrator
            .suggest(receipt.entity_ref(), &form(&[]), &viewer())
            .await
            .unwrap();
        assert_eq!(suggestions.get("name").map(String::as_str), Some("Bauhaus"));

        // Without a store name, the file name steps in.
        let mut nameless = test_receipt();
        nameless.store_name = None;
        let nameless = PortalRecord::Receipt(nameless);
        store.create_record(&nameless).await.unwrap();
        let suggestions = orchestrator
            .suggest(nameless.entity_ref(), &form(&[]), &viewer())
            .await
            .unwrap();
        assert_eq!(
            suggestions.get("name").map(String::as_str),
            Some("scan-0042.pdf")
        );
    }

    #[tokio::test]
    async fn test_reimbursement_purchaser_from_acting_user_profile() {
        let store = Arc::new(MemoryStore::new());
        let reimbursement = PortalRecord::Reimbursement(test_reimbursement());
        store.create_record(&reimbursement).await.unwrap();

        let user = UserProfile {
            id: Uuid::new_v4(),
            name: "Maria Keller".to_string(),
            iban: Some("DE89370400440532013000".to_string()),
        };
        store.put_user(user.clone()).await;

        let orchestrator =
            AutofillOrchestrator::new(store.clone(), None, AutofillConfig::default());
        let acting = Viewer::new(user.id, vec![]);
        let suggestions = orchestrator
            .suggest(reimbursement.entity_ref(), &form(&[]), &acting)
            .await
            .unwrap();
        assert_eq!(
            suggestions.get("purchaser_name").map(String::as_str),
            Some("Maria Keller")
        );
        assert_eq!(
            suggestions.get("iban").map(String::as_str),
            Some("DE89370400440532013000")
        );
    }

    #[tokio::test]
    async fn test_news_translation_fills_empty_secondary_language() {
        let store = Arc::new(MemoryStore::new());
        let news = PortalRecord::News(NewsItem {
            id: Uuid::new_v4(),
            title_de: Some("Frühjahrsputz im Hof".to_string()),
            title_en: None,
            body_de: None,
            body_en: None,
            status: RecordStatus::Draft,
            created_at: Utc::now(),
        });
        store.create_record(&news).await.unwrap();

        let generator = Arc::new(MockTextGenerator::always("Spring cleaning in the courtyard"));
        let orchestrator = AutofillOrchestrator::new(
            store.clone(),
            Some(generator),
            AutofillConfig::default(),
        );
        let suggestions = orchestrator
            .suggest(
                news.entity_ref(),
                &form(&[("title_de", "Frühjahrsputz im Hof"), ("title_en", "")]),
                &viewer(),
            )
            .await
            .unwrap();
        assert_eq!(
            suggestions.get("title_en").map(String::as_str),
            Some("Spring cleaning in the courtyard")
        );
    }

    #[tokio::test]
    async fn test_ai_failure_still_returns_deterministic_suggestions() {
        let store = Arc::new(MemoryStore::new());
        let target = transaction_linked_to_receipt(&store).await;

        let generator = Arc::new(MockTextGenerator::failing());
        let orchestrator = AutofillOrchestrator::new(
            store.clone(),
            Some(generator),
            AutofillConfig::default(),
        );
        let suggestions = orchestrator
            .suggest(target, &form(&[("amount", "")]), &viewer())
            .await
            .unwrap();
        // The context fill survived the dead generator.
        assert_eq!(suggestions.get("amount").map(String::as_str), Some("40.00"));
    }

    #[tokio::test]
    async fn test_category_suggested_only_when_blank() {
        let store = Arc::new(MemoryStore::new());
        let target = transaction_linked_to_receipt(&store).await;

        let generator = Arc::new(MockTextGenerator::always("Maintenance"));
        let orchestrator = AutofillOrchestrator::new(
            store.clone(),
            Some(generator.clone()),
            AutofillConfig::default(),
        );

        // Receipt context supplies a category already, so the context
        // fill wins and no AI category call is needed for that field.
        let suggestions = orchestrator
            .suggest(target, &form(&[("category", "repairs")]), &viewer())
            .await
            .unwrap();
        assert!(!suggestions.contains_key("category"));
    }

    #[tokio::test]
    async fn test_missing_target_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let orchestrator = AutofillOrchestrator::new(store, None, AutofillConfig::default());
        let ghost = EntityRef::new(EntityKind::Transaction, Uuid::new_v4());
        let err = orchestrator
            .suggest(ghost, &form(&[]), &viewer())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PortalError>(),
            Some(PortalError::NotFound(_))
        ));
    }

    #[test]
    fn test_is_blank_matrix() {
        assert!(is_blank(""));
        assert!(is_blank("  "));
        assert!(is_blank("0"));
        assert!(is_blank("0.00"));
        assert!(is_blank("0,00"));
        assert!(!is_blank("12.50"));
        assert!(!is_blank("drill"));
    }
}

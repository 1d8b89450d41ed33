//! Prompt construction for the draft analyzer.
//!
//! Prompts are built from a [`SourceDigest`] — a compact view of the
//! source record's *own* fields only. The cross-entity relationship
//! context deliberately stays out of these prompts: analysis asks "what
//! follows from this record", not "what do its neighbors already say".

use crate::records::models::{EntityKind, LineItem, PortalRecord};
use chrono::NaiveDate;

/// Compact structured context extracted from one record.
#[derive(Debug, Clone)]
pub struct SourceDigest {
    pub kind: EntityKind,
    pub title: String,
    pub store_name: Option<String>,
    pub total_amount: Option<f64>,
    pub currency: Option<String>,
    pub date: Option<NaiveDate>,
    pub line_items: Vec<LineItem>,
    pub body: Option<String>,
}

impl SourceDigest {
    pub fn from_record(record: &PortalRecord) -> Self {
        let body = match record {
            PortalRecord::Minute(m) => m.body.clone(),
            PortalRecord::News(n) => n.body_de.clone().or_else(|| n.body_en.clone()),
            PortalRecord::Faq(f) => f.answer_de.clone().or_else(|| f.answer_en.clone()),
            PortalRecord::Submission(s) => s.body.clone(),
            PortalRecord::Social(s) => Some(s.body.clone()),
            PortalRecord::Event(e) => e.description.clone(),
            PortalRecord::Receipt(_)
            | PortalRecord::Transaction(_)
            | PortalRecord::Reimbursement(_)
            | PortalRecord::Budget(_)
            | PortalRecord::Inventory(_)
            | PortalRecord::Poll(_)
            | PortalRecord::Mail(_) => None,
        };
        let store_name = match record {
            PortalRecord::Receipt(r) => r.store_name.clone(),
            _ => None,
        };
        Self {
            kind: record.kind(),
            title: record.label().to_string(),
            store_name,
            total_amount: record.amount(),
            currency: record.currency().map(str::to_string),
            date: record.value_date(),
            line_items: record.line_items().to_vec(),
            body,
        }
    }

    /// Render the digest as the prompt's data block.
    fn render(&self) -> String {
        let mut lines = vec![format!("Record type: {}", self.kind)];
        lines.push(format!("Title: {}", self.title));
        if let Some(store) = &self.store_name {
            lines.push(format!("Store: {}", store));
        }
        if let Some(amount) = self.total_amount {
            let currency = self.currency.as_deref().unwrap_or("EUR");
            lines.push(format!("Total: {:.2} {}", amount, currency));
        }
        if let Some(date) = self.date {
            lines.push(format!("Date: {}", date));
        }
        if !self.line_items.is_empty() {
            lines.push("Line items:".to_string());
            for item in &self.line_items {
                lines.push(format!(
                    "  - {} x{} @ {:.2} = {:.2}",
                    item.name, item.quantity, item.unit_price, item.total_price
                ));
            }
        }
        if let Some(body) = &self.body {
            lines.push(format!("Text: {}", body));
        }
        lines.join("\n")
    }
}

/// The shared response contract appended to every analysis prompt.
const RESPONSE_CONTRACT: &str = r#"Respond with a JSON array only, no prose. Each entry:
{"entityType": "<one of: receipt, transaction, reimbursement, budget, inventory, minute, news, faq, poll, social, event, submission, mail>",
 "name": "<short title for the new record>",
 "data": {<kind-specific fields, e.g. amount, date (YYYY-MM-DD), purchase_price, quantity, body>},
 "confidence": <0.0-1.0>,
 "reasoning": "<one sentence>"}
Propose nothing rather than guessing: an empty array [] is a valid answer."#;

/// Build the kind-specific analysis prompt for a source record.
pub fn analysis_prompt(digest: &SourceDigest) -> String {
    let intro = match digest.kind {
        EntityKind::Receipt => {
            "You assist a tenant-committee treasury. Given the OCR-processed receipt below, \
             propose related records worth creating: an expense transaction for the total, \
             and inventory items for durable goods on the receipt."
        }
        EntityKind::Reimbursement => {
            "You assist a tenant-committee treasury. Given the reimbursement request below, \
             propose related records worth creating: the matching expense transaction and, \
             for durable purchased goods, inventory items."
        }
        EntityKind::Minute => {
            "You assist a tenant committee. Given the meeting minutes below, propose related \
             records worth creating: decided events, announced news items, polls to run, or \
             follow-up submissions."
        }
        EntityKind::Submission => {
            "You assist a tenant committee. Given the tenant submission below, propose related \
             records worth creating, such as an event, a poll, or a news item addressing it."
        }
        EntityKind::News => {
            "You assist a tenant committee. Given the news item below, propose related records \
             worth creating, such as an event or a social post announcing it."
        }
        EntityKind::Transaction
        | EntityKind::Budget
        | EntityKind::Inventory
        | EntityKind::Faq
        | EntityKind::Poll
        | EntityKind::Social
        | EntityKind::Event
        | EntityKind::Mail => {
            "You assist a tenant-committee administration portal. Given the record below, \
             propose directly related records worth creating."
        }
    };

    format!("{}\n\n{}\n\n{}", intro, digest.render(), RESPONSE_CONTRACT)
}

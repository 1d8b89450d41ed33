//! Portal record models.
//!
//! Defines the closed type system the relationship graph operates on:
//!
//! ## Identity
//! - [`EntityKind`] — closed enumeration of record kinds
//! - [`EntityRef`] — `(kind, id)` identity of a record in the graph
//!
//! ## Lifecycle
//! - [`RecordStatus`] — `draft → active → archived`
//!
//! ## Records
//! - One struct per kind (receipt, transaction, reimbursement, …)
//! - [`PortalRecord`] — closed union over all record types, so every
//!   kind-specific branch in the engine is an exhaustive match

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identity
// ============================================================================

/// Kind of a portal record. Closed enumeration: adding a kind is a
/// compile-time exercise (every `match` on this enum is exhaustive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Receipt,
    Transaction,
    Reimbursement,
    Budget,
    Inventory,
    Minute,
    News,
    Faq,
    Poll,
    Social,
    Event,
    Submission,
    Mail,
}

impl EntityKind {
    /// All kinds, in a stable order.
    pub const ALL: [EntityKind; 13] = [
        Self::Receipt,
        Self::Transaction,
        Self::Reimbursement,
        Self::Budget,
        Self::Inventory,
        Self::Minute,
        Self::News,
        Self::Faq,
        Self::Poll,
        Self::Social,
        Self::Event,
        Self::Submission,
        Self::Mail,
    ];
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Receipt => write!(f, "receipt"),
            Self::Transaction => write!(f, "transaction"),
            Self::Reimbursement => write!(f, "reimbursement"),
            Self::Budget => write!(f, "budget"),
            Self::Inventory => write!(f, "inventory"),
            Self::Minute => write!(f, "minute"),
            Self::News => write!(f, "news"),
            Self::Faq => write!(f, "faq"),
            Self::Poll => write!(f, "poll"),
            Self::Social => write!(f, "social"),
            Self::Event => write!(f, "event"),
            Self::Submission => write!(f, "submission"),
            Self::Mail => write!(f, "mail"),
        }
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "receipt" => Ok(Self::Receipt),
            "transaction" => Ok(Self::Transaction),
            "reimbursement" => Ok(Self::Reimbursement),
            "budget" => Ok(Self::Budget),
            "inventory" => Ok(Self::Inventory),
            "minute" => Ok(Self::Minute),
            "news" => Ok(Self::News),
            "faq" => Ok(Self::Faq),
            "poll" => Ok(Self::Poll),
            "social" => Ok(Self::Social),
            "event" => Ok(Self::Event),
            "submission" => Ok(Self::Submission),
            "mail" => Ok(Self::Mail),
            _ => Err(format!("Unknown entity kind: {}", s)),
        }
    }
}

/// Identity of a record in the relationship graph: kind + id.
///
/// The graph never looks inside a record; it only links identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: Uuid,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: Uuid) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Lifecycle status of a record.
///
/// Records created by the draft analyzer start as [`Draft`](Self::Draft)
/// and require human confirmation before being treated as authoritative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Machine- or user-created, not yet confirmed
    Draft,
    /// Confirmed / published
    #[default]
    Active,
    /// Kept for history, no longer current
    Archived,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Active => write!(f, "active"),
            Self::Archived => write!(f, "archived"),
        }
    }
}

impl FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "archived" => Ok(Self::Archived),
            _ => Err(format!("Unknown record status: {}", s)),
        }
    }
}

// ============================================================================
// Shared value types
// ============================================================================

/// A single line of a receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub total_price: f64,
}

/// Minimal profile of a portal user, as seen by this subsystem.
///
/// Feeds the reimbursement purchaser autofill rule; everything else about
/// users (auth, roles) lives outside this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub iban: Option<String>,
}

// ============================================================================
// Record types — one per kind
// ============================================================================

/// A scanned purchase receipt. Pure value *source*: other kinds consume
/// its amount/date/line items, it never consumes theirs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub id: Uuid,
    pub name: String,
    pub store_name: Option<String>,
    pub file_name: Option<String>,
    pub total_amount: Option<f64>,
    pub currency: Option<String>,
    pub receipt_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub line_items: Vec<LineItem>,
    /// Set once OCR extraction has run; the analyzer requires it.
    pub ocr_processed: bool,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
}

/// Direction of a treasury transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionDirection {
    Income,
    Expense,
}

/// A treasury ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub description: String,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub transaction_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub direction: TransactionDirection,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
}

/// A member's request to be paid back for an out-of-pocket purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reimbursement {
    pub id: Uuid,
    pub description: String,
    pub total_amount: Option<f64>,
    pub currency: Option<String>,
    pub request_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub purchaser_id: Option<Uuid>,
    pub purchaser_name: Option<String>,
    pub iban: Option<String>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
}

/// A planned spending envelope for one category and year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub planned_amount: Option<f64>,
    pub currency: Option<String>,
    pub category: Option<String>,
    pub year: Option<i32>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
}

/// A durable good owned by the committee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub purchase_price: Option<f64>,
    pub currency: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub quantity: u32,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
}

/// Meeting minutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Minute {
    pub id: Uuid,
    pub title: String,
    pub body: Option<String>,
    pub meeting_date: Option<NaiveDate>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
}

/// A news item. Carries both portal languages; the autofill orchestrator
/// can translate a filled side into an empty one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: Uuid,
    pub title_de: Option<String>,
    pub title_en: Option<String>,
    pub body_de: Option<String>,
    pub body_en: Option<String>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
}

/// A frequently-asked question, in both portal languages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqEntry {
    pub id: Uuid,
    pub question_de: Option<String>,
    pub question_en: Option<String>,
    pub answer_de: Option<String>,
    pub answer_en: Option<String>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
}

/// A member poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    pub id: Uuid,
    pub question: String,
    pub options: Vec<String>,
    pub closes_at: Option<DateTime<Utc>>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
}

/// A post mirrored to the committee's social channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialPost {
    pub id: Uuid,
    pub body: String,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
}

/// A committee event (assembly, flea market, …).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitteeEvent {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
}

/// A tenant submission (request, complaint, idea).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub subject: String,
    pub body: Option<String>,
    pub submitter_id: Option<Uuid>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
}

/// A mail thread in the committee inbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailThread {
    pub id: Uuid,
    pub subject: String,
    pub participants: Vec<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// PortalRecord — closed union
// ============================================================================

/// A record of any kind. The engine passes records around through this
/// union so that kind-specific behavior (value extraction, visibility,
/// draft creation, field maps) is always an exhaustive match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PortalRecord {
    Receipt(Receipt),
    Transaction(Transaction),
    Reimbursement(Reimbursement),
    Budget(Budget),
    Inventory(InventoryItem),
    Minute(Minute),
    News(NewsItem),
    Faq(FaqEntry),
    Poll(Poll),
    Social(SocialPost),
    Event(CommitteeEvent),
    Submission(Submission),
    Mail(MailThread),
}

impl PortalRecord {
    /// The kind tag of this record.
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Receipt(_) => EntityKind::Receipt,
            Self::Transaction(_) => EntityKind::Transaction,
            Self::Reimbursement(_) => EntityKind::Reimbursement,
            Self::Budget(_) => EntityKind::Budget,
            Self::Inventory(_) => EntityKind::Inventory,
            Self::Minute(_) => EntityKind::Minute,
            Self::News(_) => EntityKind::News,
            Self::Faq(_) => EntityKind::Faq,
            Self::Poll(_) => EntityKind::Poll,
            Self::Social(_) => EntityKind::Social,
            Self::Event(_) => EntityKind::Event,
            Self::Submission(_) => EntityKind::Submission,
            Self::Mail(_) => EntityKind::Mail,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::Receipt(r) => r.id,
            Self::Transaction(r) => r.id,
            Self::Reimbursement(r) => r.id,
            Self::Budget(r) => r.id,
            Self::Inventory(r) => r.id,
            Self::Minute(r) => r.id,
            Self::News(r) => r.id,
            Self::Faq(r) => r.id,
            Self::Poll(r) => r.id,
            Self::Social(r) => r.id,
            Self::Event(r) => r.id,
            Self::Submission(r) => r.id,
            Self::Mail(r) => r.id,
        }
    }

    /// Graph identity of this record.
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.kind(), self.id())
    }

    pub fn status(&self) -> RecordStatus {
        match self {
            Self::Receipt(r) => r.status,
            Self::Transaction(r) => r.status,
            Self::Reimbursement(r) => r.status,
            Self::Budget(r) => r.status,
            Self::Inventory(r) => r.status,
            Self::Minute(r) => r.status,
            Self::News(r) => r.status,
            Self::Faq(r) => r.status,
            Self::Poll(r) => r.status,
            Self::Social(r) => r.status,
            Self::Event(r) => r.status,
            Self::Submission(r) => r.status,
            Self::Mail(r) => r.status,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::Receipt(r) => r.created_at,
            Self::Transaction(r) => r.created_at,
            Self::Reimbursement(r) => r.created_at,
            Self::Budget(r) => r.created_at,
            Self::Inventory(r) => r.created_at,
            Self::Minute(r) => r.created_at,
            Self::News(r) => r.created_at,
            Self::Faq(r) => r.created_at,
            Self::Poll(r) => r.created_at,
            Self::Social(r) => r.created_at,
            Self::Event(r) => r.created_at,
            Self::Submission(r) => r.created_at,
            Self::Mail(r) => r.created_at,
        }
    }

    /// Human-readable label, used in prompts and logs.
    pub fn label(&self) -> &str {
        match self {
            Self::Receipt(r) => &r.name,
            Self::Transaction(r) => &r.description,
            Self::Reimbursement(r) => &r.description,
            Self::Budget(r) => &r.name,
            Self::Inventory(r) => &r.name,
            Self::Minute(r) => &r.title,
            Self::News(r) => r
                .title_de
                .as_deref()
                .or(r.title_en.as_deref())
                .unwrap_or(""),
            Self::Faq(r) => r
                .question_de
                .as_deref()
                .or(r.question_en.as_deref())
                .unwrap_or(""),
            Self::Poll(r) => &r.question,
            Self::Social(r) => &r.body,
            Self::Event(r) => &r.title,
            Self::Submission(r) => &r.subject,
            Self::Mail(r) => &r.subject,
        }
    }

    // ------------------------------------------------------------------
    // Shared-value accessors consumed by the context resolver.
    // Kinds that don't carry a value return None / empty.
    // ------------------------------------------------------------------

    /// The monetary amount this record carries, if any.
    pub fn amount(&self) -> Option<f64> {
        match self {
            Self::Receipt(r) => r.total_amount,
            Self::Transaction(r) => r.amount,
            Self::Reimbursement(r) => r.total_amount,
            Self::Budget(r) => r.planned_amount,
            Self::Inventory(r) => r.purchase_price,
            Self::Minute(_)
            | Self::News(_)
            | Self::Faq(_)
            | Self::Poll(_)
            | Self::Social(_)
            | Self::Event(_)
            | Self::Submission(_)
            | Self::Mail(_) => None,
        }
    }

    /// The free-text description shared through the context, if any.
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Receipt(r) => r.store_name.as_deref().or(Some(r.name.as_str())),
            Self::Transaction(r) => Some(&r.description),
            Self::Reimbursement(r) => Some(&r.description),
            Self::Budget(r) => r.description.as_deref().or(Some(r.name.as_str())),
            Self::Inventory(r) => r.description.as_deref().or(Some(r.name.as_str())),
            Self::Minute(_)
            | Self::News(_)
            | Self::Faq(_)
            | Self::Poll(_)
            | Self::Social(_)
            | Self::Event(_)
            | Self::Submission(_)
            | Self::Mail(_) => None,
        }
    }

    /// The business date this record carries, if any.
    pub fn value_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Receipt(r) => r.receipt_date,
            Self::Transaction(r) => r.transaction_date,
            Self::Reimbursement(r) => r.request_date,
            Self::Budget(_) => None,
            Self::Inventory(r) => r.purchase_date,
            Self::Minute(r) => r.meeting_date,
            Self::News(_)
            | Self::Faq(_)
            | Self::Poll(_)
            | Self::Social(_)
            | Self::Event(_)
            | Self::Submission(_)
            | Self::Mail(_) => None,
        }
    }

    pub fn currency(&self) -> Option<&str> {
        match self {
            Self::Receipt(r) => r.currency.as_deref(),
            Self::Transaction(r) => r.currency.as_deref(),
            Self::Reimbursement(r) => r.currency.as_deref(),
            Self::Budget(r) => r.currency.as_deref(),
            Self::Inventory(r) => r.currency.as_deref(),
            Self::Minute(_)
            | Self::News(_)
            | Self::Faq(_)
            | Self::Poll(_)
            | Self::Social(_)
            | Self::Event(_)
            | Self::Submission(_)
            | Self::Mail(_) => None,
        }
    }

    pub fn category(&self) -> Option<&str> {
        match self {
            Self::Receipt(r) => r.category.as_deref(),
            Self::Transaction(r) => r.category.as_deref(),
            Self::Reimbursement(r) => r.category.as_deref(),
            Self::Budget(r) => r.category.as_deref(),
            Self::Inventory(r) => r.category.as_deref(),
            Self::Minute(_)
            | Self::News(_)
            | Self::Faq(_)
            | Self::Poll(_)
            | Self::Social(_)
            | Self::Event(_)
            | Self::Submission(_)
            | Self::Mail(_) => None,
        }
    }

    /// Receipt line items; empty for every other kind.
    pub fn line_items(&self) -> &[LineItem] {
        match self {
            Self::Receipt(r) => &r.line_items,
            _ => &[],
        }
    }

    /// The purchaser behind this record, if the kind carries one.
    pub fn purchaser_id(&self) -> Option<Uuid> {
        match self {
            Self::Reimbursement(r) => r.purchaser_id,
            _ => None,
        }
    }

    /// Whether this record can act as a value source: it carries an
    /// amount or at least one line item.
    pub fn has_monetary_value(&self) -> bool {
        self.amount().is_some() || !self.line_items().is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Static per-kind field maps: target form field → context field.
//!
//! The maps are the single declarative artifact that decides which form
//! fields the context can fill. A kind with an empty map never consumes
//! context values — the receipt, as the pure value source, is the
//! prominent case.

use crate::records::models::EntityKind;

/// A field of the resolved relationship context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextField {
    TotalAmount,
    Description,
    Date,
    Currency,
    Category,
}

/// The autofill map for one record kind.
pub fn field_map(kind: EntityKind) -> &'static [(&'static str, ContextField)] {
    match kind {
        EntityKind::Transaction => &[
            ("amount", ContextField::TotalAmount),
            ("description", ContextField::Description),
            ("date", ContextField::Date),
            ("currency", ContextField::Currency),
            ("category", ContextField::Category),
        ],
        EntityKind::Reimbursement => &[
            ("total_amount", ContextField::TotalAmount),
            ("description", ContextField::Description),
            ("request_date", ContextField::Date),
            ("currency", ContextField::Currency),
            ("category", ContextField::Category),
        ],
        EntityKind::Budget => &[
            ("planned_amount", ContextField::TotalAmount),
            ("description", ContextField::Description),
            ("currency", ContextField::Currency),
            ("category", ContextField::Category),
        ],
        EntityKind::Inventory => &[
            ("purchase_price", ContextField::TotalAmount),
            ("purchase_date", ContextField::Date),
            ("currency", ContextField::Currency),
            ("category", ContextField::Category),
        ],
        // Value sources and non-treasury kinds consume nothing.
        EntityKind::Receipt
        | EntityKind::Minute
        | EntityKind::News
        | EntityKind::Faq
        | EntityKind::Poll
        | EntityKind::Social
        | EntityKind::Event
        | EntityKind::Submission
        | EntityKind::Mail => &[],
    }
}

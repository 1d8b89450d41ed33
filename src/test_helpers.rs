//! Test helper factories
//!
//! Convenience functions for creating test records with sensible
//! defaults. Tests override individual fields as needed.
#![allow(dead_code)]

use crate::records::models::{
    Budget, LineItem, Minute, Receipt, RecordStatus, Reimbursement, Transaction,
    TransactionDirection,
};
use chrono::NaiveDate;
use std::sync::Mutex;
use uuid::Uuid;

/// Serializes tests that mutate process-global environment variables.
/// Env vars are shared across the whole test binary, so every test that
/// sets or clears `PORTAL_*` vars must hold this lock.
pub static ENV_LOCK: Mutex<()> = Mutex::new(());

/// An OCR-processed hardware-store receipt with one durable line item.
pub fn test_receipt() -> Receipt {
    Receipt {
        id: Uuid::new_v4(),
        name: "Bauhaus receipt".to_string(),
        store_name: Some("Bauhaus".to_string()),
        file_name: Some("scan-0042.pdf".to_string()),
        total_amount: Some(84.9),
        currency: Some("EUR".to_string()),
        receipt_date: NaiveDate::from_ymd_opt(2026, 3, 14),
        category: Some("maintenance".to_string()),
        line_items: vec![LineItem {
            name: "Cordless drill".to_string(),
            quantity: 1,
            unit_price: 84.9,
            total_price: 84.9,
        }],
        ocr_processed: true,
        status: RecordStatus::Active,
        created_at: chrono::Utc::now(),
    }
}

pub fn test_transaction() -> Transaction {
    Transaction {
        id: Uuid::new_v4(),
        description: "Garden party expense".to_string(),
        amount: Some(12.5),
        currency: Some("EUR".to_string()),
        transaction_date: None,
        category: None,
        direction: TransactionDirection::Expense,
        status: RecordStatus::Active,
        created_at: chrono::Utc::now(),
    }
}

pub fn test_reimbursement() -> Reimbursement {
    Reimbursement {
        id: Uuid::new_v4(),
        description: "Garden party supplies".to_string(),
        total_amount: Some(84.9),
        currency: Some("EUR".to_string()),
        request_date: None,
        category: None,
        purchaser_id: None,
        purchaser_name: None,
        iban: None,
        status: RecordStatus::Active,
        created_at: chrono::Utc::now(),
    }
}

pub fn test_budget() -> Budget {
    Budget {
        id: Uuid::new_v4(),
        name: "Community budget 2026".to_string(),
        description: None,
        planned_amount: Some(500.0),
        currency: Some("EUR".to_string()),
        category: Some("community".to_string()),
        year: Some(2026),
        status: RecordStatus::Active,
        created_at: chrono::Utc::now(),
    }
}

pub fn test_minute() -> Minute {
    Minute {
        id: Uuid::new_v4(),
        title: "March committee meeting".to_string(),
        body: Some(
            "Discussed the spring flea market and the purchase of a new grill.".to_string(),
        ),
        meeting_date: NaiveDate::from_ymd_opt(2026, 3, 5),
        status: RecordStatus::Active,
        created_at: chrono::Utc::now(),
    }
}

//! Integration tests for the draft-entity analyzer, exercised through
//! the public API with a scripted generator.

use committee_portal::ai::MockTextGenerator;
use committee_portal::analyzer::{AnalysisOutcome, TRANSACTION_SUGGESTION_CONFIDENCE};
use committee_portal::records::{
    EntityKind, PortalRecord, Receipt, RecordStatus, Reimbursement,
};
use committee_portal::relations::RelationMetadata;
use committee_portal::AppState;
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

fn reimbursement() -> PortalRecord {
    PortalRecord::Reimbursement(Reimbursement {
        id: Uuid::new_v4(),
        description: "Flea market supplies".to_string(),
        total_amount: Some(64.0),
        currency: Some("EUR".to_string()),
        request_date: NaiveDate::from_ymd_opt(2026, 5, 2),
        category: Some("events".to_string()),
        purchaser_id: None,
        purchaser_name: None,
        iban: None,
        status: RecordStatus::Active,
        created_at: chrono::Utc::now(),
    })
}

fn processed_receipt() -> PortalRecord {
    PortalRecord::Receipt(Receipt {
        id: Uuid::new_v4(),
        name: "Market receipt".to_string(),
        store_name: Some("Metro".to_string()),
        file_name: None,
        total_amount: Some(64.0),
        currency: Some("EUR".to_string()),
        receipt_date: NaiveDate::from_ymd_opt(2026, 5, 1),
        category: Some("events".to_string()),
        line_items: vec![],
        ocr_processed: true,
        status: RecordStatus::Active,
        created_at: chrono::Utc::now(),
    })
}

#[tokio::test]
async fn reimbursement_without_transaction_yields_exactly_one_draft_transaction() {
    let state = AppState::in_memory();
    let source = reimbursement();
    state.store.create_record(&source).await.unwrap();

    let report = state
        .analyzer()
        .analyze(source.entity_ref(), Uuid::new_v4())
        .await
        .unwrap();

    assert!(report.success);
    assert_eq!(report.outcome(), AnalysisOutcome::Success);
    assert_eq!(report.created.len(), 1);
    assert_eq!(report.created[0].kind, EntityKind::Transaction);

    // The draft carries the non-final status...
    let draft = state
        .store
        .get_record(&report.created[0])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(draft.status(), RecordStatus::Draft);
    assert_eq!(draft.amount(), Some(64.0));

    // ...and exactly one edge links it back to the reimbursement, with
    // the rule's fixed confidence.
    let edges = state
        .store
        .relations_for(&source.entity_ref())
        .await
        .unwrap();
    assert_eq!(edges.len(), 1);
    let metadata = RelationMetadata::from_value(edges[0].metadata.as_ref().unwrap()).unwrap();
    assert!(metadata.ai_created);
    assert!((metadata.confidence - TRANSACTION_SUGGESTION_CONFIDENCE).abs() < f64::EPSILON);
    assert!((TRANSACTION_SUGGESTION_CONFIDENCE - 0.95).abs() < f64::EPSILON);
}

#[tokio::test]
async fn confidence_gate_discards_065_and_creates_071() {
    let state = AppState::in_memory();
    let source = processed_receipt();
    state.store.create_record(&source).await.unwrap();

    let batch = r#"[
        {"entityType": "transaction", "name": "Weak guess", "data": {}, "confidence": 0.65, "reasoning": "uncertain"},
        {"entityType": "transaction", "name": "Solid guess", "data": {"amount": 64.0}, "confidence": 0.71, "reasoning": "total matches"}
    ]"#;
    let state = state.with_generator(Arc::new(MockTextGenerator::always(batch)));

    let report = state
        .analyzer()
        .analyze(source.entity_ref(), Uuid::new_v4())
        .await
        .unwrap();

    assert_eq!(report.suggestions_considered, 2);
    assert_eq!(report.created.len(), 1);
    let draft = state
        .store
        .get_record(&report.created[0])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(draft.label(), "Solid guess");
    assert_eq!(draft.status(), RecordStatus::Draft);
}

#[tokio::test]
async fn garbage_generator_output_discards_the_whole_batch() {
    let state = AppState::in_memory()
        .with_generator(Arc::new(MockTextGenerator::always("happy to help!")));
    let source = processed_receipt();
    state.store.create_record(&source).await.unwrap();

    let report = state
        .analyzer()
        .analyze(source.entity_ref(), Uuid::new_v4())
        .await
        .unwrap();

    assert!(!report.success);
    assert!(report.created.is_empty());
    assert_eq!(report.outcome(), AnalysisOutcome::Failed);
}

#[tokio::test]
async fn draft_follows_normal_lifecycle_after_confirmation() {
    let state = AppState::in_memory();
    let source = reimbursement();
    state.store.create_record(&source).await.unwrap();

    let report = state
        .analyzer()
        .analyze(source.entity_ref(), Uuid::new_v4())
        .await
        .unwrap();
    let draft_ref = report.created[0];

    // A human confirms the draft: it becomes a normal active record.
    let mut record = state
        .store
        .get_record(&draft_ref)
        .await
        .unwrap()
        .unwrap();
    if let PortalRecord::Transaction(tx) = &mut record {
        tx.status = RecordStatus::Active;
    }
    state.store.update_record(&record).await.unwrap();

    let confirmed = state
        .store
        .get_record(&draft_ref)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(confirmed.status(), RecordStatus::Active);
}

#[tokio::test]
async fn rerunning_analysis_after_linking_creates_no_second_transaction() {
    let state = AppState::in_memory();
    let source = reimbursement();
    state.store.create_record(&source).await.unwrap();

    let analyzer = state.analyzer();
    let first = analyzer
        .analyze(source.entity_ref(), Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(first.created.len(), 1);

    // The draft transaction is now linked; the rule no longer fires.
    let second = analyzer
        .analyze(source.entity_ref(), Uuid::new_v4())
        .await
        .unwrap();
    assert!(second.created.is_empty());
    assert_eq!(second.outcome(), AnalysisOutcome::Success);
}

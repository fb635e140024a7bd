//! Integration tests for composing and submitting transactions.

mod common;

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use serde_json::json;

use common::{ScriptedRemote, cache, list_ok, session};
use puente_core::cache::EntityKind;
use puente_core::ledger::{RawMovementLine, SaleDetails, ValidationPolicy};
use puente_data::{
    Account, ComposerState, TransactionComposer, TransactionGateway, TransactionRepository,
};
use puente_shared::Session;

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn accounts() -> Vec<Account> {
    vec![
        Account {
            id: "10".to_string(),
            code: "1101".to_string(),
            name: "Caja".to_string(),
            ..Account::default()
        },
        Account {
            id: "20".to_string(),
            code: "4101".to_string(),
            name: "Ingresos por terapia".to_string(),
            ..Account::default()
        },
    ]
}

fn composer(remote: &std::sync::Arc<ScriptedRemote>) -> TransactionComposer<ScriptedRemote> {
    let mut composer = TransactionComposer::new(
        TransactionGateway::new(remote.clone()),
        ValidationPolicy::default(),
        date(),
        "INGRESO",
    );
    composer.set_header(date(), "INGRESO", Some("Cuota marzo".to_string()), None);
    composer.add_line(RawMovementLine::new("10", "150.00", 0));
    composer.add_line(RawMovementLine::new("20", 0, 150));
    composer
}

fn committed_row() -> serde_json::Value {
    json!({"ok": true, "rows": [{
        "status": "ok",
        "message": "Transacción registrada",
        "data": {"id_transaccion": 88, "movimientos_ids": [501, 502]}
    }]})
}

#[tokio::test]
async fn test_generic_submit_goes_through_batch() {
    let remote = ScriptedRemote::new();
    let (_, cache) = cache();
    remote.respond(committed_row());
    remote.respond(list_ok(json!([{"id_transaccion": 88, "tipo": "INGRESO"}])));

    let mut transactions = TransactionRepository::new(remote.clone(), cache.clone(), session());
    let mut composer = composer(&remote);
    let committed = composer
        .submit(&mut transactions, &accounts())
        .await
        .unwrap();

    assert_eq!(committed.transaction_id.as_deref(), Some("88"));
    assert_eq!(
        composer.state(),
        &ComposerState::Committed {
            transaction_id: Some("88".to_string())
        }
    );

    let calls = remote.calls();
    assert_eq!(calls.len(), 2);
    let (procedure, payload) = &calls[0];
    assert_eq!(procedure, "transacciones_crear_lote");
    assert_eq!(payload["session_id"], json!("sess-1"));
    assert_eq!(payload["detener_en_error"], json!(true));
    assert_eq!(payload["transacciones"][0]["fecha"], json!("2026-03-02"));
    assert_eq!(payload["transacciones"][0]["descripcion"], json!("Cuota marzo"));
    assert_eq!(
        payload["transacciones"][0]["movimientos"],
        json!([
            {"id_cuenta": "10", "debe": "150.00", "haber": "0"},
            {"id_cuenta": "20", "debe": "0", "haber": "150"}
        ])
    );
    assert_eq!(calls[1].0, "transacciones_listar");

    let cached = cache.get("sess-1", EntityKind::Transactions, "88").unwrap();
    assert_eq!(cached["description"], json!("Cuota marzo"));
    assert_eq!(cached["lines"][0]["account_code"], json!("1101"));
    assert_eq!(cached["lines"][1]["id"], json!("502"));

    let listed = transactions.find("88").unwrap();
    assert_eq!(listed.description.as_deref(), Some("Cuota marzo"));
    assert_eq!(listed.lines.len(), 2);
}

#[tokio::test]
async fn test_sale_submit_uses_sale_procedure() {
    let remote = ScriptedRemote::new();
    let (_, cache) = cache();
    remote.respond(json!({"ok": true, "rows": [{
        "status": "ok",
        "data": {
            "id_transaccion": 90,
            "transaccion": {"id_transaccion": 90, "fecha": "2026-03-02", "tipo": "VENTA"}
        }
    }]}));
    remote.respond(list_ok(json!([])));

    let mut transactions = TransactionRepository::new(remote.clone(), cache, session());
    let mut composer = composer(&remote);
    composer.set_header(date(), "VENTA", None, Some("F-001".to_string()));
    composer.set_sale(SaleDetails {
        item_id: Some("7".to_string()),
        quantity: Some(dec!(2)),
        appointment_id: None,
    });

    composer
        .submit(&mut transactions, &accounts())
        .await
        .unwrap();

    let (procedure, payload) = remote.calls().remove(0);
    assert_eq!(procedure, "ventas_registrar");
    assert_eq!(payload["id_producto"], json!("7"));
    assert_eq!(payload["cantidad"], json!("2"));
    assert_eq!(payload["referencia"], json!("F-001"));
    assert!(payload.get("id_cita").is_none());

    let listed = transactions.find("90").unwrap();
    assert_eq!(listed.transaction_type, "VENTA");
}

#[tokio::test]
async fn test_batch_record_keeps_draft_lines_and_labels() {
    let remote = ScriptedRemote::new();
    let (_, cache) = cache();
    remote.respond(json!({"ok": true, "rows": [{
        "status": "ok",
        "data": {
            "id_transaccion": 88,
            "movimientos_ids": [501, 502],
            "transaccion": {"id_transaccion": 88, "tipo": "INGRESO", "descripcion": "Cuota marzo"}
        }
    }]}));

    let mut transactions = TransactionRepository::new(remote.clone(), cache.clone(), session());
    let mut composer = composer(&remote);
    composer
        .submit(&mut transactions, &accounts())
        .await
        .unwrap();

    let cached = cache.get("sess-1", EntityKind::Transactions, "88").unwrap();
    assert_eq!(cached["date"], json!("2026-03-02"));
    assert_eq!(cached["description"], json!("Cuota marzo"));
    assert_eq!(cached["lines"][0]["id"], json!("501"));
    assert_eq!(cached["lines"][0]["account_code"], json!("1101"));
    assert_eq!(cached["lines"][0]["account_name"], json!("Caja"));
    assert_eq!(cached["lines"][1]["id"], json!("502"));
    assert_eq!(cached["lines"][1]["account_code"], json!("4101"));
    assert_eq!(cached["lines"][1]["account_name"], json!("Ingresos por terapia"));
}

#[tokio::test]
async fn test_sale_record_keeps_draft_lines_and_labels() {
    let remote = ScriptedRemote::new();
    let (_, cache) = cache();
    remote.respond(json!({"ok": true, "rows": [{
        "status": "ok",
        "data": {
            "id_transaccion": 90,
            "movimientos_ids": [601, 602],
            "transaccion": {"id_transaccion": 90, "tipo": "VENTA", "referencia": "F-001"}
        }
    }]}));

    let mut transactions = TransactionRepository::new(remote.clone(), cache.clone(), session());
    let mut composer = composer(&remote);
    composer.set_header(date(), "VENTA", Some("Sesión".to_string()), Some("F-001".to_string()));
    composer.set_sale(SaleDetails {
        item_id: Some("7".to_string()),
        quantity: Some(dec!(1)),
        appointment_id: None,
    });

    let committed = composer
        .submit(&mut transactions, &accounts())
        .await
        .unwrap();
    assert_eq!(committed.line_ids, vec!["601", "602"]);

    let cached = cache.get("sess-1", EntityKind::Transactions, "90").unwrap();
    assert_eq!(cached["transaction_type"], json!("VENTA"));
    assert_eq!(cached["date"], json!("2026-03-02"));
    assert_eq!(cached["description"], json!("Sesión"));
    assert_eq!(cached["lines"].as_array().map(Vec::len), Some(2));
    assert_eq!(cached["lines"][0]["id"], json!("601"));
    assert_eq!(cached["lines"][0]["account_code"], json!("1101"));
    assert_eq!(cached["lines"][1]["id"], json!("602"));
    assert_eq!(cached["lines"][1]["account_name"], json!("Ingresos por terapia"));
}

#[tokio::test]
async fn test_empty_batch_result_is_not_a_commit() {
    let remote = ScriptedRemote::new();
    let (_, cache) = cache();
    let response = json!({"ok": true, "rows": []});
    remote.respond(response.clone());

    let mut transactions = TransactionRepository::new(remote.clone(), cache.clone(), session());
    let mut composer = composer(&remote);
    let err = composer
        .submit(&mut transactions, &accounts())
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "OPERATION_FAILED");
    assert_eq!(err.raw_response(), Some(&response));
    assert!(matches!(composer.state(), ComposerState::Failed { .. }));
    assert_eq!(remote.calls().len(), 1);
    assert!(cache.read_all("sess-1", EntityKind::Transactions).is_empty());
}

#[tokio::test]
async fn test_sale_without_item_rejected_locally() {
    let remote = ScriptedRemote::new();
    let (_, cache) = cache();
    let mut transactions = TransactionRepository::new(remote.clone(), cache, session());
    let mut composer = composer(&remote);
    composer.set_header(date(), "venta", None, None);

    let err = composer
        .submit(&mut transactions, &accounts())
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "VALIDATION_ERROR");
    assert!(matches!(composer.state(), ComposerState::Rejected { .. }));
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn test_uniform_credits_rejected_then_editable() {
    let remote = ScriptedRemote::new();
    let (_, cache) = cache();
    let mut transactions = TransactionRepository::new(remote.clone(), cache, session());
    let mut composer = composer(&remote);
    composer
        .replace_line(1, RawMovementLine::new("20", 0, 75))
        .unwrap();
    composer.add_line(RawMovementLine::new("21", 0, 75));

    let err = composer
        .submit(&mut transactions, &accounts())
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "VALIDATION_ERROR");
    match composer.state() {
        ComposerState::Rejected { reason } => assert!(reason.contains("same amount")),
        other => panic!("unexpected state {other}"),
    }
    assert!(remote.calls().is_empty());

    composer.remove_line(2);
    assert_eq!(composer.state(), &ComposerState::Draft);
    assert_eq!(composer.draft().lines.len(), 2);
}

#[tokio::test]
async fn test_uniform_credits_allowed_when_policy_off() {
    let remote = ScriptedRemote::new();
    let (_, cache) = cache();
    remote.respond(committed_row());
    remote.respond(list_ok(json!([])));

    let mut transactions = TransactionRepository::new(remote.clone(), cache, session());
    let mut composer = TransactionComposer::new(
        TransactionGateway::new(remote.clone()),
        ValidationPolicy {
            reject_uniform_credits: false,
        },
        date(),
        "INGRESO",
    );
    composer.add_line(RawMovementLine::new("10", 150, 0));
    composer.add_line(RawMovementLine::new("20", 0, 75));
    composer.add_line(RawMovementLine::new("21", 0, 75));

    assert!(composer.submit(&mut transactions, &accounts()).await.is_ok());
}

#[tokio::test]
async fn test_single_line_rejected() {
    let remote = ScriptedRemote::new();
    let (_, cache) = cache();
    let mut transactions = TransactionRepository::new(remote.clone(), cache, session());
    let mut composer = TransactionComposer::new(
        TransactionGateway::new(remote.clone()),
        ValidationPolicy::default(),
        date(),
        "INGRESO",
    );
    composer.add_line(RawMovementLine::new("10", 100, 0));
    composer.add_line(RawMovementLine::new("", 0, 100));

    let err = composer
        .submit(&mut transactions, &accounts())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("at least 2 movements"));
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn test_backend_rejection_keeps_draft_and_cache_clean() {
    let remote = ScriptedRemote::new();
    let (_, cache) = cache();
    remote.respond(json!({"ok": true, "rows": [{"status": "error", "message": "Cuenta inactiva"}]}));

    let mut transactions = TransactionRepository::new(remote.clone(), cache.clone(), session());
    let mut composer = composer(&remote);
    let err = composer
        .submit(&mut transactions, &accounts())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Cuenta inactiva");
    assert_eq!(
        composer.state(),
        &ComposerState::Failed {
            message: "Cuenta inactiva".to_string()
        }
    );
    assert_eq!(composer.draft().lines.len(), 2);
    assert_eq!(remote.calls().len(), 1);
    assert!(transactions.items().is_empty());
    assert!(cache.read_all("sess-1", EntityKind::Transactions).is_empty());
}

#[tokio::test]
async fn test_outer_failure_message_verbatim() {
    let remote = ScriptedRemote::new();
    let (_, cache) = cache();
    remote.respond(json!({"ok": false, "message": "Sesión expirada"}));

    let mut transactions = TransactionRepository::new(remote.clone(), cache, session());
    let mut composer = composer(&remote);
    let err = composer
        .submit(&mut transactions, &accounts())
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "OPERATION_FAILED");
    assert_eq!(
        composer.state(),
        &ComposerState::Failed {
            message: "Sesión expirada".to_string()
        }
    );
}

#[tokio::test]
async fn test_failed_refresh_does_not_fail_commit() {
    let remote = ScriptedRemote::new();
    let (_, cache) = cache();
    remote.respond(committed_row());

    let mut transactions = TransactionRepository::new(remote.clone(), cache, session());
    let mut composer = composer(&remote);
    let committed = composer
        .submit(&mut transactions, &accounts())
        .await
        .unwrap();

    assert_eq!(committed.line_ids, vec!["501", "502"]);
    assert_eq!(remote.calls().len(), 2);
    assert!(transactions.last_error().is_some());
    assert_eq!(transactions.items().len(), 1);
}

#[tokio::test]
async fn test_missing_session_rejected_before_validation() {
    let remote = ScriptedRemote::new();
    let (_, cache) = cache();
    let mut transactions =
        TransactionRepository::new(remote.clone(), cache, Session::new("  ", None));
    let mut composer = composer(&remote);

    let err = composer
        .submit(&mut transactions, &accounts())
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "PRECONDITION_FAILED");
    assert_eq!(composer.state(), &ComposerState::Draft);
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn test_committed_composer_needs_reset() {
    let remote = ScriptedRemote::new();
    let (_, cache) = cache();
    remote.respond(committed_row());
    remote.respond(list_ok(json!([])));

    let mut transactions = TransactionRepository::new(remote.clone(), cache, session());
    let mut composer = composer(&remote);
    composer
        .submit(&mut transactions, &accounts())
        .await
        .unwrap();

    let err = composer
        .submit(&mut transactions, &accounts())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "PRECONDITION_FAILED");
    assert_eq!(remote.calls().len(), 2);

    composer.reset(date(), "EGRESO");
    assert_eq!(composer.state(), &ComposerState::Draft);
    assert!(composer.draft().lines.is_empty());
    assert_eq!(composer.preview_totals().difference(), dec!(0));
}

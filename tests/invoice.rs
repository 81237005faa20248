//! Invoice/transaction allocator tests

mod common;

use common::*;
use darkroom::payments::invoice::{allocate_transaction, INVOICE_PREFIX};

#[test]
fn test_first_allocation_starts_at_001() {
    let conn = setup_test_db();
    let user = create_test_user(&conn, "testuser", false);
    let order = create_test_order(&conn, user.id, TEST_RECEIVER_EMAIL);

    let record = allocate_transaction(&conn, &order).expect("Allocation failed");

    assert_eq!(record.order_id, Some(order.id));
    assert_eq!(record.invoice_id.as_deref(), Some("order-inv#001"));
    assert!(record.txn_id.is_none());
}

#[test]
fn test_reallocation_reuses_pending_record() {
    let conn = setup_test_db();
    let user = create_test_user(&conn, "testuser", false);
    let order = create_test_order(&conn, user.id, TEST_RECEIVER_EMAIL);

    let first = allocate_transaction(&conn, &order).expect("Allocation failed");
    let second = allocate_transaction(&conn, &order).expect("Allocation failed");

    // The record has no gateway txn_id yet, so it is still awaiting payment
    // and must be reused rather than duplicated
    assert_eq!(first.id, second.id);
    assert_eq!(first.invoice_id, second.invoice_id);
    assert_eq!(queries::count_transactions(&conn).unwrap(), 1);
}

#[test]
fn test_allocation_after_payment_increments_counter() {
    let conn = setup_test_db();
    let user = create_test_user(&conn, "testuser", false);
    let order = create_test_order(&conn, user.id, TEST_RECEIVER_EMAIL);

    let first = allocate_transaction(&conn, &order).expect("Allocation failed");
    assert_eq!(first.invoice_id.as_deref(), Some("order-inv#001"));

    queries::set_transaction_txn_id(&conn, first.id, "123").expect("Update failed");

    let second = allocate_transaction(&conn, &order).expect("Allocation failed");
    assert_eq!(second.invoice_id.as_deref(), Some("order-inv#002"));
    assert_eq!(queries::count_transactions(&conn).unwrap(), 2);
}

#[test]
fn test_counter_padding_preserved() {
    let conn = setup_test_db();
    let user = create_test_user(&conn, "testuser", false);
    let order = create_test_order(&conn, user.id, TEST_RECEIVER_EMAIL);

    // Seed a record as if nine payments had already happened
    let record = queries::create_transaction(&conn, "order-inv#009", order.id)
        .expect("Insert failed");
    queries::set_transaction_txn_id(&conn, record.id, "txn-9").expect("Update failed");

    let next = allocate_transaction(&conn, &order).expect("Allocation failed");
    assert_eq!(next.invoice_id.as_deref(), Some("order-inv#010"));
}

#[test]
fn test_global_invoice_collision_gets_random_prefix() {
    let conn = setup_test_db();
    let user = create_test_user(&conn, "testuser", false);
    let order = create_test_order(&conn, user.id, TEST_RECEIVER_EMAIL);
    let other_order = create_test_order(&conn, user.id, TEST_RECEIVER_EMAIL);

    let first = allocate_transaction(&conn, &order).expect("Allocation failed");
    assert_eq!(first.invoice_id.as_deref(), Some("order-inv#001"));

    // The other order also starts at counter 001, which is already taken
    // globally, so the allocator disambiguates with a random 3-digit prefix
    let second = allocate_transaction(&conn, &other_order).expect("Allocation failed");
    let invoice = second.invoice_id.expect("Invoice id missing");

    assert_ne!(invoice, "order-inv#001");
    assert!(invoice.starts_with(INVOICE_PREFIX));

    let remainder = invoice.split('#').next_back().unwrap();
    assert_eq!(remainder.len(), 6);
    assert!(remainder.chars().all(|c| c.is_ascii_digit()));
    assert!(remainder.ends_with("001"));
}

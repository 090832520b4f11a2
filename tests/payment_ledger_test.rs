mod common;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use common::TestApp;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use shopflow::{
    entities::{BillStatus, PaymentMethod},
    errors::ServiceError,
    services::{billing::UpdateBillStatusInput, payments::RecordPaymentInput},
};
use uuid::Uuid;

fn payment(amount: Decimal) -> RecordPaymentInput {
    RecordPaymentInput {
        amount,
        payment_date: None,
        payment_method: PaymentMethod::Cash,
        notes: None,
    }
}

/// Seeds the 27.54 worked-example bill for owner A and returns its id.
async fn worked_example_bill(app: &TestApp) -> Uuid {
    let owner = app.owner_a;
    let customer = app.seed_customer(owner, "Ravi Builders").await;
    let cement = app.seed_item(owner, "Cement 50kg", 50, dec!(10.00)).await;
    let sand = app.seed_item(owner, "River sand", 20, dec!(5.50)).await;
    app.seed_bill(owner, customer.id, &[(cement.id, 2), (sand.id, 1)], dec!(8))
        .await
        .bill
        .id
}

#[tokio::test]
async fn payments_reduce_outstanding_until_settled() {
    let app = TestApp::new().await;
    let bill_id = worked_example_bill(&app).await;
    let ledger = &app.state.services.payments;

    let first = ledger
        .record_payment(app.owner_a, bill_id, payment(dec!(20.00)))
        .await
        .unwrap();
    assert_eq!(first.payment.amount, dec!(20.00));
    assert_eq!(first.balance.paid, dec!(20.00));
    assert_eq!(first.balance.outstanding, dec!(7.54));

    let too_much = ledger
        .record_payment(app.owner_a, bill_id, payment(dec!(7.55)))
        .await
        .unwrap_err();
    assert_matches!(too_much, ServiceError::ValidationError(msg) if msg.contains("7.54"));

    let last = ledger
        .record_payment(app.owner_a, bill_id, payment(dec!(7.54)))
        .await
        .unwrap();
    assert_eq!(last.balance.outstanding, dec!(0));
    assert!(last.balance.is_settled());

    let after_settled = ledger
        .record_payment(app.owner_a, bill_id, payment(dec!(0.01)))
        .await
        .unwrap_err();
    assert_matches!(after_settled, ServiceError::ValidationError(_));

    let (_, balance) = ledger.get_balance(app.owner_a, bill_id).await.unwrap();
    assert_eq!(balance.total, dec!(27.54));
    assert_eq!(balance.paid, dec!(27.54));
    assert_eq!(balance.outstanding, dec!(0));
}

#[tokio::test]
async fn settling_a_bill_does_not_change_its_status() {
    let app = TestApp::new().await;
    let bill_id = worked_example_bill(&app).await;

    app.state
        .services
        .payments
        .record_payment(app.owner_a, bill_id, payment(dec!(27.54)))
        .await
        .unwrap();

    let bill = app
        .state
        .services
        .billing
        .get_bill(app.owner_a, bill_id)
        .await
        .unwrap();
    assert_eq!(bill.bill.status, BillStatus::Pending);
    assert_eq!(bill.bill.paid_amount, dec!(27.54));
    assert_eq!(bill.bill.outstanding_amount, dec!(0));
}

#[tokio::test]
async fn rejects_non_positive_and_sub_cent_amounts() {
    let app = TestApp::new().await;
    let bill_id = worked_example_bill(&app).await;
    let ledger = &app.state.services.payments;

    for amount in [dec!(0), dec!(-5.00), dec!(1.005)] {
        let err = ledger
            .record_payment(app.owner_a, bill_id, payment(amount))
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(_));
    }
    assert!(ledger
        .list_payments(app.owner_a, bill_id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn cancelled_bills_accept_no_payments() {
    let app = TestApp::new().await;
    let bill_id = worked_example_bill(&app).await;

    app.state
        .services
        .billing
        .update_status(
            app.owner_a,
            bill_id,
            UpdateBillStatusInput {
                status: BillStatus::Cancelled,
                notes: None,
            },
        )
        .await
        .unwrap();

    let err = app
        .state
        .services
        .payments
        .record_payment(app.owner_a, bill_id, payment(dec!(5.00)))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(msg) if msg.contains("cancelled"));
}

#[tokio::test]
async fn payments_are_listed_oldest_first_with_details() {
    let app = TestApp::new().await;
    let bill_id = worked_example_bill(&app).await;
    let ledger = &app.state.services.payments;

    ledger
        .record_payment(
            app.owner_a,
            bill_id,
            RecordPaymentInput {
                amount: dec!(5.00),
                payment_date: NaiveDate::from_ymd_opt(2024, 3, 20),
                payment_method: PaymentMethod::Upi,
                notes: Some("second instalment".into()),
            },
        )
        .await
        .unwrap();
    ledger
        .record_payment(
            app.owner_a,
            bill_id,
            RecordPaymentInput {
                amount: dec!(10.00),
                payment_date: NaiveDate::from_ymd_opt(2024, 3, 18),
                payment_method: PaymentMethod::Card,
                notes: None,
            },
        )
        .await
        .unwrap();

    let payments = ledger.list_payments(app.owner_a, bill_id).await.unwrap();
    assert_eq!(payments.len(), 2);
    assert_eq!(payments[0].payment_method, PaymentMethod::Card);
    assert_eq!(payments[1].payment_method, PaymentMethod::Upi);
    assert_eq!(payments[1].notes.as_deref(), Some("second instalment"));
}

#[tokio::test]
async fn deleting_a_bill_removes_its_payments() {
    let app = TestApp::new().await;
    let bill_id = worked_example_bill(&app).await;

    app.state
        .services
        .payments
        .record_payment(app.owner_a, bill_id, payment(dec!(10.00)))
        .await
        .unwrap();
    app.state
        .services
        .billing
        .delete_bill(app.owner_a, bill_id)
        .await
        .unwrap();

    let err = app
        .state
        .services
        .payments
        .list_payments(app.owner_a, bill_id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn other_owners_cannot_pay_a_bill() {
    let app = TestApp::new().await;
    let bill_id = worked_example_bill(&app).await;

    let err = app
        .state
        .services
        .payments
        .record_payment(app.owner_b, bill_id, payment(dec!(1.00)))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    let (_, balance) = app
        .state
        .services
        .payments
        .get_balance(app.owner_a, bill_id)
        .await
        .unwrap();
    assert_eq!(balance.paid, dec!(0));
}

use super::common::{created_response, JsonBody};
use crate::{
    auth::AuthUser,
    entities::{bill, payment, BillStatus, PaymentMethod},
    errors::ServiceError,
    money::{serde_money, round_money, Balance},
    services::payments::RecordPaymentInput,
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: Uuid,
    pub bill_id: Uuid,
    #[serde(with = "serde_money")]
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<payment::Model> for PaymentResponse {
    fn from(p: payment::Model) -> Self {
        Self {
            id: p.id,
            bill_id: p.bill_id,
            amount: round_money(p.amount),
            payment_date: p.payment_date,
            payment_method: p.payment_method,
            notes: p.notes,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub bill_id: Uuid,
    pub bill_number: String,
    pub status: BillStatus,
    #[serde(with = "serde_money")]
    pub total: Decimal,
    #[serde(with = "serde_money")]
    pub paid_amount: Decimal,
    #[serde(with = "serde_money")]
    pub outstanding_amount: Decimal,
    pub settled: bool,
}

impl BalanceResponse {
    fn new(bill: &bill::Model, balance: Balance) -> Self {
        Self {
            bill_id: bill.id,
            bill_number: bill.bill_number.clone(),
            status: bill.status,
            total: balance.total,
            paid_amount: balance.paid,
            outstanding_amount: balance.outstanding,
            settled: balance.is_settled(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceiptResponse {
    pub payment: PaymentResponse,
    #[serde(with = "serde_money")]
    pub paid_amount: Decimal,
    #[serde(with = "serde_money")]
    pub outstanding_amount: Decimal,
}

async fn record_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(bill_id): Path<Uuid>,
    JsonBody(payload): JsonBody<RecordPaymentInput>,
) -> Result<Response, ServiceError> {
    let receipt = state
        .services
        .payments
        .record_payment(user.owner_id, bill_id, payload)
        .await?;

    Ok(created_response(PaymentReceiptResponse {
        payment: receipt.payment.into(),
        paid_amount: receipt.balance.paid,
        outstanding_amount: receipt.balance.outstanding,
    }))
}

async fn list_payments(
    State(state): State<AppState>,
    user: AuthUser,
    Path(bill_id): Path<Uuid>,
) -> ApiResult<Vec<PaymentResponse>> {
    let payments = state
        .services
        .payments
        .list_payments(user.owner_id, bill_id)
        .await?;
    Ok(Json(ApiResponse::success(
        payments.into_iter().map(PaymentResponse::from).collect(),
    )))
}

async fn get_balance(
    State(state): State<AppState>,
    user: AuthUser,
    Path(bill_id): Path<Uuid>,
) -> ApiResult<BalanceResponse> {
    let (bill, balance) = state
        .services
        .payments
        .get_balance(user.owner_id, bill_id)
        .await?;
    Ok(Json(ApiResponse::success(BalanceResponse::new(
        &bill, balance,
    ))))
}

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/bills/:id/payments", get(list_payments).post(record_payment))
        .route("/bills/:id/balance", get(get_balance))
}

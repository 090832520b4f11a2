use super::common::{
    created_response, no_content_response, DateRangeParams, JsonBody, PaginatedResponse,
    PaginationParams,
};
use crate::{
    auth::AuthUser,
    entities::BillStatus,
    errors::ServiceError,
    services::billing::{
        BillDetail, BillFilter, BillLineInput, BillView, NewBill, UpdateBillStatusInput,
    },
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, patch},
    Json, Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

/// Body of `POST /bills`: a [`NewBill`] plus the customer it is for.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBillRequest {
    pub customer_id: Uuid,
    #[serde(default)]
    pub line_items: Vec<BillLineInput>,
    pub tax_rate: Option<Decimal>,
    pub notes: Option<String>,
    pub status: Option<BillStatus>,
    pub issued_on: Option<NaiveDate>,
}

impl CreateBillRequest {
    fn into_parts(self) -> (Uuid, NewBill) {
        (
            self.customer_id,
            NewBill {
                line_items: self.line_items,
                tax_rate: self.tax_rate,
                notes: self.notes,
                status: self.status,
                issued_on: self.issued_on,
            },
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillListParams {
    pub status: Option<BillStatus>,
    pub customer_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

async fn create_bill(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(payload): JsonBody<CreateBillRequest>,
) -> Result<Response, ServiceError> {
    let (customer_id, bill) = payload.into_parts();
    let created = state
        .services
        .billing
        .create_bill(user.owner_id, customer_id, bill)
        .await?;
    Ok(created_response(created))
}

async fn list_bills(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<PaginationParams>,
    Query(params): Query<BillListParams>,
) -> ApiResult<PaginatedResponse<BillView>> {
    let (page, per_page) = pagination.resolve(&state.config);
    let filter = BillFilter {
        status: params.status,
        customer_id: params.customer_id,
        from: params.from,
        to: params.to,
    };
    let (bills, total) = state
        .services
        .billing
        .list_bills(user.owner_id, filter, page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        bills, page, per_page, total,
    ))))
}

async fn bills_on_day(
    State(state): State<AppState>,
    user: AuthUser,
    Path(date): Path<NaiveDate>,
) -> ApiResult<Vec<BillView>> {
    let bills = state
        .services
        .billing
        .bills_on_day(user.owner_id, date)
        .await?;
    Ok(Json(ApiResponse::success(bills)))
}

async fn get_bill(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<BillDetail> {
    let bill = state.services.billing.get_bill(user.owner_id, id).await?;
    Ok(Json(ApiResponse::success(bill)))
}

async fn update_bill_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateBillStatusInput>,
) -> ApiResult<BillDetail> {
    let bill = state
        .services
        .billing
        .update_status(user.owner_id, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(bill)))
}

async fn delete_bill(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.billing.delete_bill(user.owner_id, id).await?;
    Ok(no_content_response())
}

/// `POST /customers/:id/bills`
pub async fn create_bill_for_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(customer_id): Path<Uuid>,
    JsonBody(bill): JsonBody<NewBill>,
) -> Result<Response, ServiceError> {
    let created = state
        .services
        .billing
        .create_bill(user.owner_id, customer_id, bill)
        .await?;
    Ok(created_response(created))
}

/// `GET /customers/:id/bills?from&to`
pub async fn customer_bill_history(
    State(state): State<AppState>,
    user: AuthUser,
    Path(customer_id): Path<Uuid>,
    Query(range): Query<DateRangeParams>,
) -> ApiResult<crate::services::billing::CustomerBillHistory> {
    let history = state
        .services
        .billing
        .customer_history(user.owner_id, customer_id, range.from, range.to)
        .await?;
    Ok(Json(ApiResponse::success(history)))
}

pub fn bill_routes() -> Router<AppState> {
    Router::new()
        .route("/bills", get(list_bills).post(create_bill))
        .route("/bills/by-date/:date", get(bills_on_day))
        .route("/bills/:id", get(get_bill).delete(delete_bill))
        .route("/bills/:id/status", patch(update_bill_status))
        .route(
            "/customers/:id/bills",
            get(customer_bill_history).post(create_bill_for_customer),
        )
}

use super::common::{
    created_response, no_content_response, JsonBody, PaginatedResponse, PaginationParams,
};
use crate::{
    auth::AuthUser,
    entities::customer,
    errors::ServiceError,
    services::customers::{CreateCustomerInput, UpdateCustomerInput},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<customer::Model> for CustomerResponse {
    fn from(c: customer::Model) -> Self {
        Self {
            id: c.id,
            name: c.name,
            email: c.email,
            phone: c.phone,
            company: c.company,
            address: c.address,
            city: c.city,
            state: c.state,
            postal_code: c.postal_code,
            notes: c.notes,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerSearchParams {
    pub search: Option<String>,
}

async fn create_customer(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(payload): JsonBody<CreateCustomerInput>,
) -> Result<Response, ServiceError> {
    let customer = state
        .services
        .customers
        .create_customer(user.owner_id, payload)
        .await?;
    Ok(created_response(CustomerResponse::from(customer)))
}

async fn list_customers(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<PaginationParams>,
    Query(params): Query<CustomerSearchParams>,
) -> ApiResult<PaginatedResponse<CustomerResponse>> {
    let (page, per_page) = pagination.resolve(&state.config);
    let (customers, total) = state
        .services
        .customers
        .list_customers(user.owner_id, params.search, page, per_page)
        .await?;
    let customers = customers.into_iter().map(CustomerResponse::from).collect();
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        customers, page, per_page, total,
    ))))
}

async fn get_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<CustomerResponse> {
    let customer = state
        .services
        .customers
        .get_customer(user.owner_id, id)
        .await?;
    Ok(Json(ApiResponse::success(customer.into())))
}

async fn update_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateCustomerInput>,
) -> ApiResult<CustomerResponse> {
    let customer = state
        .services
        .customers
        .update_customer(user.owner_id, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(customer.into())))
}

async fn delete_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state
        .services
        .customers
        .delete_customer(user.owner_id, id)
        .await?;
    Ok(no_content_response())
}

pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route(
            "/customers/:id",
            get(get_customer)
                .patch(update_customer)
                .delete(delete_customer),
        )
}

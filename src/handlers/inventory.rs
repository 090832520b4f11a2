use super::common::{
    created_response, no_content_response, JsonBody, PaginatedResponse, PaginationParams,
};
use crate::{
    auth::AuthUser,
    entities::inventory_item,
    errors::ServiceError,
    money::{round_money, serde_money},
    services::inventory::{CreateInventoryItemInput, InventoryFilter, UpdateInventoryItemInput},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemResponse {
    pub id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub unit: String,
    pub quantity: i32,
    #[serde(with = "serde_money")]
    pub unit_price: Decimal,
    pub min_stock_level: i32,
    pub low_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<inventory_item::Model> for InventoryItemResponse {
    fn from(item: inventory_item::Model) -> Self {
        let low_stock = item.is_low_stock();
        Self {
            id: item.id,
            name: item.name,
            sku: item.sku,
            category: item.category,
            description: item.description,
            unit: item.unit,
            quantity: item.quantity,
            unit_price: round_money(item.unit_price),
            min_stock_level: item.min_stock_level,
            low_stock,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryListParams {
    pub search: Option<String>,
    #[serde(default)]
    pub low_stock: bool,
}

async fn create_item(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(payload): JsonBody<CreateInventoryItemInput>,
) -> Result<Response, ServiceError> {
    let item = state
        .services
        .inventory
        .create_item(user.owner_id, payload)
        .await?;
    Ok(created_response(InventoryItemResponse::from(item)))
}

async fn list_items(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<PaginationParams>,
    Query(params): Query<InventoryListParams>,
) -> ApiResult<PaginatedResponse<InventoryItemResponse>> {
    let (page, per_page) = pagination.resolve(&state.config);
    let filter = InventoryFilter {
        search: params.search,
        low_stock: params.low_stock,
    };
    let (items, total) = state
        .services
        .inventory
        .list_items(user.owner_id, filter, page, per_page)
        .await?;
    let items = items.into_iter().map(InventoryItemResponse::from).collect();
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, page, per_page, total,
    ))))
}

async fn list_low_stock(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<InventoryItemResponse>> {
    let items = state
        .services
        .inventory
        .list_low_stock(user.owner_id)
        .await?;
    Ok(Json(ApiResponse::success(
        items.into_iter().map(InventoryItemResponse::from).collect(),
    )))
}

async fn get_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<InventoryItemResponse> {
    let item = state.services.inventory.get_item(user.owner_id, id).await?;
    Ok(Json(ApiResponse::success(item.into())))
}

async fn update_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateInventoryItemInput>,
) -> ApiResult<InventoryItemResponse> {
    let item = state
        .services
        .inventory
        .update_item(user.owner_id, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(item.into())))
}

async fn delete_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state
        .services
        .inventory
        .delete_item(user.owner_id, id)
        .await?;
    Ok(no_content_response())
}

pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(list_items).post(create_item))
        .route("/inventory/low-stock", get(list_low_stock))
        .route(
            "/inventory/:id",
            get(get_item).patch(update_item).delete(delete_item),
        )
}

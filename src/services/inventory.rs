use crate::{
    db::DatabaseAccess,
    entities::{bill_line_item, inventory_item},
    errors::ServiceError,
    money::{has_money_scale, round_money, MAX_UNIT_PRICE},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Owner-scoped stock records. Billing reads prices from here and moves quantities
/// through [`InventoryService::adjust_quantity`].
#[derive(Clone)]
pub struct InventoryService {
    db: DatabaseAccess,
    default_min_stock_level: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInventoryItemInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 64))]
    pub sku: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 32))]
    pub unit: Option<String>,
    #[serde(default)]
    pub quantity: i32,
    pub unit_price: Decimal,
    #[validate(range(min = 0))]
    pub min_stock_level: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInventoryItemInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub sku: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 32))]
    pub unit: Option<String>,
    pub quantity: Option<i32>,
    pub unit_price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub min_stock_level: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct InventoryFilter {
    pub search: Option<String>,
    pub low_stock: bool,
}

fn check_unit_price(price: Decimal) -> Result<Decimal, ServiceError> {
    if price.is_sign_negative() {
        return Err(ServiceError::ValidationError(
            "unitPrice must not be negative".to_string(),
        ));
    }
    if !has_money_scale(price) {
        return Err(ServiceError::ValidationError(
            "unitPrice must have at most two decimal places".to_string(),
        ));
    }
    if price > MAX_UNIT_PRICE {
        return Err(ServiceError::ValidationError(format!(
            "unitPrice must not exceed {}",
            MAX_UNIT_PRICE
        )));
    }
    Ok(round_money(price))
}

fn low_stock_condition() -> Condition {
    Condition::all().add(
        Expr::col(inventory_item::Column::Quantity)
            .lte(Expr::col(inventory_item::Column::MinStockLevel)),
    )
}

impl InventoryService {
    pub fn new(db: DatabaseAccess, default_min_stock_level: i32) -> Self {
        Self {
            db,
            default_min_stock_level,
        }
    }

    /// Loads an item only if it belongs to `owner_id`.
    pub async fn find_owned<C: ConnectionTrait>(
        conn: &C,
        owner_id: Uuid,
        item_id: Uuid,
    ) -> Result<inventory_item::Model, ServiceError> {
        inventory_item::Entity::find_by_id(item_id)
            .filter(inventory_item::Column::OwnerId.eq(owner_id))
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Inventory item", item_id))
    }

    /// Applies a relative stock change in a single UPDATE so concurrent adjustments
    /// never overwrite each other. No floor is enforced.
    pub async fn adjust_quantity<C: ConnectionTrait>(
        conn: &C,
        owner_id: Uuid,
        item_id: Uuid,
        delta: i32,
    ) -> Result<(), ServiceError> {
        let result = inventory_item::Entity::update_many()
            .col_expr(
                inventory_item::Column::Quantity,
                Expr::col(inventory_item::Column::Quantity).add(delta),
            )
            .col_expr(inventory_item::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(inventory_item::Column::Id.eq(item_id))
            .filter(inventory_item::Column::OwnerId.eq(owner_id))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Inventory item", item_id));
        }
        Ok(())
    }

    #[instrument(skip(self, input), fields(owner_id = %owner_id))]
    pub async fn create_item(
        &self,
        owner_id: Uuid,
        input: CreateInventoryItemInput,
    ) -> Result<inventory_item::Model, ServiceError> {
        input.validate()?;
        let unit_price = check_unit_price(input.unit_price)?;
        let now = Utc::now();

        let item = inventory_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(owner_id),
            name: Set(input.name.trim().to_string()),
            sku: Set(input.sku),
            category: Set(input.category),
            description: Set(input.description),
            unit: Set(input.unit.unwrap_or_else(|| "piece".to_string())),
            quantity: Set(input.quantity),
            unit_price: Set(unit_price),
            min_stock_level: Set(input
                .min_stock_level
                .unwrap_or(self.default_min_stock_level)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.get_pool())
        .await?;

        info!(item_id = %item.id, "Inventory item created");
        Ok(item)
    }

    #[instrument(skip(self))]
    pub async fn get_item(
        &self,
        owner_id: Uuid,
        item_id: Uuid,
    ) -> Result<inventory_item::Model, ServiceError> {
        Self::find_owned(self.db.get_pool(), owner_id, item_id).await
    }

    /// Returns one page of items plus the total number of matching items.
    #[instrument(skip(self, filter))]
    pub async fn list_items(
        &self,
        owner_id: Uuid,
        filter: InventoryFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<inventory_item::Model>, u64), ServiceError> {
        let mut query = inventory_item::Entity::find()
            .filter(inventory_item::Column::OwnerId.eq(owner_id))
            .order_by_asc(inventory_item::Column::Name);

        if let Some(search) = filter.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                query = query.filter(
                    Condition::any()
                        .add(inventory_item::Column::Name.contains(search))
                        .add(inventory_item::Column::Sku.contains(search)),
                );
            }
        }
        if filter.low_stock {
            query = query.filter(low_stock_condition());
        }

        let paginator = query.paginate(self.db.get_pool(), per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    #[instrument(skip(self))]
    pub async fn list_low_stock(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<inventory_item::Model>, ServiceError> {
        Ok(inventory_item::Entity::find()
            .filter(inventory_item::Column::OwnerId.eq(owner_id))
            .filter(low_stock_condition())
            .order_by_asc(inventory_item::Column::Quantity)
            .all(self.db.get_pool())
            .await?)
    }

    pub async fn count_items<C: ConnectionTrait>(
        conn: &C,
        owner_id: Uuid,
        low_stock_only: bool,
    ) -> Result<u64, ServiceError> {
        let mut query =
            inventory_item::Entity::find().filter(inventory_item::Column::OwnerId.eq(owner_id));
        if low_stock_only {
            query = query.filter(low_stock_condition());
        }
        Ok(query.count(conn).await?)
    }

    #[instrument(skip(self, input))]
    pub async fn update_item(
        &self,
        owner_id: Uuid,
        item_id: Uuid,
        input: UpdateInventoryItemInput,
    ) -> Result<inventory_item::Model, ServiceError> {
        input.validate()?;
        let existing = Self::find_owned(self.db.get_pool(), owner_id, item_id).await?;
        let mut item: inventory_item::ActiveModel = existing.into();

        if let Some(name) = input.name {
            item.name = Set(name.trim().to_string());
        }
        if let Some(sku) = input.sku {
            item.sku = Set(Some(sku));
        }
        if let Some(category) = input.category {
            item.category = Set(Some(category));
        }
        if let Some(description) = input.description {
            item.description = Set(Some(description));
        }
        if let Some(unit) = input.unit {
            item.unit = Set(unit);
        }
        if let Some(quantity) = input.quantity {
            item.quantity = Set(quantity);
        }
        if let Some(price) = input.unit_price {
            item.unit_price = Set(check_unit_price(price)?);
        }
        if let Some(level) = input.min_stock_level {
            item.min_stock_level = Set(level);
        }
        item.updated_at = Set(Utc::now());

        Ok(item.update(self.db.get_pool()).await?)
    }

    /// Deletes an item that no bill line refers to.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, owner_id: Uuid, item_id: Uuid) -> Result<(), ServiceError> {
        let db = self.db.get_pool();
        Self::find_owned(db, owner_id, item_id).await?;

        let references = bill_line_item::Entity::find()
            .filter(bill_line_item::Column::InventoryItemId.eq(item_id))
            .count(db)
            .await?;
        if references > 0 {
            return Err(ServiceError::Conflict(format!(
                "Inventory item {} is referenced by {} bill line(s)",
                item_id, references
            )));
        }

        inventory_item::Entity::delete_many()
            .filter(inventory_item::Column::Id.eq(item_id))
            .filter(inventory_item::Column::OwnerId.eq(owner_id))
            .exec(db)
            .await?;

        info!(item_id = %item_id, "Inventory item deleted");
        Ok(())
    }
}

use crate::{
    db::DatabaseAccess,
    entities::{bill, bill_line_item, bill_sequence, customer, inventory_item, payment, BillStatus},
    errors::ServiceError,
    money::{
        format_bill_number, has_money_scale, line_total, round_money, serde_money, Balance,
        BillTotals, MAX_UNIT_PRICE,
    },
    services::{customers::CustomerService, inventory::InventoryService, payments::PaymentLedger},
};
use chrono::{DateTime, NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Settings the billing engine reads from configuration.
#[derive(Debug, Clone)]
pub struct BillingSettings {
    pub default_tax_rate: Decimal,
    pub bill_number_prefix: String,
    pub bill_number_max_attempts: u32,
}

#[derive(Clone)]
pub struct BillingService {
    db: DatabaseAccess,
    settings: BillingSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillLineInput {
    pub inventory_item_id: Uuid,
    pub quantity: i32,
    /// Falls back to the item's current price when absent
    pub unit_price: Option<Decimal>,
}

/// Everything needed to create a bill except the customer and owner.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewBill {
    #[validate(length(min = 1, message = "lineItems must contain at least one line"))]
    #[serde(default)]
    pub line_items: Vec<BillLineInput>,
    pub tax_rate: Option<Decimal>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub status: Option<BillStatus>,
    pub issued_on: Option<NaiveDate>,
}

impl NewBill {
    fn check(&self) -> Result<(), ServiceError> {
        self.validate()?;

        for (index, line) in self.line_items.iter().enumerate() {
            if line.quantity < 1 {
                return Err(ServiceError::ValidationError(format!(
                    "lineItems[{}].quantity must be at least 1",
                    index
                )));
            }
            if let Some(price) = line.unit_price {
                if price.is_sign_negative() {
                    return Err(ServiceError::ValidationError(format!(
                        "lineItems[{}].unitPrice must not be negative",
                        index
                    )));
                }
                if !has_money_scale(price) {
                    return Err(ServiceError::ValidationError(format!(
                        "lineItems[{}].unitPrice must have at most two decimal places",
                        index
                    )));
                }
                if price > MAX_UNIT_PRICE {
                    return Err(ServiceError::ValidationError(format!(
                        "lineItems[{}].unitPrice must not exceed {}",
                        index, MAX_UNIT_PRICE
                    )));
                }
            }
        }

        if let Some(rate) = self.tax_rate {
            if rate.is_sign_negative() || rate > Decimal::ONE_HUNDRED {
                return Err(ServiceError::ValidationError(
                    "taxRate must be between 0 and 100".to_string(),
                ));
            }
            if !has_money_scale(rate) {
                return Err(ServiceError::ValidationError(
                    "taxRate must have at most two decimal places".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBillStatusInput {
    pub status: BillStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BillFilter {
    pub status: Option<BillStatus>,
    pub customer_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}

impl From<customer::Model> for CustomerSummary {
    fn from(c: customer::Model) -> Self {
        Self {
            id: c.id,
            name: c.name,
            email: c.email,
            phone: c.phone,
            company: c.company,
            address: c.address,
            city: c.city,
        }
    }
}

/// Bill header as clients see it, with ledger-derived paid and outstanding amounts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillView {
    pub id: Uuid,
    pub bill_number: String,
    pub customer_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    pub issued_on: NaiveDate,
    #[serde(with = "serde_money")]
    pub subtotal: Decimal,
    #[serde(with = "serde_money")]
    pub tax_rate: Decimal,
    #[serde(with = "serde_money")]
    pub tax_amount: Decimal,
    #[serde(with = "serde_money")]
    pub total: Decimal,
    #[serde(with = "serde_money")]
    pub paid_amount: Decimal,
    #[serde(with = "serde_money")]
    pub outstanding_amount: Decimal,
    pub status: BillStatus,
    pub paid_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BillView {
    pub fn new(bill: bill::Model, customer_name: Option<String>, balance: Balance) -> Self {
        Self {
            id: bill.id,
            bill_number: bill.bill_number,
            customer_id: bill.customer_id,
            customer_name,
            issued_on: bill.issued_on,
            subtotal: round_money(bill.subtotal),
            tax_rate: round_money(bill.tax_rate),
            tax_amount: round_money(bill.tax_amount),
            total: balance.total,
            paid_amount: balance.paid,
            outstanding_amount: balance.outstanding,
            status: bill.status,
            paid_date: bill.paid_date,
            notes: bill.notes,
            created_at: bill.created_at,
            updated_at: bill.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillLineView {
    pub id: Uuid,
    pub line_number: i32,
    pub inventory_item_id: Uuid,
    pub item_name: Option<String>,
    pub sku: Option<String>,
    pub unit: Option<String>,
    pub quantity: i32,
    #[serde(with = "serde_money")]
    pub unit_price: Decimal,
    #[serde(with = "serde_money")]
    pub total: Decimal,
}

impl BillLineView {
    fn new(line: bill_line_item::Model, item: Option<inventory_item::Model>) -> Self {
        let (item_name, sku, unit) = match item {
            Some(item) => (Some(item.name), item.sku, Some(item.unit)),
            None => (None, None, None),
        };
        Self {
            id: line.id,
            line_number: line.line_number,
            inventory_item_id: line.inventory_item_id,
            item_name,
            sku,
            unit,
            quantity: line.quantity,
            unit_price: round_money(line.unit_price),
            total: round_money(line.total),
        }
    }
}

/// Fully materialized bill: header, customer and priced lines.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillDetail {
    #[serde(flatten)]
    pub bill: BillView,
    pub customer: CustomerSummary,
    pub line_items: Vec<BillLineView>,
}

/// Billed, paid and outstanding sums over a set of bills.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillTotalsSummary {
    pub bill_count: u64,
    #[serde(with = "serde_money")]
    pub total_billed: Decimal,
    #[serde(with = "serde_money")]
    pub total_paid: Decimal,
    #[serde(with = "serde_money")]
    pub total_outstanding: Decimal,
}

impl BillTotalsSummary {
    pub fn of<'a, I>(bills: I) -> Self
    where
        I: IntoIterator<Item = &'a BillView>,
    {
        bills.into_iter().fold(Self::default(), |acc, b| Self {
            bill_count: acc.bill_count + 1,
            total_billed: acc.total_billed + b.total,
            total_paid: acc.total_paid + b.paid_amount,
            total_outstanding: acc.total_outstanding + b.outstanding_amount,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerBillHistory {
    pub customer: CustomerSummary,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub bills: Vec<BillView>,
    pub totals: BillTotalsSummary,
}

struct PricedLine {
    inventory_item_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
    total: Decimal,
}

impl BillingService {
    pub fn new(db: DatabaseAccess, settings: BillingSettings) -> Self {
        Self { db, settings }
    }

    pub fn settings(&self) -> &BillingSettings {
        &self.settings
    }

    /// Loads a bill only if it belongs to `owner_id`. Other owners' bills are
    /// indistinguishable from missing ones.
    pub async fn find_owned_bill<C: ConnectionTrait>(
        conn: &C,
        owner_id: Uuid,
        bill_id: Uuid,
    ) -> Result<bill::Model, ServiceError> {
        bill::Entity::find_by_id(bill_id)
            .filter(bill::Column::OwnerId.eq(owner_id))
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Bill", bill_id))
    }

    /// Like [`Self::find_owned_bill`] but takes a row lock on backends that support it,
    /// serializing concurrent payments against the same bill.
    pub async fn lock_owned_bill<C: ConnectionTrait>(
        conn: &C,
        owner_id: Uuid,
        bill_id: Uuid,
    ) -> Result<bill::Model, ServiceError> {
        let mut query = bill::Entity::find_by_id(bill_id).filter(bill::Column::OwnerId.eq(owner_id));
        if conn.get_database_backend() == DbBackend::Postgres {
            query = query.lock_exclusive();
        }
        query
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Bill", bill_id))
    }

    /// Reserves the next bill number for `owner_id` inside the caller's transaction.
    async fn next_bill_sequence<C: ConnectionTrait>(
        conn: &C,
        owner_id: Uuid,
    ) -> Result<i64, ServiceError> {
        let now = Utc::now();
        let bumped = bill_sequence::Entity::update_many()
            .col_expr(
                bill_sequence::Column::LastNumber,
                Expr::col(bill_sequence::Column::LastNumber).add(1),
            )
            .col_expr(bill_sequence::Column::UpdatedAt, Expr::value(now))
            .filter(bill_sequence::Column::OwnerId.eq(owner_id))
            .exec(conn)
            .await?;

        if bumped.rows_affected == 0 {
            // A concurrent first insert loses on the primary key and is retried.
            bill_sequence::ActiveModel {
                owner_id: Set(owner_id),
                last_number: Set(1),
                updated_at: Set(now),
            }
            .insert(conn)
            .await?;
            return Ok(1);
        }

        bill_sequence::Entity::find_by_id(owner_id)
            .one(conn)
            .await?
            .map(|row| row.last_number)
            .ok_or_else(|| {
                ServiceError::InternalError(format!("bill sequence for owner {} vanished", owner_id))
            })
    }

    /// Creates a bill, its lines and the matching stock decrements atomically.
    ///
    /// Losing a bill-number race surfaces as a unique violation; the whole transaction
    /// is retried up to `bill_number_max_attempts` times before a conflict is returned.
    #[instrument(skip(self, input), fields(owner_id = %owner_id, customer_id = %customer_id, lines = input.line_items.len()))]
    pub async fn create_bill(
        &self,
        owner_id: Uuid,
        customer_id: Uuid,
        input: NewBill,
    ) -> Result<BillDetail, ServiceError> {
        input.check()?;

        let max_attempts = self.settings.bill_number_max_attempts.max(1);
        let mut attempt = 1;
        let bill_id = loop {
            match self.try_create_bill(owner_id, customer_id, input.clone()).await {
                Ok(id) => break id,
                Err(ServiceError::Conflict(reason)) if attempt < max_attempts => {
                    warn!(attempt, %reason, "Bill number collision, retrying");
                    counter!("shopflow_billing.bill_number_retries", 1);
                    attempt += 1;
                }
                Err(ServiceError::Conflict(reason)) => {
                    return Err(ServiceError::Conflict(format!(
                        "could not assign a bill number after {} attempts: {}",
                        attempt, reason
                    )));
                }
                Err(e) => return Err(e),
            }
        };

        counter!("shopflow_billing.bills_created", 1);
        self.get_bill(owner_id, bill_id).await
    }

    async fn try_create_bill(
        &self,
        owner_id: Uuid,
        customer_id: Uuid,
        input: NewBill,
    ) -> Result<Uuid, ServiceError> {
        let tax_rate = input.tax_rate.unwrap_or(self.settings.default_tax_rate);
        let prefix = self.settings.bill_number_prefix.clone();

        self.db
            .transaction("create_bill", move |txn| {
                Box::pin(async move {
                    CustomerService::find_owned(txn, owner_id, customer_id).await?;

                    let mut lines = Vec::with_capacity(input.line_items.len());
                    for (index, line) in input.line_items.iter().enumerate() {
                        let item =
                            InventoryService::find_owned(txn, owner_id, line.inventory_item_id)
                                .await?;
                        let unit_price = round_money(line.unit_price.unwrap_or(item.unit_price));
                        let total = line_total(line.quantity, unit_price).ok_or_else(|| {
                            ServiceError::ValidationError(format!(
                                "lineItems[{}] total is too large",
                                index
                            ))
                        })?;
                        lines.push(PricedLine {
                            inventory_item_id: item.id,
                            quantity: line.quantity,
                            unit_price,
                            total,
                        });
                    }

                    let totals = BillTotals::compute(lines.iter().map(|l| l.total), tax_rate)
                        .ok_or_else(|| {
                            ServiceError::ValidationError("bill total is too large".to_string())
                        })?;
                    let sequence = Self::next_bill_sequence(txn, owner_id).await?;
                    let bill_number = format_bill_number(&prefix, sequence);

                    let now = Utc::now();
                    let status = input.status.unwrap_or_default();
                    let bill = bill::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        owner_id: Set(owner_id),
                        customer_id: Set(customer_id),
                        bill_number: Set(bill_number),
                        issued_on: Set(input.issued_on.unwrap_or_else(|| now.date_naive())),
                        subtotal: Set(totals.subtotal),
                        tax_rate: Set(totals.tax_rate),
                        tax_amount: Set(totals.tax_amount),
                        total: Set(totals.total),
                        status: Set(status),
                        paid_date: Set((status == BillStatus::Paid).then_some(now)),
                        notes: Set(input.notes),
                        created_at: Set(now),
                        updated_at: Set(now),
                    }
                    .insert(txn)
                    .await?;

                    for (index, line) in lines.iter().enumerate() {
                        bill_line_item::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            bill_id: Set(bill.id),
                            inventory_item_id: Set(line.inventory_item_id),
                            line_number: Set(index as i32 + 1),
                            quantity: Set(line.quantity),
                            unit_price: Set(line.unit_price),
                            total: Set(line.total),
                            created_at: Set(now),
                        }
                        .insert(txn)
                        .await?;

                        InventoryService::adjust_quantity(
                            txn,
                            owner_id,
                            line.inventory_item_id,
                            -line.quantity,
                        )
                        .await?;
                    }

                    info!(
                        bill_id = %bill.id,
                        bill_number = %bill.bill_number,
                        total = %totals.total,
                        "Bill created"
                    );
                    Ok(bill.id)
                })
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_bill(&self, owner_id: Uuid, bill_id: Uuid) -> Result<BillDetail, ServiceError> {
        let db = self.db.get_pool();

        let (bill, customer) = bill::Entity::find_by_id(bill_id)
            .filter(bill::Column::OwnerId.eq(owner_id))
            .find_also_related(customer::Entity)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Bill", bill_id))?;
        let customer = customer.ok_or_else(|| {
            ServiceError::InternalError(format!("bill {} has no customer row", bill_id))
        })?;

        let line_items = bill_line_item::Entity::find()
            .filter(bill_line_item::Column::BillId.eq(bill_id))
            .order_by_asc(bill_line_item::Column::LineNumber)
            .find_also_related(inventory_item::Entity)
            .all(db)
            .await?
            .into_iter()
            .map(|(line, item)| BillLineView::new(line, item))
            .collect();

        let balance = PaymentLedger::balance_of(db, &bill).await?;
        Ok(BillDetail {
            bill: BillView::new(bill, Some(customer.name.clone()), balance),
            customer: customer.into(),
            line_items,
        })
    }

    /// Materializes bill headers for a query, deriving every balance in one pass.
    async fn load_views<C: ConnectionTrait>(
        conn: &C,
        query: Select<bill::Entity>,
    ) -> Result<Vec<BillView>, ServiceError> {
        let rows = query.find_also_related(customer::Entity).all(conn).await?;
        Self::views_from_rows(conn, rows).await
    }

    async fn views_from_rows<C: ConnectionTrait>(
        conn: &C,
        rows: Vec<(bill::Model, Option<customer::Model>)>,
    ) -> Result<Vec<BillView>, ServiceError> {
        let bills: Vec<bill::Model> = rows.iter().map(|(b, _)| b.clone()).collect();
        let balances = PaymentLedger::balances_for(conn, &bills).await?;

        Ok(rows
            .into_iter()
            .map(|(bill, customer)| {
                let balance = balances
                    .get(&bill.id)
                    .copied()
                    .unwrap_or_else(|| Balance::derive(bill.total, []));
                BillView::new(bill, customer.map(|c| c.name), balance)
            })
            .collect())
    }

    fn owner_query(owner_id: Uuid, filter: &BillFilter) -> Select<bill::Entity> {
        let mut query = bill::Entity::find().filter(bill::Column::OwnerId.eq(owner_id));
        if let Some(status) = filter.status {
            query = query.filter(bill::Column::Status.eq(status));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(bill::Column::CustomerId.eq(customer_id));
        }
        if let Some(from) = filter.from {
            query = query.filter(bill::Column::IssuedOn.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(bill::Column::IssuedOn.lte(to));
        }
        query
    }

    /// Newest bills first, one page at a time.
    #[instrument(skip(self))]
    pub async fn list_bills(
        &self,
        owner_id: Uuid,
        filter: BillFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<BillView>, u64), ServiceError> {
        check_range(filter.from, filter.to)?;
        let db = self.db.get_pool();

        let paginator = Self::owner_query(owner_id, &filter)
            .order_by_desc(bill::Column::IssuedOn)
            .order_by_desc(bill::Column::BillNumber)
            .find_also_related(customer::Entity)
            .paginate(db, per_page);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((Self::views_from_rows(db, rows).await?, total))
    }

    /// All bills matching `filter`, oldest first.
    pub async fn bills_matching<C: ConnectionTrait>(
        conn: &C,
        owner_id: Uuid,
        filter: &BillFilter,
    ) -> Result<Vec<BillView>, ServiceError> {
        check_range(filter.from, filter.to)?;
        let query = Self::owner_query(owner_id, filter)
            .order_by_asc(bill::Column::IssuedOn)
            .order_by_asc(bill::Column::BillNumber);
        Self::load_views(conn, query).await
    }

    /// Every bill issued on `date`, across customers.
    #[instrument(skip(self))]
    pub async fn bills_on_day(
        &self,
        owner_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<BillView>, ServiceError> {
        let filter = BillFilter {
            from: Some(date),
            to: Some(date),
            ..Default::default()
        };
        Self::bills_matching(self.db.get_pool(), owner_id, &filter).await
    }

    #[instrument(skip(self))]
    pub async fn customer_history(
        &self,
        owner_id: Uuid,
        customer_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<CustomerBillHistory, ServiceError> {
        let db = self.db.get_pool();
        let customer = CustomerService::find_owned(db, owner_id, customer_id).await?;

        let filter = BillFilter {
            customer_id: Some(customer_id),
            from,
            to,
            ..Default::default()
        };
        let bills = Self::bills_matching(db, owner_id, &filter).await?;
        let totals = BillTotalsSummary::of(&bills);

        Ok(CustomerBillHistory {
            customer: customer.into(),
            from,
            to,
            bills,
            totals,
        })
    }

    /// Sets the status independently of the payment ledger. `partial` is only valid
    /// as an initial status.
    #[instrument(skip(self, input), fields(status = %input.status))]
    pub async fn update_status(
        &self,
        owner_id: Uuid,
        bill_id: Uuid,
        input: UpdateBillStatusInput,
    ) -> Result<BillDetail, ServiceError> {
        if input.status == BillStatus::Partial {
            return Err(ServiceError::ValidationError(
                "status must be one of: pending, paid, cancelled".to_string(),
            ));
        }

        let db = self.db.get_pool();
        let existing = Self::find_owned_bill(db, owner_id, bill_id).await?;
        let previous = existing.status;

        let now = Utc::now();
        let mut bill: bill::ActiveModel = existing.into();
        bill.status = Set(input.status);
        if input.status != BillStatus::Paid {
            bill.paid_date = Set(None);
        } else if previous != BillStatus::Paid {
            bill.paid_date = Set(Some(now));
        }
        if let Some(notes) = input.notes {
            bill.notes = Set(Some(notes));
        }
        bill.updated_at = Set(now);
        bill.update(db).await?;

        info!(bill_id = %bill_id, from = %previous, to = %input.status, "Bill status updated");
        self.get_bill(owner_id, bill_id).await
    }

    /// Deletes a bill and restores the stock its lines consumed. A second delete
    /// finds nothing and restores nothing.
    #[instrument(skip(self))]
    pub async fn delete_bill(&self, owner_id: Uuid, bill_id: Uuid) -> Result<(), ServiceError> {
        self.db
            .transaction("delete_bill", move |txn| {
                Box::pin(async move {
                    let bill = Self::find_owned_bill(txn, owner_id, bill_id).await?;

                    let lines = bill_line_item::Entity::find()
                        .filter(bill_line_item::Column::BillId.eq(bill.id))
                        .all(txn)
                        .await?;
                    for line in &lines {
                        InventoryService::adjust_quantity(
                            txn,
                            owner_id,
                            line.inventory_item_id,
                            line.quantity,
                        )
                        .await?;
                    }

                    let payments = payment::Entity::delete_many()
                        .filter(payment::Column::BillId.eq(bill.id))
                        .exec(txn)
                        .await?;
                    bill_line_item::Entity::delete_many()
                        .filter(bill_line_item::Column::BillId.eq(bill.id))
                        .exec(txn)
                        .await?;
                    let deleted = bill::Entity::delete_many()
                        .filter(bill::Column::Id.eq(bill.id))
                        .filter(bill::Column::OwnerId.eq(owner_id))
                        .exec(txn)
                        .await?;
                    if deleted.rows_affected != 1 {
                        return Err(ServiceError::not_found("Bill", bill_id));
                    }

                    info!(
                        bill_number = %bill.bill_number,
                        restored_lines = lines.len(),
                        removed_payments = payments.rows_affected,
                        "Bill deleted"
                    );
                    Ok(())
                })
            })
            .await
    }
}

fn check_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<(), ServiceError> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err(ServiceError::ValidationError(format!(
            "from ({}) must not be after to ({})",
            from, to
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(quantity: i32, price: Option<Decimal>) -> BillLineInput {
        BillLineInput {
            inventory_item_id: Uuid::new_v4(),
            quantity,
            unit_price: price,
        }
    }

    #[test]
    fn rejects_empty_line_items() {
        let bill = NewBill::default();
        assert!(matches!(bill.check(), Err(ServiceError::ValidationError(_))));
    }

    #[test]
    fn names_the_offending_line() {
        let bill = NewBill {
            line_items: vec![line(1, None), line(0, None)],
            ..Default::default()
        };
        match bill.check() {
            Err(ServiceError::ValidationError(msg)) => assert!(msg.contains("lineItems[1].quantity")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn rejects_negative_and_sub_cent_prices() {
        let negative = NewBill {
            line_items: vec![line(1, Some(dec!(-0.01)))],
            ..Default::default()
        };
        assert!(negative.check().is_err());

        let sub_cent = NewBill {
            line_items: vec![line(1, Some(dec!(1.005)))],
            ..Default::default()
        };
        assert!(sub_cent.check().is_err());

        let free = NewBill {
            line_items: vec![line(3, Some(Decimal::ZERO))],
            ..Default::default()
        };
        assert!(free.check().is_ok());
    }

    #[test]
    fn rejects_tax_rate_outside_percentage_range() {
        let bill = NewBill {
            line_items: vec![line(1, None)],
            tax_rate: Some(dec!(100.5)),
            ..Default::default()
        };
        assert!(bill.check().is_err());
    }

    #[test]
    fn rejects_sub_cent_tax_rate() {
        let bill = NewBill {
            line_items: vec![line(1, None)],
            tax_rate: Some(dec!(8.125)),
            ..Default::default()
        };
        match bill.check() {
            Err(ServiceError::ValidationError(msg)) => assert!(msg.contains("taxRate")),
            other => panic!("expected validation error, got {:?}", other),
        }

        let bill = NewBill {
            line_items: vec![line(1, None)],
            tax_rate: Some(dec!(8.250)),
            ..Default::default()
        };
        assert!(bill.check().is_ok());
    }

    #[test]
    fn rejects_prices_beyond_storable_range() {
        let bill = NewBill {
            line_items: vec![line(2, Some(Decimal::MAX))],
            ..Default::default()
        };
        match bill.check() {
            Err(ServiceError::ValidationError(msg)) => {
                assert!(msg.contains("lineItems[0].unitPrice"))
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        let at_limit = NewBill {
            line_items: vec![line(1, Some(MAX_UNIT_PRICE))],
            ..Default::default()
        };
        assert!(at_limit.check().is_ok());
    }

    #[test]
    fn range_must_be_ordered() {
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        assert!(check_range(Some(d("2024-05-02")), Some(d("2024-05-01"))).is_err());
        assert!(check_range(Some(d("2024-05-01")), Some(d("2024-05-01"))).is_ok());
        assert!(check_range(None, Some(d("2024-05-01"))).is_ok());
    }
}

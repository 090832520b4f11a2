use crate::{
    db::DatabaseAccess,
    errors::ServiceError,
    money::serde_money,
    services::{
        billing::{BillFilter, BillTotalsSummary, BillView, BillingService},
        customers::CustomerService,
        inventory::InventoryService,
    },
};
use chrono::{Datelike, Days, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

/// Read-only aggregates for the shop dashboard and the daily purchase register.
#[derive(Clone)]
pub struct DashboardService {
    db: DatabaseAccess,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_inventory_items: u64,
    pub low_stock_count: u64,
    pub total_customers: u64,
    /// Calendar month the revenue figure covers, as `YYYY-MM`
    pub month: String,
    #[serde(with = "serde_money")]
    pub monthly_revenue: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeStats>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeStats {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    #[serde(flatten)]
    pub totals: BillTotalsSummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterGroup {
    pub customer_id: Uuid,
    pub customer_name: Option<String>,
    #[serde(flatten)]
    pub totals: BillTotalsSummary,
    pub bills: Vec<BillView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRegister {
    pub date: NaiveDate,
    pub customers: Vec<RegisterGroup>,
    pub totals: BillTotalsSummary,
}

/// First and last day of the month containing `day`.
fn month_bounds(day: NaiveDate) -> Result<(NaiveDate, NaiveDate), ServiceError> {
    let first = day - Days::new(u64::from(day.day0()));
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.checked_sub_days(Days::new(1)))
        .ok_or_else(|| ServiceError::InternalError(format!("no month end for {}", day)))?;
    Ok((first, last))
}

/// Groups bills by customer, ordered by customer name.
fn group_by_customer(bills: Vec<BillView>) -> Vec<RegisterGroup> {
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    let mut groups: Vec<RegisterGroup> = Vec::new();

    for bill in bills {
        let slot = *index.entry(bill.customer_id).or_insert_with(|| {
            groups.push(RegisterGroup {
                customer_id: bill.customer_id,
                customer_name: bill.customer_name.clone(),
                totals: BillTotalsSummary::default(),
                bills: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].bills.push(bill);
    }

    for group in &mut groups {
        group.totals = BillTotalsSummary::of(&group.bills);
    }
    groups.sort_by(|a, b| a.customer_name.cmp(&b.customer_name));
    groups
}

impl DashboardService {
    pub fn new(db: DatabaseAccess) -> Self {
        Self { db }
    }

    /// Headline counts plus revenue for the month containing `today`. When a range is
    /// given, billed/paid/outstanding totals for bills issued in it are added.
    #[instrument(skip(self))]
    pub async fn stats(
        &self,
        owner_id: Uuid,
        today: NaiveDate,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<DashboardStats, ServiceError> {
        let db = self.db.get_pool();

        let total_inventory_items = InventoryService::count_items(db, owner_id, false).await?;
        let low_stock_count = InventoryService::count_items(db, owner_id, true).await?;
        let total_customers = CustomerService::count_customers(db, owner_id).await?;

        let (month_start, month_end) = month_bounds(today)?;
        let month_filter = BillFilter {
            from: Some(month_start),
            to: Some(month_end),
            ..Default::default()
        };
        let monthly_revenue = BillingService::bills_matching(db, owner_id, &month_filter)
            .await?
            .iter()
            .map(|b| b.total)
            .sum();

        let range = if from.is_some() || to.is_some() {
            let filter = BillFilter {
                from,
                to,
                ..Default::default()
            };
            let bills = BillingService::bills_matching(db, owner_id, &filter).await?;
            Some(RangeStats {
                from,
                to,
                totals: BillTotalsSummary::of(&bills),
            })
        } else {
            None
        };

        Ok(DashboardStats {
            total_inventory_items,
            low_stock_count,
            total_customers,
            month: month_start.format("%Y-%m").to_string(),
            monthly_revenue,
            range,
        })
    }

    /// Every bill issued on `date`, grouped by customer.
    #[instrument(skip(self))]
    pub async fn daily_register(
        &self,
        owner_id: Uuid,
        date: NaiveDate,
    ) -> Result<DailyRegister, ServiceError> {
        let filter = BillFilter {
            from: Some(date),
            to: Some(date),
            ..Default::default()
        };
        let bills = BillingService::bills_matching(self.db.get_pool(), owner_id, &filter).await?;
        let totals = BillTotalsSummary::of(&bills);

        Ok(DailyRegister {
            date,
            customers: group_by_customer(bills),
            totals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn month_bounds_cover_whole_month() {
        assert_eq!(
            month_bounds(date("2024-02-17")).unwrap(),
            (date("2024-02-01"), date("2024-02-29"))
        );
        assert_eq!(
            month_bounds(date("2023-12-31")).unwrap(),
            (date("2023-12-01"), date("2023-12-31"))
        );
        assert_eq!(
            month_bounds(date("2024-01-01")).unwrap(),
            (date("2024-01-01"), date("2024-01-31"))
        );
    }
}

use crate::{
    db::DatabaseAccess,
    entities::{bill, payment, BillStatus, PaymentMethod},
    errors::ServiceError,
    money::{format_money, has_money_scale, round_money, Balance},
    services::billing::BillingService,
};
use chrono::{NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Append-only payment records against bills, and the one place paid/outstanding
/// amounts are derived from them.
#[derive(Clone)]
pub struct PaymentLedger {
    db: DatabaseAccess,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentInput {
    pub amount: Decimal,
    /// Defaults to today (UTC)
    pub payment_date: Option<NaiveDate>,
    #[serde(default = "default_payment_method")]
    pub payment_method: PaymentMethod,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

fn default_payment_method() -> PaymentMethod {
    PaymentMethod::Cash
}

/// A freshly recorded payment together with the bill balance it leaves behind.
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub payment: payment::Model,
    pub balance: Balance,
}

impl PaymentLedger {
    pub fn new(db: DatabaseAccess) -> Self {
        Self { db }
    }

    /// Derives the balance of every given bill from its payments in one query.
    pub async fn balances_for<C: ConnectionTrait>(
        conn: &C,
        bills: &[bill::Model],
    ) -> Result<HashMap<Uuid, Balance>, ServiceError> {
        if bills.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<Uuid> = bills.iter().map(|b| b.id).collect();
        let payments = payment::Entity::find()
            .filter(payment::Column::BillId.is_in(ids))
            .all(conn)
            .await?;

        let mut amounts: HashMap<Uuid, Vec<Decimal>> = HashMap::new();
        for p in payments {
            amounts.entry(p.bill_id).or_default().push(p.amount);
        }

        Ok(bills
            .iter()
            .map(|b| {
                let paid = amounts.remove(&b.id).unwrap_or_default();
                (b.id, Balance::derive(b.total, paid))
            })
            .collect())
    }

    pub async fn balance_of<C: ConnectionTrait>(
        conn: &C,
        bill: &bill::Model,
    ) -> Result<Balance, ServiceError> {
        let amounts = payment::Entity::find()
            .filter(payment::Column::BillId.eq(bill.id))
            .all(conn)
            .await?
            .into_iter()
            .map(|p| p.amount);
        Ok(Balance::derive(bill.total, amounts))
    }

    /// Appends a payment if `0 < amount <= outstanding`. Overpayments are rejected,
    /// never clamped.
    #[instrument(skip(self, input), fields(owner_id = %owner_id, bill_id = %bill_id))]
    pub async fn record_payment(
        &self,
        owner_id: Uuid,
        bill_id: Uuid,
        input: RecordPaymentInput,
    ) -> Result<PaymentReceipt, ServiceError> {
        input.validate()?;
        if input.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "amount must be greater than zero".to_string(),
            ));
        }
        if !has_money_scale(input.amount) {
            return Err(ServiceError::ValidationError(
                "amount must have at most two decimal places".to_string(),
            ));
        }

        let amount = round_money(input.amount);
        let payment_date = input
            .payment_date
            .unwrap_or_else(|| Utc::now().date_naive());

        let receipt = self
            .db
            .transaction("record_payment", move |txn| {
                Box::pin(async move {
                    let bill = BillingService::lock_owned_bill(txn, owner_id, bill_id).await?;
                    if bill.status == BillStatus::Cancelled {
                        return Err(ServiceError::ValidationError(format!(
                            "bill {} is cancelled and cannot accept payments",
                            bill.bill_number
                        )));
                    }

                    let before = Self::balance_of(txn, &bill).await?;
                    if amount > before.outstanding {
                        return Err(ServiceError::ValidationError(format!(
                            "amount {} exceeds outstanding balance {}",
                            format_money(amount),
                            format_money(before.outstanding)
                        )));
                    }

                    let payment = payment::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        bill_id: Set(bill.id),
                        owner_id: Set(owner_id),
                        amount: Set(amount),
                        payment_date: Set(payment_date),
                        payment_method: Set(input.payment_method),
                        notes: Set(input.notes),
                        created_at: Set(Utc::now()),
                    }
                    .insert(txn)
                    .await?;

                    let balance = Balance::derive(bill.total, [before.paid, amount]);
                    Ok(PaymentReceipt { payment, balance })
                })
            })
            .await
            .map_err(|e| {
                if matches!(e, ServiceError::ValidationError(_)) {
                    warn!(error = %e, "Payment rejected");
                    counter!("shopflow_payments.rejected", 1);
                }
                e
            })?;

        counter!("shopflow_payments.recorded", 1);
        info!(
            payment_id = %receipt.payment.id,
            amount = %format_money(amount),
            outstanding = %format_money(receipt.balance.outstanding),
            "Payment recorded"
        );
        Ok(receipt)
    }

    /// Payments of one bill, oldest first.
    #[instrument(skip(self))]
    pub async fn list_payments(
        &self,
        owner_id: Uuid,
        bill_id: Uuid,
    ) -> Result<Vec<payment::Model>, ServiceError> {
        let db = self.db.get_pool();
        BillingService::find_owned_bill(db, owner_id, bill_id).await?;

        Ok(payment::Entity::find()
            .filter(payment::Column::BillId.eq(bill_id))
            .order_by_asc(payment::Column::PaymentDate)
            .order_by_asc(payment::Column::CreatedAt)
            .all(db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_balance(
        &self,
        owner_id: Uuid,
        bill_id: Uuid,
    ) -> Result<(bill::Model, Balance), ServiceError> {
        let db = self.db.get_pool();
        let bill = BillingService::find_owned_bill(db, owner_id, bill_id).await?;
        let balance = Self::balance_of(db, &bill).await?;
        Ok((bill, balance))
    }
}

use crate::{
    config::AppConfig,
    db::DatabaseAccess,
    services::{
        billing::{BillingService, BillingSettings},
        customers::CustomerService,
        dashboard::DashboardService,
        inventory::InventoryService,
        payments::PaymentLedger,
    },
};
use std::sync::Arc;

pub mod bills;
pub mod common;
pub mod customers;
pub mod dashboard;
pub mod inventory;
pub mod payments;

/// Services shared by every HTTP handler.
#[derive(Clone)]
pub struct AppServices {
    pub billing: Arc<BillingService>,
    pub payments: Arc<PaymentLedger>,
    pub inventory: Arc<InventoryService>,
    pub customers: Arc<CustomerService>,
    pub dashboard: Arc<DashboardService>,
}

impl AppServices {
    pub fn new(db: DatabaseAccess, config: &AppConfig) -> Self {
        let settings = BillingSettings {
            default_tax_rate: config.default_tax_rate,
            bill_number_prefix: config.bill_number_prefix.clone(),
            bill_number_max_attempts: config.bill_number_max_attempts,
        };

        Self {
            billing: Arc::new(BillingService::new(db.clone(), settings)),
            payments: Arc::new(PaymentLedger::new(db.clone())),
            inventory: Arc::new(InventoryService::new(
                db.clone(),
                config.default_min_stock_level,
            )),
            customers: Arc::new(CustomerService::new(db.clone())),
            dashboard: Arc::new(DashboardService::new(db)),
        }
    }
}

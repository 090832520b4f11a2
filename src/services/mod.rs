pub mod billing;
pub mod customers;
pub mod dashboard;
pub mod inventory;
pub mod payments;

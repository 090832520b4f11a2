pub mod bill;
pub mod bill_line_item;
pub mod bill_sequence;
pub mod customer;
pub mod inventory_item;
pub mod payment;

pub use bill::BillStatus;
pub use payment::PaymentMethod;

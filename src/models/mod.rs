pub mod driver;
pub mod incident;
pub mod ledger;
pub mod order;

pub mod calculator;
pub mod ledger;
pub mod model;

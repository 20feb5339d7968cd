pub mod ledger;
pub mod protocol;

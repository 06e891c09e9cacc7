pub mod commands;
pub mod coordinator;
pub mod ledger;

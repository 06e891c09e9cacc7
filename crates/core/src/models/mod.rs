pub mod history;
pub mod holding;
pub mod snapshot;

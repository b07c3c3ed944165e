pub mod audit_log;
pub mod document;
pub mod product;
pub mod stock_entry;
pub mod supplier;
pub mod user;

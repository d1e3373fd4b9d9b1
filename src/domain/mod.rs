//! Core domain types and logic.

pub mod price;
pub mod pagination;
pub mod ticker;
pub mod projection;
pub mod portfolio;
pub mod summary;
pub mod format;
pub mod raw_import;
pub mod config_validation;
pub mod error;

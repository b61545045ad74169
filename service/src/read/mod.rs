//! Read models.

pub mod analytics;
pub mod flash_sale;
pub mod pricing;
pub mod purchase;

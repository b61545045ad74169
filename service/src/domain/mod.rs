//! Domain definitions.

pub mod flash_sale;
pub mod price_history;
pub mod pricing_rule;
pub mod product;
pub mod purchase;
pub mod stock;
pub mod user;

pub use self::{
    flash_sale::FlashSale, pricing_rule::PricingRule, product::Product,
    purchase::Purchase,
};

//! Analytics [`Query`] collection.
//!
//! [`Query`]: super::Query

pub mod flash_sale;
pub mod price_elasticity;
pub mod revenue_by_day;

pub use self::{
    flash_sale::FlashSaleAnalytics, price_elasticity::PriceElasticity,
    revenue_by_day::RevenueByDay,
};

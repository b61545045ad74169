//! [`Database`] operation implementations of the [`InMemory`] database.
//!
//! [`Database`]: crate::infra::Database
//! [`InMemory`]: super::InMemory

mod attempt;
mod flash_sale;
mod price_history;
mod pricing_rule;
mod product;
mod purchase;
mod stock;

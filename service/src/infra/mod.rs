//! Infrastructure implementations.

pub mod cache;
pub mod database;

pub use self::{cache::PriceCache, database::Database};

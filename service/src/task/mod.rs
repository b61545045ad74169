//! Background [`Task`]s definitions.

mod background;
pub mod capture_price_snapshots;
pub mod process_purchases;

pub use common::Handler as Task;

pub use self::{
    background::Background,
    capture_price_snapshots::CapturePriceSnapshots,
    process_purchases::ProcessPurchases,
};

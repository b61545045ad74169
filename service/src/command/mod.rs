//! [`Command`] definition.

pub mod create_flash_sale;
pub mod create_pricing_rule;
pub mod create_product;
pub mod delete_pricing_rule;
pub mod end_flash_sale;
pub mod purchase_in_flash_sale;
pub mod record_visit;
pub mod submit_purchase;
pub mod update_pricing_rule;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    create_flash_sale::CreateFlashSale,
    create_pricing_rule::CreatePricingRule, create_product::CreateProduct,
    delete_pricing_rule::DeletePricingRule, end_flash_sale::EndFlashSale,
    purchase_in_flash_sale::PurchaseInFlashSale, record_visit::RecordVisit,
    submit_purchase::SubmitPurchase, update_pricing_rule::UpdatePricingRule,
};

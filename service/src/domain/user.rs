//! [`User`]-related definitions.
//!
//! Authentication is owned by an external collaborator, so the core only
//! carries the identity and the pricing [`Tier`] it is handed.
//!
//! [`User`]: Id

use common::define_kind;
use derive_more::{Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ID of a user.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_kind! {
    #[doc = "Pricing tier of a user."]
    enum Tier {
        #[doc = "Regular user without any privileges."]
        Standard = 1,

        #[doc = "Silver loyalty tier."]
        Silver = 2,

        #[doc = "Gold loyalty tier."]
        Gold = 3,

        #[doc = "Platinum loyalty tier."]
        Platinum = 4,
    }
}

//! Installment quantities and raw lookup responses

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of installments of a card sale.
///
/// Zero is meaningful: the processor answered with "no content" for the sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstallmentQuantity(u16);

impl InstallmentQuantity {
    pub const ZERO: Self = Self(0);

    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Value bound to the integer column on update.
    pub fn as_sql_int(self) -> i32 {
        i32::from(self.0)
    }
}

impl fmt::Display for InstallmentQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u16> for InstallmentQuantity {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl TryFrom<u32> for InstallmentQuantity {
    type Error = std::num::TryFromIntError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        u16::try_from(value).map(Self)
    }
}

/// What the lookup endpoint answered, before any reconciliation rule is
/// applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResponse {
    /// HTTP 200. `None` when the payload lacks
    /// `content.installments[0].installmentQuantity`.
    Ok(Option<InstallmentQuantity>),
    /// HTTP 204.
    NoContent,
    /// HTTP 401 with the `message` field of the error body (empty if absent).
    Unauthorized { message: String },
    /// Any other status.
    Failed { status: u16, body: String },
}

impl LookupResponse {
    /// Whether a 401 message says the bearer token expired.
    pub fn is_expired_token(&self) -> bool {
        match self {
            Self::Unauthorized { message } => {
                message.to_lowercase().contains(crate::constants::TOKEN_EXPIRED_MARKER)
            }
            _ => false,
        }
    }
}

//! Domain types and models

pub mod installment;
pub mod sale;
pub mod token;

pub use installment::{InstallmentQuantity, LookupResponse};
pub use sale::{Batch, FailureSet, SaleRecord};
pub use token::AccessToken;

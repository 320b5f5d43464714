//! Decimal type utilities for precise monetary amounts

pub use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;

use crate::error::{IntoError, Result};

/// Monetary amount with fixed-point precision
pub type Amount = Decimal;

/// Precision helpers for stored amounts
pub mod precision {
    use super::*;

    /// Maximum number of fractional digits an amount may carry
    pub const AMOUNT_PRECISION: u32 = 8;

    /// Round an amount to the stored precision
    pub fn round_amount(amount: Amount) -> Amount {
        amount.round_dp(AMOUNT_PRECISION)
    }
}

/// Render an amount the way it is written to the store.
///
/// Trailing zeros are dropped so `100.00` and `100` map to the same value.
pub fn to_store_value(amount: Amount) -> String {
    amount.normalize().to_string()
}

/// Parse an amount read back from the store.
pub fn from_store_value(value: &str) -> Result<Amount> {
    value
        .trim()
        .parse::<Amount>()
        .map_err(|e| e.into_error(&format!("Invalid stored amount {:?}", value)))
}

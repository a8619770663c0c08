use rust_decimal::Decimal;

use crate::decimal::Money;
use crate::errors::{FeeError, Result};

/// number of billing periods in a year for a plan interval
///
/// only monthly (1), quarterly (3), and yearly (12) plans exist; any other
/// interval is bad reference data, not a transient failure
pub fn periods_per_year(interval_months: i32) -> Result<u32> {
    match interval_months {
        12 => Ok(1),
        3 => Ok(4),
        1 => Ok(12),
        other => Err(FeeError::UnsupportedInterval { months: other }),
    }
}

/// split a total amount across one year of the plan's periods
pub fn per_period_amount(total: Money, interval_months: i32) -> Result<Money> {
    let periods = periods_per_year(interval_months)?;
    Ok(total / Decimal::from(periods))
}

//! Bet size limits anchored on the first wager of a session.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ValidationError;
use crate::ledger::LedgerSnapshot;
use crate::session::{BetPercentages, Session};

/// Smallest stake the ledger accepts.
pub const MIN_WAGER_AMOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Largest stake the ledger accepts (one trillion). Pool sums and payout
/// products stay far inside the `Decimal` range below it.
pub const MAX_WAGER_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// Admissible wager range. `max == None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BetLimits {
    /// Smallest admissible amount.
    pub min: Decimal,
    /// Largest admissible amount, if any.
    pub max: Option<Decimal>,
}

impl BetLimits {
    /// No constraint beyond positivity.
    pub const UNBOUNDED: BetLimits = BetLimits {
        min: Decimal::ZERO,
        max: None,
    };

    /// Whether no baseline exists yet.
    pub fn is_unbounded(&self) -> bool {
        self.max.is_none() && self.min.is_zero()
    }

    /// Check an amount against these limits.
    pub fn check(&self, amount: Decimal) -> Result<(), ValidationError> {
        validate(amount, self)
    }
}

/// Limits derived from the percentages and the first wager's amount.
pub fn limits_for(percentages: BetPercentages, first_wager_amount: Option<Decimal>) -> BetLimits {
    match first_wager_amount {
        None => BetLimits::UNBOUNDED,
        Some(first) => BetLimits {
            min: percent_of(first, percentages.min),
            max: Some(percent_of(first, percentages.max)),
        },
    }
}

/// Limits for a session given its current ledger.
pub fn limits(session: &Session, snapshot: &LedgerSnapshot) -> BetLimits {
    limits_for(session.percentages, snapshot.first_wager_amount)
}

/// Check the bounds every wager must satisfy, whatever the session limits.
pub fn check_amount(amount: Decimal) -> Result<(), ValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount);
    }
    if amount < MIN_WAGER_AMOUNT {
        return Err(ValidationError::AmountTooSmall);
    }
    if amount > MAX_WAGER_AMOUNT {
        return Err(ValidationError::AmountTooLarge {
            max: MAX_WAGER_AMOUNT,
        });
    }
    Ok(())
}

/// Validate a wager amount against limits.
pub fn validate(amount: Decimal, limits: &BetLimits) -> Result<(), ValidationError> {
    check_amount(amount)?;
    if amount < limits.min {
        return Err(ValidationError::BelowMinimum { min: limits.min });
    }
    if let Some(max) = limits.max {
        if amount > max {
            return Err(ValidationError::AboveMaximum { max });
        }
    }
    Ok(())
}

fn percent_of(amount: Decimal, percentage: u32) -> Decimal {
    // Saturates for baselines recorded outside the amount bounds
    amount
        .checked_mul(Decimal::from(percentage))
        .map(|scaled| (scaled / Decimal::ONE_HUNDRED).normalize())
        .unwrap_or(Decimal::MAX)
}

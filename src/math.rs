//! Mathematical utilities for the lending protocol
//! Implements safe math operations and the valuation/settlement formulas
use crate::lending::errors::ProtocolError;
use odra::casper_types::U256;

/// Basis point denominator (100% = 10,000 bps)
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Scale applied to USD valuations (1e18)
pub const USD_SCALE: u128 = 1_000_000_000_000_000_000;

/// Safe math operations for U256
pub struct SafeMath;

impl SafeMath {
    /// Safe addition with overflow check
    pub fn add(a: U256, b: U256) -> Result<U256, ProtocolError> {
        a.checked_add(b).ok_or(ProtocolError::MathOverflow)
    }

    /// Safe subtraction with underflow check
    pub fn sub(a: U256, b: U256) -> Result<U256, ProtocolError> {
        a.checked_sub(b).ok_or(ProtocolError::MathUnderflow)
    }

    /// Safe multiplication with overflow check
    pub fn mul(a: U256, b: U256) -> Result<U256, ProtocolError> {
        a.checked_mul(b).ok_or(ProtocolError::MathOverflow)
    }

    /// Safe division with zero check
    pub fn div(a: U256, b: U256) -> Result<U256, ProtocolError> {
        if b.is_zero() {
            return Err(ProtocolError::DivisionByZero);
        }
        Ok(a / b)
    }

    /// Returns the minimum of two U256 values
    pub fn min(a: U256, b: U256) -> U256 {
        if a < b { a } else { b }
    }

    /// Returns the maximum of two U256 values
    pub fn max(a: U256, b: U256) -> U256 {
        if a > b { a } else { b }
    }

    /// 10^exp as U256
    pub fn pow10(exp: u32) -> Result<U256, ProtocolError> {
        U256::from(10u8)
            .checked_pow(U256::from(exp))
            .ok_or(ProtocolError::MathOverflow)
    }
}

/// Loan valuation and settlement calculations
pub struct LoanMath;

impl LoanMath {
    /// USD value of an asset amount, scaled by 1e18
    /// value = amount * price * 1e18 / 10^(price_decimals + asset_decimals)
    pub fn usd_value(
        amount: U256,
        price_usd: U256,
        price_decimals: u8,
        asset_decimals: u8,
    ) -> Result<U256, ProtocolError> {
        let numerator = SafeMath::mul(
            SafeMath::mul(amount, price_usd)?,
            U256::from(USD_SCALE),
        )?;
        let divisor = SafeMath::pow10(price_decimals as u32 + asset_decimals as u32)?;
        SafeMath::div(numerator, divisor)
    }

    /// Ratio of two USD values expressed in basis points, clamped to u32::MAX
    /// ratio_bps = collateral_value * 10,000 / loan_value
    pub fn ratio_bps(collateral_value: U256, loan_value: U256) -> Result<u32, ProtocolError> {
        let ratio = SafeMath::div(
            SafeMath::mul(collateral_value, U256::from(BPS_DENOMINATOR))?,
            loan_value,
        )?;
        if ratio > U256::from(u32::MAX) {
            return Ok(u32::MAX);
        }
        Ok(ratio.as_u32())
    }

    /// Interest accrued linearly over the loan term, capped at maturity
    /// interest = principal * rate_bps * min(elapsed, duration) / (10,000 * duration)
    pub fn accrued_interest(
        principal: U256,
        interest_rate_bps: u32,
        elapsed_ms: u64,
        duration_ms: u64,
    ) -> Result<U256, ProtocolError> {
        if duration_ms == 0 {
            return Err(ProtocolError::InvalidDuration);
        }
        let elapsed = if elapsed_ms > duration_ms {
            duration_ms
        } else {
            elapsed_ms
        };
        let numerator = SafeMath::mul(
            SafeMath::mul(principal, U256::from(interest_rate_bps))?,
            U256::from(elapsed),
        )?;
        let denominator = SafeMath::mul(
            U256::from(BPS_DENOMINATOR),
            U256::from(duration_ms),
        )?;
        SafeMath::div(numerator, denominator)
    }

    /// A lender's share of an escrow, floor division
    /// share = escrow * contribution / total_funded
    /// Rounding dust stays in the escrow
    pub fn pro_rata_share(
        escrow: U256,
        contribution: U256,
        total_funded: U256,
    ) -> Result<U256, ProtocolError> {
        SafeMath::div(SafeMath::mul(escrow, contribution)?, total_funded)
    }

    /// Amount of the output asset equal in USD value to `amount_in` of the
    /// input asset, given both oracle prices
    /// out = in * price_in * 10^(out_price_dec + out_asset_dec)
    ///     / (price_out * 10^(in_price_dec + in_asset_dec))
    pub fn convert_amount(
        amount_in: U256,
        price_in: U256,
        price_in_decimals: u8,
        asset_in_decimals: u8,
        price_out: U256,
        price_out_decimals: u8,
        asset_out_decimals: u8,
    ) -> Result<U256, ProtocolError> {
        let out_pow = SafeMath::pow10(price_out_decimals as u32 + asset_out_decimals as u32)?;
        let in_pow = SafeMath::pow10(price_in_decimals as u32 + asset_in_decimals as u32)?;
        let numerator = SafeMath::mul(SafeMath::mul(amount_in, price_in)?, out_pow)?;
        let denominator = SafeMath::mul(price_out, in_pow)?;
        SafeMath::div(numerator, denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usd_value() {
        // 2000 units of a 9-decimal asset at $1.50 (9-decimal feed)
        let value = LoanMath::usd_value(
            U256::from(2_000u64),
            U256::from(1_500_000_000u64),
            9,
            9,
        )
        .unwrap();
        // 2000 * 1.5e9 * 1e18 / 1e18 = 3e12
        assert_eq!(value, U256::from(3_000_000_000_000u64));
    }

    #[test]
    fn test_usd_value_mixed_decimals() {
        // 5_000_000 units of a 6-decimal asset at $2.00 (8-decimal feed)
        let value = LoanMath::usd_value(
            U256::from(5_000_000u64),
            U256::from(200_000_000u64),
            8,
            6,
        )
        .unwrap();
        // 5 whole units * $2 = $10, scaled by 1e18
        assert_eq!(value, U256::from(10u64) * U256::from(USD_SCALE));
    }

    #[test]
    fn test_ratio_bps() {
        let collateral = U256::from(3_000u64);
        let loan = U256::from(1_000u64);
        assert_eq!(LoanMath::ratio_bps(collateral, loan).unwrap(), 30_000);

        let exact = LoanMath::ratio_bps(U256::from(1_500u64), U256::from(1_000u64)).unwrap();
        assert_eq!(exact, 15_000);
    }

    #[test]
    fn test_ratio_bps_zero_loan_value() {
        let result = LoanMath::ratio_bps(U256::from(100u64), U256::zero());
        assert!(matches!(result, Err(ProtocolError::DivisionByZero)));
    }

    #[test]
    fn test_accrued_interest_linear() {
        let principal = U256::from(1_000u64);
        let duration = 1_000_000u64;

        // Nothing accrues at t = 0
        let at_start = LoanMath::accrued_interest(principal, 800, 0, duration).unwrap();
        assert_eq!(at_start, U256::zero());

        // Half the term accrues half the flat-rate interest
        let halfway = LoanMath::accrued_interest(principal, 800, duration / 2, duration).unwrap();
        assert_eq!(halfway, U256::from(40u64));

        // Full term: 1000 * 8% = 80
        let at_maturity = LoanMath::accrued_interest(principal, 800, duration, duration).unwrap();
        assert_eq!(at_maturity, U256::from(80u64));
    }

    #[test]
    fn test_accrued_interest_capped_after_maturity() {
        let principal = U256::from(1_000u64);
        let duration = 1_000_000u64;
        let late = LoanMath::accrued_interest(principal, 800, duration * 3, duration).unwrap();
        assert_eq!(late, U256::from(80u64));
    }

    #[test]
    fn test_accrued_interest_zero_duration() {
        let result = LoanMath::accrued_interest(U256::from(1_000u64), 800, 0, 0);
        assert!(matches!(result, Err(ProtocolError::InvalidDuration)));
    }

    #[test]
    fn test_pro_rata_share() {
        let escrow = U256::from(1_080u64);
        let funded = U256::from(1_000u64);

        let first = LoanMath::pro_rata_share(escrow, U256::from(600u64), funded).unwrap();
        let second = LoanMath::pro_rata_share(escrow, U256::from(400u64), funded).unwrap();
        assert_eq!(first, U256::from(648u64));
        assert_eq!(second, U256::from(432u64));
        assert_eq!(first + second, escrow);
    }

    #[test]
    fn test_pro_rata_share_floors_and_leaves_dust() {
        let escrow = U256::from(1_001u64);
        let funded = U256::from(3u64);

        let first = LoanMath::pro_rata_share(escrow, U256::from(1u64), funded).unwrap();
        let second = LoanMath::pro_rata_share(escrow, U256::from(2u64), funded).unwrap();
        assert_eq!(first, U256::from(333u64));
        assert_eq!(second, U256::from(667u64));
        // One unit of dust remains unclaimable
        assert_eq!(first + second, U256::from(1_000u64));
    }

    #[test]
    fn test_convert_amount_same_decimals() {
        // 1450 units at $1.00 into a $1.00 asset, both 9-decimal
        let out = LoanMath::convert_amount(
            U256::from(1_450u64),
            U256::from(1_000_000_000u64),
            9,
            9,
            U256::from(1_000_000_000u64),
            9,
            9,
        )
        .unwrap();
        assert_eq!(out, U256::from(1_450u64));
    }

    #[test]
    fn test_convert_amount_price_ratio() {
        // 100 units at $3.00 into a $2.00 asset = 150 units
        let out = LoanMath::convert_amount(
            U256::from(100u64),
            U256::from(3_000_000_000u64),
            9,
            9,
            U256::from(2_000_000_000u64),
            9,
            9,
        )
        .unwrap();
        assert_eq!(out, U256::from(150u64));
    }

    #[test]
    fn test_convert_amount_zero_output_price() {
        let result = LoanMath::convert_amount(
            U256::from(100u64),
            U256::from(1_000_000_000u64),
            9,
            9,
            U256::zero(),
            9,
            9,
        );
        assert!(matches!(result, Err(ProtocolError::DivisionByZero)));
    }

    #[test]
    fn test_safe_math_bounds() {
        assert!(matches!(
            SafeMath::add(U256::MAX, U256::one()),
            Err(ProtocolError::MathOverflow)
        ));
        assert!(matches!(
            SafeMath::sub(U256::zero(), U256::one()),
            Err(ProtocolError::MathUnderflow)
        ));
        assert!(matches!(
            SafeMath::mul(U256::MAX, U256::from(2u64)),
            Err(ProtocolError::MathOverflow)
        ));
        assert!(matches!(
            SafeMath::div(U256::one(), U256::zero()),
            Err(ProtocolError::DivisionByZero)
        ));
    }
}

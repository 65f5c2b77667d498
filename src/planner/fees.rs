//! Fee reserve policy

/// Lamports left behind in a sending wallet to pay the network fee
pub const DEFAULT_FEE_RESERVE_LAMPORTS: u64 = 5_000;

/// Amount that can leave a wallet without dipping into the fee reserve
///
/// Returns `min(desired, balance - fee_reserve)`, floored at zero. A zero
/// result means the transfer must be skipped, not submitted.
pub fn compute_sendable_amount(balance: u64, desired: u64, fee_reserve: u64) -> u64 {
    desired.min(balance.saturating_sub(fee_reserve))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::transfer::sol_to_lamports;

    #[test]
    fn test_desired_fits_under_balance() {
        let sendable = compute_sendable_amount(
            sol_to_lamports(1.0),
            sol_to_lamports(0.5),
            sol_to_lamports(0.1),
        );
        assert_eq!(sendable, sol_to_lamports(0.5));
    }

    #[test]
    fn test_balance_below_reserve_is_zero() {
        let sendable = compute_sendable_amount(
            sol_to_lamports(0.05),
            sol_to_lamports(0.5),
            sol_to_lamports(0.1),
        );
        assert_eq!(sendable, 0);
    }

    #[test]
    fn test_capped_by_balance_minus_reserve() {
        assert_eq!(compute_sendable_amount(10_000, 50_000, 5_000), 5_000);
        assert_eq!(compute_sendable_amount(5_000, 50_000, 5_000), 0);
    }

    #[test]
    fn test_sweep_takes_everything_but_reserve() {
        assert_eq!(
            compute_sendable_amount(1_000_000, u64::MAX, DEFAULT_FEE_RESERVE_LAMPORTS),
            995_000
        );
    }
}

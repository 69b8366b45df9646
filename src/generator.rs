//! Synthetic transaction generation.
//!
//! One transaction per cycle. A Bernoulli draw with the fraud-injection
//! probability decides whether the amount comes from the high band; the
//! initial risk score ignores that draw, so the detectors have to find the
//! biased transactions on their own.

use crate::types::transaction::{Category, Transaction, LOCATIONS};
use rand::Rng;
use std::ops::Range;

/// Amount band for fraud-biased transactions
pub const BIASED_AMOUNT_RANGE: Range<f64> = 5_000.0..50_000.0;
/// Amount band for ordinary transactions
pub const NORMAL_AMOUNT_RANGE: Range<f64> = 0.0..2_500.0;
/// Initial risk score band
pub const INITIAL_RISK_RANGE: Range<u8> = 0..25;

/// Transaction generator for the simulated stream
pub struct TransactionGenerator;

impl TransactionGenerator {
    /// Generate one LEGIT transaction.
    ///
    /// `fraud_probability` is clamped to [0, 1]; NaN counts as 0.
    pub fn generate<R: Rng>(rng: &mut R, fraud_probability: f64) -> Transaction {
        let probability = if fraud_probability.is_nan() {
            0.0
        } else {
            fraud_probability.clamp(0.0, 1.0)
        };

        let biased = rng.gen_bool(probability);
        let band = if biased {
            BIASED_AMOUNT_RANGE
        } else {
            NORMAL_AMOUNT_RANGE
        };
        // Whole currency units, like the dashboard displays them
        let amount = rng.gen_range(band).floor();

        let category = Category::ALL[rng.gen_range(0..Category::ALL.len())];
        let location = LOCATIONS[rng.gen_range(0..LOCATIONS.len())];

        Transaction::new(Self::transaction_id(rng), amount, category, location)
            .with_accounts(Self::account_id(rng), Self::account_id(rng))
            .with_risk_score(rng.gen_range(INITIAL_RISK_RANGE))
    }

    fn transaction_id<R: Rng>(rng: &mut R) -> String {
        let uuid = uuid::Builder::from_random_bytes(rng.gen()).into_uuid();
        let hex = uuid.simple().to_string().to_ascii_uppercase();
        format!("TX-{}", &hex[..12])
    }

    fn account_id<R: Rng>(rng: &mut R) -> String {
        format!("ACC-{}", rng.gen_range(100_000..1_000_000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionStatus;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_transactions_are_legit_and_bounded() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let tx = TransactionGenerator::generate(&mut rng, 0.5);
            assert_eq!(tx.status, TransactionStatus::Legit);
            assert!(tx.risk_score < 25);
            assert!(tx.amount >= 0.0 && tx.amount < 50_000.0);
            assert!(tx.reasoning.is_none());
            assert!(LOCATIONS.contains(&tx.location.as_str()));
        }
    }

    #[test]
    fn test_probability_one_draws_from_high_band() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let tx = TransactionGenerator::generate(&mut rng, 1.0);
            assert!(BIASED_AMOUNT_RANGE.contains(&tx.amount), "amount {}", tx.amount);
        }
    }

    #[test]
    fn test_probability_zero_draws_from_low_band() {
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..200 {
            let tx = TransactionGenerator::generate(&mut rng, 0.0);
            assert!(NORMAL_AMOUNT_RANGE.contains(&tx.amount), "amount {}", tx.amount);
        }
    }

    #[test]
    fn test_out_of_range_probability_is_clamped() {
        let mut rng = StdRng::seed_from_u64(17);
        let high = TransactionGenerator::generate(&mut rng, 3.0);
        assert!(high.amount >= 5_000.0);
        let low = TransactionGenerator::generate(&mut rng, f64::NAN);
        assert!(low.amount < 2_500.0);
    }

    #[test]
    fn test_identifier_format() {
        let mut rng = StdRng::seed_from_u64(19);
        let tx = TransactionGenerator::generate(&mut rng, 0.1);
        assert!(tx.id.starts_with("TX-"));
        assert_eq!(tx.id.len(), 15);
        assert!(tx.sender.starts_with("ACC-"));
        assert_eq!(tx.receiver.len(), 10);
    }

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = StdRng::seed_from_u64(23);
        let mut b = StdRng::seed_from_u64(23);
        let tx_a = TransactionGenerator::generate(&mut a, 0.3);
        let tx_b = TransactionGenerator::generate(&mut b, 0.3);
        assert_eq!(tx_a.id, tx_b.id);
        assert_eq!(tx_a.amount, tx_b.amount);
        assert_eq!(tx_a.sender, tx_b.sender);
    }
}

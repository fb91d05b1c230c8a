//! Sentiment Multiplier
//!
//! Scales the base investment by market mood: fear buys more, greed buys less.
//!
//! ```text
//!  index   0 ──── 20 │ 21 ──── 40 │ 41 ── 60 │ 61 ──── 80 │ 81 ──── 100
//!  mult  2.0 ─── 1.6 │1.56 ─ 1.275│   1.0    │0.91 ─ 0.625│0.652 ─── 0.5
//! ```
//!
//! Each band interpolates between anchor points (25, 45, 55, 75) that sit
//! off the cut points (20, 40, 60, 80), so the curve jumps at every cut.
//! The jumps are part of the policy and must not be smoothed out.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::{EngineError, Result};

/// Investment multiplier for a sentiment index in [0, 100]
pub fn multiplier(value: u8) -> Result<Decimal> {
    if value > 100 {
        return Err(EngineError::SentimentOutOfRange(i64::from(value)));
    }

    let v = Decimal::from(value);
    let m = match value {
        // Extreme fear: 0 -> 2.0, anchored at 25 -> 1.5
        0..=20 => dec!(1.5) + ((dec!(25) - v) / dec!(25)) * dec!(0.5),
        // Fear: anchored at 25 -> 1.5, 45 -> 1.2
        21..=40 => dec!(1.2) + ((dec!(45) - v) / dec!(20)) * dec!(0.3),
        // Neutral
        41..=60 => Decimal::ONE,
        // Greed: anchored at 55 -> 1.0, 75 -> 0.7
        61..=80 => dec!(0.7) + ((dec!(75) - v) / dec!(20)) * dec!(0.3),
        // Extreme greed: anchored at 75 -> 0.7, 100 -> 0.5
        _ => dec!(0.5) + ((dec!(100) - v) / dec!(25)) * dec!(0.2),
    };

    Ok(m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_values() {
        assert_eq!(multiplier(0).unwrap(), dec!(2.0));
        assert_eq!(multiplier(50).unwrap(), dec!(1.0));
        assert_eq!(multiplier(100).unwrap(), dec!(0.5));
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(multiplier(20).unwrap(), dec!(1.6));
        assert_eq!(multiplier(40).unwrap(), dec!(1.275));
        assert_eq!(multiplier(41).unwrap(), dec!(1.0));
        assert_eq!(multiplier(60).unwrap(), dec!(1.0));
        assert_eq!(multiplier(61).unwrap(), dec!(0.91));
        assert_eq!(multiplier(80).unwrap(), dec!(0.625));
        assert_eq!(multiplier(81).unwrap(), dec!(0.652));
    }

    /// The cut points do not line up with the interpolation anchors, so the
    /// curve is discontinuous at 20/21, 40/41, 60/61 and 80/81. Intentional.
    #[test]
    fn test_discontinuities_are_preserved() {
        let jump = |lo: u8| multiplier(lo + 1).unwrap() - multiplier(lo).unwrap();

        assert_eq!(multiplier(21).unwrap(), dec!(1.56));
        assert_eq!(jump(20), dec!(-0.04));
        assert_eq!(jump(40), dec!(-0.275));
        assert_eq!(jump(60), dec!(-0.09));
        // Extreme greed band starts above where greed ends
        assert_eq!(jump(80), dec!(0.027));
    }

    #[test]
    fn test_positive_and_monotonic_within_bands() {
        let bands: [(u8, u8); 5] = [(0, 20), (21, 40), (41, 60), (61, 80), (81, 100)];

        for (lo, hi) in bands {
            for v in lo..hi {
                let here = multiplier(v).unwrap();
                let next = multiplier(v + 1).unwrap();
                assert!(here > Decimal::ZERO);
                assert!(next <= here, "multiplier rose inside band at {v}");
            }
        }
    }

    #[test]
    fn test_out_of_range() {
        assert!(matches!(
            multiplier(101),
            Err(EngineError::SentimentOutOfRange(101))
        ));
        assert!(multiplier(u8::MAX).is_err());
    }

    #[test]
    fn test_pure() {
        for v in 0..=100 {
            assert_eq!(multiplier(v).unwrap(), multiplier(v).unwrap());
        }
    }
}

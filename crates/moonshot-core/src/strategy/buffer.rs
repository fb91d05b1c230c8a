//! Dynamic Cash Buffer
//!
//! Fraction of the cash balance held back from the current buy cycle so
//! there is something left for a later dip. Nothing is held back in extreme
//! fear; up to 20% is held back once the market turns greedy. The buffer is
//! never tracked between runs, it is recomputed from the live balance.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::{EngineError, Result};

/// Largest fraction ever withheld
pub const MAX_BUFFER: Decimal = dec!(0.20);

/// Cash-reserve fraction for a sentiment index in [0, 100]
pub fn buffer_fraction(value: u8) -> Result<Decimal> {
    if value > 100 {
        return Err(EngineError::SentimentOutOfRange(i64::from(value)));
    }

    let v = Decimal::from(value);
    let fraction = match value {
        0..=20 => Decimal::ZERO,
        // 5% - 10%
        21..=40 => dec!(0.05) + ((dec!(40) - v) / dec!(20)) * dec!(0.05),
        // 15% - 20%
        41..=60 => dec!(0.15) + ((dec!(60) - v) / dec!(20)) * dec!(0.05),
        _ => MAX_BUFFER,
    };

    Ok(fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_bands() {
        assert_eq!(buffer_fraction(0).unwrap(), Decimal::ZERO);
        assert_eq!(buffer_fraction(20).unwrap(), Decimal::ZERO);
        assert_eq!(buffer_fraction(61).unwrap(), dec!(0.20));
        assert_eq!(buffer_fraction(100).unwrap(), dec!(0.20));
    }

    #[test]
    fn test_interpolated_bands() {
        assert_eq!(buffer_fraction(21).unwrap(), dec!(0.0975));
        assert_eq!(buffer_fraction(30).unwrap(), dec!(0.075));
        assert_eq!(buffer_fraction(40).unwrap(), dec!(0.05));
        assert_eq!(buffer_fraction(41).unwrap(), dec!(0.1975));
        assert_eq!(buffer_fraction(50).unwrap(), dec!(0.175));
        assert_eq!(buffer_fraction(60).unwrap(), dec!(0.15));
    }

    #[test]
    fn test_bounds() {
        for v in 0..=100 {
            let b = buffer_fraction(v).unwrap();
            assert!(b >= Decimal::ZERO && b <= MAX_BUFFER, "buffer {b} at {v}");
        }
    }

    #[test]
    fn test_out_of_range() {
        assert!(matches!(
            buffer_fraction(200),
            Err(EngineError::SentimentOutOfRange(200))
        ));
    }
}

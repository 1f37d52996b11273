//! Population standard deviation.
//!
//! Mean and variance are accumulated in `Decimal`; only the square root is
//! taken in `f64`.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

/// sqrt(Σ (x − mean)² / n). `None` for an empty slice.
pub fn population_stddev(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }

    let n = Decimal::from(values.len());
    let mean = values.iter().sum::<Decimal>() / n;
    let variance = values
        .iter()
        .map(|v| {
            let diff = *v - mean;
            diff * diff
        })
        .sum::<Decimal>()
        / n;

    Decimal::from_f64(variance.to_f64()?.sqrt())
}

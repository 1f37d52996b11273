//! Price and snapshot access port trait.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::error::StocklensError;
use crate::domain::price::PricePoint;
use crate::domain::snapshot::IndicatorSnapshot;

pub trait DataPort {
    /// Up to `max_points` rows at or before `as_of`, newest first.
    fn get_price_window(
        &self,
        symbol: &str,
        as_of: NaiveDate,
        max_points: usize,
    ) -> Result<Vec<PricePoint>, StocklensError>;

    fn list_symbols(&self) -> Result<Vec<String>, StocklensError>;

    fn get_indicator_snapshot(&self, symbol: &str) -> Result<IndicatorSnapshot, StocklensError>;

    fn get_all_indicator_snapshots(
        &self,
    ) -> Result<HashMap<String, IndicatorSnapshot>, StocklensError>;
}

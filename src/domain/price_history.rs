//! One symbol's chronological price history with a date index.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::domain::price::PricePoint;

#[derive(Debug, Clone)]
pub struct SymbolHistory {
    pub symbol: String,
    pub points: Vec<PricePoint>,
    pub date_index: HashMap<NaiveDate, usize>,
}

impl SymbolHistory {
    /// `points` must already be in ascending date order.
    pub fn new(symbol: String, points: Vec<PricePoint>) -> Self {
        let date_index = points
            .iter()
            .enumerate()
            .map(|(i, p)| (p.date, i))
            .collect();
        Self {
            symbol,
            points,
            date_index,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.date_index.get(&date).copied()
    }

    /// All points up to and including `index`.
    pub fn through(&self, index: usize) -> &[PricePoint] {
        &self.points[..=index]
    }

    /// Latest point dated on or before `date`.
    pub fn last_on_or_before(&self, date: NaiveDate) -> Option<&PricePoint> {
        let idx = self.points.partition_point(|p| p.date <= date);
        idx.checked_sub(1).map(|i| &self.points[i])
    }
}

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::optimizer::DispatchError;

/// Electricity price for one hour of the horizon (GBP/MWh).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub hour: i64,
    pub price: f64,
}

impl PricePoint {
    pub fn new(hour: i64, price: f64) -> Self {
        Self { hour, price }
    }
}

/// Ordered hourly price curve over a gapless run of hours.
///
/// Hours may start at any integer but always increase by exactly one, so a
/// price is found by its hour label and never by position alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self, DispatchError> {
        if points.is_empty() {
            return Err(DispatchError::InvalidInput(
                "price series is empty".to_string(),
            ));
        }

        if let Some(point) = points.iter().find(|p| !p.price.is_finite()) {
            return Err(DispatchError::InvalidInput(format!(
                "price at hour {} is not a finite number: {}",
                point.hour, point.price
            )));
        }

        if let Some((a, b)) = points
            .iter()
            .tuple_windows()
            .find(|(a, b)| a.hour.checked_add(1) != Some(b.hour))
        {
            return Err(DispatchError::InvalidInput(format!(
                "hours must increase by exactly one, found {} followed by {}",
                a.hour, b.hour
            )));
        }

        Ok(Self { points })
    }

    /// Build a series from consecutive prices starting at `first_hour`.
    pub fn from_prices(first_hour: i64, prices: &[f64]) -> Result<Self, DispatchError> {
        let points = prices
            .iter()
            .enumerate()
            .map(|(offset, &price)| {
                i64::try_from(offset)
                    .ok()
                    .and_then(|offset| first_hour.checked_add(offset))
                    .map(|hour| PricePoint::new(hour, price))
                    .ok_or_else(|| {
                        DispatchError::InvalidInput(format!(
                            "{} hours starting at {} run past the last representable hour",
                            prices.len(),
                            first_hour
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(points)
    }

    pub fn first_hour(&self) -> i64 {
        self.points[0].hour
    }

    pub fn last_hour(&self) -> i64 {
        self.points[self.points.len() - 1].hour
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn hours(&self) -> impl Iterator<Item = i64> + '_ {
        self.points.iter().map(|p| p.hour)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PricePoint> + '_ {
        self.points.iter()
    }

    /// Price for an hour label, `None` outside the horizon.
    pub fn price_at(&self, hour: i64) -> Option<f64> {
        let offset = hour.checked_sub(self.first_hour())?;
        let index = usize::try_from(offset).ok()?;
        self.points.get(index).map(|p| p.price)
    }

    /// Same hours with every price multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Result<Self, DispatchError> {
        let points = self
            .points
            .iter()
            .map(|p| PricePoint::new(p.hour, p.price * factor))
            .collect();
        Self::new(points)
    }

    pub fn average_price(&self) -> f64 {
        self.points.iter().map(|p| p.price).sum::<f64>() / self.points.len() as f64
    }
}

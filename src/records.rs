//! CSV plumbing around the optimizer: hourly prices in, dispatch records out.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::{DispatchSchedule, PricePoint, PriceSeries};
use crate::optimizer::DispatchError;

#[derive(Debug, Deserialize)]
struct PriceRow {
    #[serde(rename = "Hour")]
    hour: i64,
    #[serde(rename = "Price (GBP/MWh)", alias = "Price")]
    price: f64,
}

/// Read a price curve with `Hour` and `Price (GBP/MWh)` columns.
pub fn read_prices(reader: impl Read) -> Result<PriceSeries, DispatchError> {
    let mut rows = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut points = Vec::new();
    for (index, row) in rows.deserialize::<PriceRow>().enumerate() {
        let row = row.map_err(|err| {
            DispatchError::InvalidInput(format!("row {}: {}", index + 1, err))
        })?;
        points.push(PricePoint::new(row.hour, row.price));
    }

    PriceSeries::new(points)
}

pub fn read_prices_file(path: &Path) -> Result<PriceSeries> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let prices = read_prices(file).with_context(|| format!("reading {}", path.display()))?;
    Ok(prices)
}

/// Write one CSV row per dispatch record.
pub fn write_schedule(writer: impl Write, schedule: &DispatchSchedule) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    for record in schedule.iter() {
        out.serialize(record)?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_schedule_file(path: &Path, schedule: &DispatchSchedule) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_schedule(file, schedule).with_context(|| format!("writing {}", path.display()))
}

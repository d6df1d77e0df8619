//! Profit-maximising charge/discharge schedule for a grid battery trading
//! against a known hourly price curve.
//!
//! ```no_run
//! use battery_dispatch::domain::{BatteryParameters, PriceSeries};
//! use battery_dispatch::optimizer::optimize_battery;
//!
//! let prices = PriceSeries::from_prices(1, &[10.0, 10.0, 100.0, 100.0])?;
//! let schedule = optimize_battery(&prices, &BatteryParameters::default())?;
//! println!("profit: {:.2}", schedule.profit);
//! # Ok::<(), battery_dispatch::optimizer::DispatchError>(())
//! ```

pub mod config;
pub mod domain;
pub mod optimizer;
pub mod records;
pub mod telemetry;

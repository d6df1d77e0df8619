#![allow(dead_code)]
use battery_dispatch::domain::{BatteryParameters, DispatchSchedule, PriceSeries};

pub const TOLERANCE: f64 = 1e-6;

pub fn series(prices: &[f64]) -> PriceSeries {
    PriceSeries::from_prices(1, prices).expect("valid price series")
}

/// `low` for the first half of the horizon, `high` for the second.
pub fn two_level(hours: usize, low: f64, high: f64) -> PriceSeries {
    let prices: Vec<f64> = (0..hours)
        .map(|i| if i < hours / 2 { low } else { high })
        .collect();
    series(&prices)
}

/// Daily shape: cheap nights, expensive evenings.
pub fn daily_shape(hours: usize) -> PriceSeries {
    let prices: Vec<f64> = (0..hours)
        .map(|i| match i % 24 {
            0..=5 => 20.0,
            6..=15 => 45.0,
            16..=20 => 110.0,
            _ => 60.0,
        })
        .collect();
    series(&prices)
}

/// Deterministic noisy curve: prices uniform in `[-40, 160)` from a 64-bit LCG.
pub fn random_curve(seed: u64, hours: usize) -> PriceSeries {
    let mut state = seed;
    let prices: Vec<f64> = (0..hours)
        .map(|_| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            let unit = (state >> 11) as f64 / (1u64 << 53) as f64;
            -40.0 + 200.0 * unit
        })
        .collect();
    series(&prices)
}

/// Check every physical and operating rule on a solved schedule.
pub fn assert_schedule_invariants(
    prices: &PriceSeries,
    schedule: &DispatchSchedule,
    battery: &BatteryParameters,
) {
    assert_eq!(schedule.len(), prices.len(), "one record per hour");
    for (record, point) in schedule.iter().zip(prices.iter()) {
        assert_eq!(record.hour, point.hour, "records keep input order");
        assert_eq!(record.price, point.price);
    }

    let first = &schedule.records[0];
    assert!(first.state_of_charge.abs() <= TOLERANCE, "battery starts empty");

    for record in schedule.iter() {
        assert!(record.charge >= -TOLERANCE && record.charge <= battery.power_capacity_mw + TOLERANCE);
        assert!(record.discharge >= -TOLERANCE && record.discharge <= battery.power_capacity_mw + TOLERANCE);
        assert!(
            record.state_of_charge >= -TOLERANCE
                && record.state_of_charge <= battery.energy_capacity_mwh + TOLERANCE,
            "state of charge out of bounds at hour {}",
            record.hour
        );
        if battery.limit_discharge_to_stored_energy {
            assert!(
                record.discharge <= battery.discharge_efficiency * record.state_of_charge + TOLERANCE,
                "discharge exceeds stored energy at hour {}",
                record.hour
            );
        }
    }

    for pair in schedule.records.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let expected = prev.state_of_charge + prev.charge * battery.charge_efficiency
            - prev.discharge * battery.discharge_efficiency;
        assert!(
            (next.state_of_charge - expected).abs() <= TOLERANCE,
            "energy balance broken at hour {}: {} != {}",
            next.hour,
            next.state_of_charge,
            expected
        );
    }

    // Every window of 24 hours that closes before the final hour.
    for window in schedule.records.windows(24) {
        let closes_on_last_hour = window[23].hour == prices.last_hour();
        if closes_on_last_hour {
            continue;
        }
        let charged: f64 = window.iter().map(|r| r.charge).sum();
        assert!(
            charged <= battery.daily_volume_cap_mwh + TOLERANCE,
            "window starting at hour {} charges {} MWh",
            window[0].hour,
            charged
        );
    }

    let profit: f64 = schedule.iter().map(|r| r.price * (r.discharge - r.charge)).sum();
    assert!((profit - schedule.profit).abs() <= TOLERANCE * (1.0 + profit.abs()));
}

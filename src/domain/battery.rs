use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError};

/// Fixed battery parameters for a single optimization run.
///
/// Energies are in MWh and powers in MW; with hourly steps a power of
/// 1 MW moves 1 MWh per hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_finite"))]
pub struct BatteryParameters {
    /// Rmax: max rate of charge/discharge (MW)
    #[validate(range(exclusive_min = 0.0))]
    pub power_capacity_mw: f64,
    /// Smax: max state of charge (MWh)
    #[validate(range(exclusive_min = 0.0))]
    pub energy_capacity_mwh: f64,
    /// Dmax: max energy charged in a rolling 24 hour window (MWh)
    #[validate(range(min = 0.0))]
    pub daily_volume_cap_mwh: f64,
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub charge_efficiency: f64,
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub discharge_efficiency: f64,
    /// Forbid discharging more than the stored energy (scaled by discharge efficiency).
    pub limit_discharge_to_stored_energy: bool,
}

/// Round-trip efficiency of the default battery.
pub const DEFAULT_ROUND_TRIP_EFFICIENCY: f64 = 0.9;

impl Default for BatteryParameters {
    /// 1 MW / 2 MWh battery limited to two full cycles per day at 90% round trip.
    fn default() -> Self {
        let leg_efficiency = DEFAULT_ROUND_TRIP_EFFICIENCY.sqrt();
        Self {
            power_capacity_mw: 1.0,
            energy_capacity_mwh: 2.0,
            daily_volume_cap_mwh: 4.0,
            charge_efficiency: leg_efficiency,
            discharge_efficiency: leg_efficiency,
            limit_discharge_to_stored_energy: true,
        }
    }
}

impl BatteryParameters {
    pub fn round_trip_efficiency(&self) -> f64 {
        self.charge_efficiency * self.discharge_efficiency
    }

    /// Number of full charge/discharge cycles the daily volume cap allows.
    pub fn max_daily_cycles(&self) -> f64 {
        self.daily_volume_cap_mwh / self.energy_capacity_mwh
    }
}

// Range checks let NaN through, so finiteness is checked separately.
fn validate_finite(params: &BatteryParameters) -> Result<(), ValidationError> {
    let values = [
        params.power_capacity_mw,
        params.energy_capacity_mwh,
        params.daily_volume_cap_mwh,
        params.charge_efficiency,
        params.discharge_efficiency,
    ];
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        let mut error = ValidationError::new("non_finite");
        error.message = Some(format!("parameters must be finite: {params}").into());
        Err(error)
    }
}

impl fmt::Display for BatteryParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rmax={} MW, Smax={} MWh, Dmax={} MWh, F_charge={:.4}, F_discharge={:.4}",
            self.power_capacity_mw,
            self.energy_capacity_mwh,
            self.daily_volume_cap_mwh,
            self.charge_efficiency,
            self.discharge_efficiency,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_battery() {
        let battery = BatteryParameters::default();
        assert_eq!(battery.power_capacity_mw, 1.0);
        assert_eq!(battery.energy_capacity_mwh, 2.0);
        assert_eq!(battery.daily_volume_cap_mwh, 4.0);
        assert!((battery.charge_efficiency - 0.948_683).abs() < 1e-6);
        assert!((battery.round_trip_efficiency() - 0.9).abs() < 1e-12);
        assert_eq!(battery.max_daily_cycles(), 2.0);
        assert!(battery.validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let zero_power = BatteryParameters {
            power_capacity_mw: 0.0,
            ..Default::default()
        };
        assert!(zero_power.validate().is_err());

        let negative_cap = BatteryParameters {
            daily_volume_cap_mwh: -1.0,
            ..Default::default()
        };
        assert!(negative_cap.validate().is_err());

        let over_unity = BatteryParameters {
            discharge_efficiency: 1.2,
            ..Default::default()
        };
        assert!(over_unity.validate().is_err());

        let nan_capacity = BatteryParameters {
            energy_capacity_mwh: f64::NAN,
            ..Default::default()
        };
        assert!(nan_capacity.validate().is_err());
    }

    #[test]
    fn test_zero_daily_cap_is_allowed() {
        let battery = BatteryParameters {
            daily_volume_cap_mwh: 0.0,
            ..Default::default()
        };
        assert!(battery.validate().is_ok());
    }

    #[test]
    fn test_display() {
        let battery = BatteryParameters::default();
        assert_eq!(
            battery.to_string(),
            "Rmax=1 MW, Smax=2 MWh, Dmax=4 MWh, F_charge=0.9487, F_discharge=0.9487"
        );
    }
}

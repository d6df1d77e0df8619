use serde::{Deserialize, Serialize};

use super::BatteryParameters;

/// Solved dispatch for a single hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DispatchRecord {
    #[serde(rename = "Hour")]
    pub hour: i64,
    #[serde(rename = "Price (GBP/MWh)")]
    pub price: f64,
    /// Energy drawn from the grid during the hour (MWh)
    #[serde(rename = "Charge (MWh)")]
    pub charge: f64,
    /// Energy delivered to the grid during the hour (MWh)
    #[serde(rename = "Discharge (MWh)")]
    pub discharge: f64,
    /// Stored energy at the start of the hour (MWh)
    #[serde(rename = "State of Charge (MWh)")]
    pub state_of_charge: f64,
}

impl DispatchRecord {
    /// Revenue from discharging minus the cost of charging in this hour.
    pub fn profit(&self) -> f64 {
        self.price * (self.discharge - self.charge)
    }
}

/// Optimal dispatch plan, one record per input hour in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchSchedule {
    pub records: Vec<DispatchRecord>,
    /// Objective value: net revenue over the horizon (GBP)
    pub profit: f64,
    pub battery: BatteryParameters,
}

impl DispatchSchedule {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DispatchRecord> + '_ {
        self.records.iter()
    }

    pub fn record_at(&self, hour: i64) -> Option<&DispatchRecord> {
        self.records.iter().find(|r| r.hour == hour)
    }

    pub fn total_charged(&self) -> f64 {
        self.records.iter().map(|r| r.charge).sum()
    }

    pub fn total_discharged(&self) -> f64 {
        self.records.iter().map(|r| r.discharge).sum()
    }

    /// Discharged energy expressed in full battery capacities.
    pub fn equivalent_full_cycles(&self) -> f64 {
        self.total_discharged() / self.battery.energy_capacity_mwh
    }
}

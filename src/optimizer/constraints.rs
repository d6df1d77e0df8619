//! Linear building blocks of the dispatch model.
//!
//! Every constraint is a plain record `expr (= | <=) rhs` tagged with the
//! battery rule it encodes, so a program can be checked against a candidate
//! solution without a solver.

use strum::{AsRefStr, Display};

use crate::domain::BatteryParameters;

/// Length of the rolling volume-cap window in hours.
pub const WINDOW_HOURS: i64 = 24;

/// Decision variable, addressed by hour label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variable {
    /// E_charge[t]: energy drawn from the grid during hour t
    Charge(i64),
    /// E_discharge[t]: energy delivered to the grid during hour t
    Discharge(i64),
    /// S[t]: stored energy at the start of hour t
    StateOfCharge(i64),
}

impl Variable {
    pub fn hour(&self) -> i64 {
        match *self {
            Variable::Charge(h) | Variable::Discharge(h) | Variable::StateOfCharge(h) => h,
        }
    }
}

/// Sum of `coefficient * variable` terms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(Variable, f64)>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, variable: Variable, coefficient: f64) -> Self {
        self.add_term(variable, coefficient);
        self
    }

    pub fn add_term(&mut self, variable: Variable, coefficient: f64) {
        self.terms.push((variable, coefficient));
    }

    pub fn terms(&self) -> &[(Variable, f64)] {
        &self.terms
    }

    pub fn evaluate(&self, value: impl Fn(Variable) -> f64) -> f64 {
        self.terms.iter().map(|&(v, c)| c * value(v)).sum()
    }
}

impl FromIterator<(Variable, f64)> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = (Variable, f64)>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Relation {
    #[strum(serialize = "=")]
    Eq,
    #[strum(serialize = "<=")]
    Le,
}

/// Battery rule a constraint row encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ConstraintKind {
    /// S[first] = 0
    InitialState,
    /// S[t] = S[t-1] + F_charge*E_charge[t-1] - F_discharge*E_discharge[t-1]
    EnergyBalance,
    ChargeCapacity,
    DischargeCapacity,
    /// Charged volume over a 24 hour window stays under Dmax
    DailyVolume,
    /// E_discharge[t] <= F_discharge*S[t]
    StoredEnergy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub kind: ConstraintKind,
    /// Hour the row is generated for (window start for `DailyVolume`).
    pub hour: i64,
    pub expr: LinearExpr,
    pub relation: Relation,
    pub rhs: f64,
}

impl Constraint {
    pub fn initial_state(hour: i64) -> Self {
        Self {
            kind: ConstraintKind::InitialState,
            hour,
            expr: LinearExpr::new().with(Variable::StateOfCharge(hour), 1.0),
            relation: Relation::Eq,
            rhs: 0.0,
        }
    }

    /// Links the state at `hour` to the flows of the previous hour.
    pub fn energy_balance(hour: i64, battery: &BatteryParameters) -> Self {
        let prev = hour - 1;
        Self {
            kind: ConstraintKind::EnergyBalance,
            hour,
            expr: LinearExpr::new()
                .with(Variable::StateOfCharge(hour), 1.0)
                .with(Variable::StateOfCharge(prev), -1.0)
                .with(Variable::Charge(prev), -battery.charge_efficiency)
                .with(Variable::Discharge(prev), battery.discharge_efficiency),
            relation: Relation::Eq,
            rhs: 0.0,
        }
    }

    pub fn charge_capacity(hour: i64, battery: &BatteryParameters) -> Self {
        Self {
            kind: ConstraintKind::ChargeCapacity,
            hour,
            expr: LinearExpr::new().with(Variable::Charge(hour), 1.0),
            relation: Relation::Le,
            rhs: battery.power_capacity_mw,
        }
    }

    pub fn discharge_capacity(hour: i64, battery: &BatteryParameters) -> Self {
        Self {
            kind: ConstraintKind::DischargeCapacity,
            hour,
            expr: LinearExpr::new().with(Variable::Discharge(hour), 1.0),
            relation: Relation::Le,
            rhs: battery.power_capacity_mw,
        }
    }

    /// Volume cap over the window `[start, start + WINDOW_HOURS)`.
    pub fn daily_volume(start: i64, battery: &BatteryParameters) -> Self {
        Self {
            kind: ConstraintKind::DailyVolume,
            hour: start,
            expr: (start..start + WINDOW_HOURS)
                .map(|h| (Variable::Charge(h), 1.0))
                .collect(),
            relation: Relation::Le,
            rhs: battery.daily_volume_cap_mwh,
        }
    }

    pub fn stored_energy(hour: i64, battery: &BatteryParameters) -> Self {
        Self {
            kind: ConstraintKind::StoredEnergy,
            hour,
            expr: LinearExpr::new()
                .with(Variable::Discharge(hour), 1.0)
                .with(Variable::StateOfCharge(hour), -battery.discharge_efficiency),
            relation: Relation::Le,
            rhs: 0.0,
        }
    }

    /// Check the row against an assignment, allowing `tolerance` of slack.
    pub fn is_satisfied(&self, value: impl Fn(Variable) -> f64, tolerance: f64) -> bool {
        let lhs = self.expr.evaluate(value);
        match self.relation {
            Relation::Eq => (lhs - self.rhs).abs() <= tolerance,
            Relation::Le => lhs <= self.rhs + tolerance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_balance_applies_each_efficiency_to_its_own_flow() {
        let battery = BatteryParameters {
            charge_efficiency: 0.9,
            discharge_efficiency: 0.8,
            ..Default::default()
        };
        let row = Constraint::energy_balance(5, &battery);
        assert_eq!(row.relation, Relation::Eq);
        assert_eq!(
            row.expr.terms(),
            &[
                (Variable::StateOfCharge(5), 1.0),
                (Variable::StateOfCharge(4), -1.0),
                (Variable::Charge(4), -0.9),
                (Variable::Discharge(4), 0.8),
            ]
        );

        // S[4] = 1, charge 1 in hour 4 => S[5] = 1.9
        let assignment = |v: Variable| match v {
            Variable::StateOfCharge(4) => 1.0,
            Variable::Charge(4) => 1.0,
            Variable::StateOfCharge(5) => 1.9,
            _ => 0.0,
        };
        assert!(row.is_satisfied(assignment, 1e-9));
    }

    #[test]
    fn test_daily_volume_covers_one_window() {
        let row = Constraint::daily_volume(3, &BatteryParameters::default());
        let hours: Vec<i64> = row.expr.terms().iter().map(|(v, _)| v.hour()).collect();
        assert_eq!(hours, (3..27).collect::<Vec<_>>());
        assert_eq!(row.rhs, 4.0);
    }

    #[test]
    fn test_stored_energy_row() {
        let row = Constraint::stored_energy(1, &BatteryParameters::default());
        let over_discharge = |v: Variable| match v {
            Variable::Discharge(1) => 1.0,
            Variable::StateOfCharge(1) => 0.5,
            _ => 0.0,
        };
        assert!(!row.is_satisfied(over_discharge, 1e-9));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ConstraintKind::DailyVolume.to_string(), "daily_volume");
        assert_eq!(ConstraintKind::InitialState.as_ref(), "initial_state");
        assert_eq!(Relation::Le.to_string(), "<=");
    }
}

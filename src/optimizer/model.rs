//! Model builder: turns a price curve and battery parameters into a complete
//! linear program.
//!
//! The program is built in one pass and never mutated afterwards. Columns are
//! laid out hour by hour as `[charge, discharge, state_of_charge]`.

use tracing::debug;
use validator::Validate;

use super::constraints::{Constraint, ConstraintKind, LinearExpr, Variable, WINDOW_HOURS};
use super::DispatchError;
use crate::domain::{BatteryParameters, PriceSeries};

const VARIABLES_PER_HOUR: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableBounds {
    pub lower: f64,
    pub upper: Option<f64>,
}

impl VariableBounds {
    pub fn contains(&self, value: f64, tolerance: f64) -> bool {
        value >= self.lower - tolerance && self.upper.map_or(true, |u| value <= u + tolerance)
    }
}

/// Immutable LP description of one dispatch problem (maximisation).
#[derive(Debug, Clone)]
pub struct LinearProgram {
    prices: PriceSeries,
    battery: BatteryParameters,
    variables: Vec<(Variable, VariableBounds)>,
    constraints: Vec<Constraint>,
    objective: LinearExpr,
}

impl LinearProgram {
    pub fn build(prices: &PriceSeries, battery: &BatteryParameters) -> Result<Self, DispatchError> {
        battery.validate()?;

        let first = prices.first_hour();
        let last = prices.last_hour();

        let mut variables = Vec::with_capacity(prices.len() * VARIABLES_PER_HOUR);
        for hour in prices.hours() {
            let flow = VariableBounds {
                lower: 0.0,
                upper: None,
            };
            let stored = VariableBounds {
                lower: 0.0,
                upper: Some(battery.energy_capacity_mwh),
            };
            variables.push((Variable::Charge(hour), flow));
            variables.push((Variable::Discharge(hour), flow));
            variables.push((Variable::StateOfCharge(hour), stored));
        }

        let mut constraints = Vec::new();
        constraints.push(Constraint::initial_state(first));
        for hour in prices.hours() {
            if hour > first {
                constraints.push(Constraint::energy_balance(hour, battery));
            }
            constraints.push(Constraint::charge_capacity(hour, battery));
            constraints.push(Constraint::discharge_capacity(hour, battery));
            if battery.limit_discharge_to_stored_energy {
                constraints.push(Constraint::stored_energy(hour, battery));
            }
        }

        // The window that ends on the last hour is exempt, so a window is
        // enforced only when it closes strictly before the horizon does:
        // starts run up to `last - 24`. A `t < last - 24` cutoff would stop
        // one start earlier (23 windows over 48 hours, none over 25).
        let windows = prices.len().saturating_sub(WINDOW_HOURS as usize);
        for start in prices.hours().take(windows) {
            constraints.push(Constraint::daily_volume(start, battery));
        }

        let mut objective = LinearExpr::new();
        for point in prices.iter() {
            objective.add_term(Variable::Discharge(point.hour), point.price);
            objective.add_term(Variable::Charge(point.hour), -point.price);
        }

        let program = Self {
            prices: prices.clone(),
            battery: *battery,
            variables,
            constraints,
            objective,
        };

        debug!(
            first_hour = first,
            last_hour = last,
            variables = program.variables.len(),
            constraints = program.constraints.len(),
            daily_windows = program.count(ConstraintKind::DailyVolume),
            "built dispatch model"
        );

        Ok(program)
    }

    pub fn prices(&self) -> &PriceSeries {
        &self.prices
    }

    pub fn battery(&self) -> &BatteryParameters {
        &self.battery
    }

    pub fn variables(&self) -> &[(Variable, VariableBounds)] {
        &self.variables
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    /// Column index of a variable, `None` if its hour is outside the horizon.
    pub fn column(&self, variable: Variable) -> Option<usize> {
        let offset = variable.hour().checked_sub(self.prices.first_hour())?;
        let row = usize::try_from(offset).ok()?;
        if row >= self.prices.len() {
            return None;
        }
        let slot = match variable {
            Variable::Charge(_) => 0,
            Variable::Discharge(_) => 1,
            Variable::StateOfCharge(_) => 2,
        };
        Some(row * VARIABLES_PER_HOUR + slot)
    }

    pub fn constraints_of(&self, kind: ConstraintKind) -> impl Iterator<Item = &Constraint> + '_ {
        self.constraints.iter().filter(move |c| c.kind == kind)
    }

    pub fn count(&self, kind: ConstraintKind) -> usize {
        self.constraints_of(kind).count()
    }

    /// Check bounds and every constraint row against an assignment.
    pub fn is_feasible(&self, value: impl Fn(Variable) -> f64 + Copy, tolerance: f64) -> bool {
        self.variables
            .iter()
            .all(|(v, bounds)| bounds.contains(value(*v), tolerance))
            && self
                .constraints
                .iter()
                .all(|c| c.is_satisfied(value, tolerance))
    }

    pub fn objective_value(&self, value: impl Fn(Variable) -> f64) -> f64 {
        self.objective.evaluate(value)
    }

    /// Copy of the program with one extra row, for exercising solver failures.
    #[cfg(test)]
    pub(crate) fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }
}

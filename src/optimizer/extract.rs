use super::constraints::Variable;
use super::model::LinearProgram;
use super::solver::{LpSolution, SolverError};
use crate::domain::{DispatchRecord, DispatchSchedule};

/// Values this close to zero are reported as exactly zero.
pub const ZERO_SNAP_TOLERANCE: f64 = 1e-9;

fn snap(value: f64) -> f64 {
    if value.abs() < ZERO_SNAP_TOLERANCE {
        0.0
    } else {
        value
    }
}

/// Map solver columns back to one dispatch record per hour, in input order.
pub fn extract(program: &LinearProgram, solution: &LpSolution) -> Result<DispatchSchedule, SolverError> {
    if solution.values.len() != program.variables().len() {
        return Err(SolverError::Unavailable(format!(
            "solver returned {} values for {} variables",
            solution.values.len(),
            program.variables().len()
        )));
    }

    let value = |variable: Variable| {
        program
            .column(variable)
            .map_or(0.0, |column| snap(solution.values[column]))
    };

    let records: Vec<DispatchRecord> = program
        .prices()
        .iter()
        .map(|point| DispatchRecord {
            hour: point.hour,
            price: point.price,
            charge: value(Variable::Charge(point.hour)),
            discharge: value(Variable::Discharge(point.hour)),
            state_of_charge: value(Variable::StateOfCharge(point.hour)),
        })
        .collect();

    let profit = records.iter().map(DispatchRecord::profit).sum();

    Ok(DispatchSchedule {
        records,
        profit,
        battery: *program.battery(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BatteryParameters, PriceSeries};

    #[test]
    fn test_extract_preserves_hour_order_and_snaps_noise() {
        let prices = PriceSeries::from_prices(3, &[10.0, 20.0]).unwrap();
        let program = LinearProgram::build(&prices, &BatteryParameters::default()).unwrap();
        let solution = LpSolution {
            // [charge, discharge, soc] per hour
            values: vec![1.0, -1e-12, 0.0, 0.0, 0.5, 0.948_683],
            objective: 0.0,
        };

        let schedule = extract(&program, &solution).unwrap();
        let hours: Vec<i64> = schedule.iter().map(|r| r.hour).collect();
        assert_eq!(hours, vec![3, 4]);
        assert_eq!(schedule.records[0].discharge, 0.0);
        assert_eq!(schedule.records[0].charge, 1.0);
        assert_eq!(schedule.records[1].price, 20.0);
        assert_eq!(schedule.records[1].state_of_charge, 0.948_683);
        assert!((schedule.profit - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_extract_rejects_short_solution() {
        let prices = PriceSeries::from_prices(1, &[10.0]).unwrap();
        let program = LinearProgram::build(&prices, &BatteryParameters::default()).unwrap();
        let solution = LpSolution {
            values: vec![0.0],
            objective: 0.0,
        };
        assert!(extract(&program, &solution).is_err());
    }
}

//! Battery dispatch optimization.
//!
//! - `model`: builds the linear program from prices and battery parameters
//! - `solver`: the LP solver seam and its good_lp implementation
//! - `extract`: maps solver values back to per-hour dispatch records
//! - `dispatch`: the optimizer facade with a solver time limit

pub mod constraints;
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod model;
pub mod solver;

pub use constraints::*;
pub use dispatch::*;
pub use error::*;
pub use extract::*;
pub use model::*;
pub use solver::*;

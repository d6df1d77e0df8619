pub mod battery;
pub mod price;
pub mod schedule;

pub use battery::*;
pub use price::*;
pub use schedule::*;

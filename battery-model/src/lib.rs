pub mod battery;
pub mod market;
pub mod schedule;

pub use battery::BatteryParams;
pub use market::PriceThresholds;
pub use schedule::PeriodDispatch;

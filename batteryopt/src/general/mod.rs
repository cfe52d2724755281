pub mod market_data;
pub mod report;

pub use market_data::{DEFAULT_MARKET, load_inputs};
pub use report::{print_dispatch_summary, write_dispatch_csv};

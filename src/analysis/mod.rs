//! Time-Series Analysis
//!
//! The quantitative core of the dashboard:
//!
//! - **window**: inclusive trailing-window sums over a daily series
//! - **rt**: reproduction number as the ratio of consecutive window sums
//!
//! Both are pure functions of their input and window length. Positions
//! without a full window are undefined (`None`), never partial values.

pub mod error;
pub mod rt;
pub mod window;

pub use error::{AnalysisError, AnalysisResult};
pub use rt::{estimate_rt, estimate_rt_table, latest_rt, rt_ratio, RtTable, DEFAULT_WINDOW_DAYS};
pub use window::{date_ranges, rolling_sum, rolling_sum_values, window_sum, DateRange};

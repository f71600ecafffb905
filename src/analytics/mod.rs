//! Analytics module - windows and statistics over the sample history
//!
//! Pure functions only: callers pass a snapshot slice, nothing here holds
//! state between calls.

mod range;
mod statistics;

pub use range::{filter, filter_at, ParseTimeRangeError, TimeRange};
pub use statistics::{source_distribution, PriceChange, PriceStatistics, SourceShare};

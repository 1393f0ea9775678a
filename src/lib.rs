//! Percentage shares of welfare-scheme recipients by nationality.
//!
//! One forward-only pipeline: load recipient counts from CSV, sum them per
//! (period, scheme, nationality), derive each nationality's share of the
//! scheme total from the "All" marker rows, pivot to a wide table sorted by
//! scheme then period, and persist it. The chart module re-reads the
//! persisted file and draws one stacked bar chart per scheme with a fixed
//! reference line for the non-Irish population share.

pub mod chart;
pub mod error;
pub mod pipeline;
pub mod schema;

pub use error::ShareError;

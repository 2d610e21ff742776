//! Query-level idle time from query history
//!
//! Two definitions of idle time are computed side by side and never merged:
//! - gap-based: sum of gaps between consecutive queries plus the slack
//!   before the first and after the last query
//! - span-based: window length minus the span from the first query's start
//!   to the last query's end, ignoring gaps in between

mod analyzer;

pub use analyzer::{
    IdleEstimate, IdleMethod, QueryCounts, QueryGap, QueryGapAnalyzer, QueryGapReport, Sufficiency,
};

//! Rolling peak-window analysis for time-stamped event tables.
//!
//! Given a table, a minute-of-day time column, optional grouping columns and
//! an optional entity-count column, the engine enumerates every fixed-width
//! window sliding in one-minute steps over each group's time range and picks
//! the busiest one per group.
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

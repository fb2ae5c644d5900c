//! Valuation Engine
//!
//! Pure, synchronous functions from holdings records and a price context to
//! per-company metrics and aggregates. Nothing here performs I/O or keeps
//! state between calls, so each invocation can run on whatever snapshot the
//! caller holds.

mod aggregate;
mod combine;
mod valuate;

pub use aggregate::{aggregate, Aggregate, HistogramBucket};
pub use combine::combined_view;
pub use valuate::{valuate, what_if};

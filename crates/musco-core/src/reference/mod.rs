//! Reference data
//!
//! Time-indexed tables of named 3-vector columns, their flattening into
//! scalar component series, and the interpolants built from those series.

mod spline;
mod table;

pub use spline::*;
pub use table::*;

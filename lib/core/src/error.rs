//! Result alias shared by the study-sync crates.
//!
//! Crates define their own error enums and return them wrapped in a
//! rootcause [`Report`], so callers can attach context as a failure moves
//! from storage to the HTTP edge.

use rootcause::Report;

/// A `Result` whose error is a rootcause report over context `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

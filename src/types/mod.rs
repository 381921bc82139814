//! Type definitions module.
//!
//! Contains shared types used across the library.

pub mod analysis;
pub mod transaction;
pub mod units;

pub use analysis::*;
pub use transaction::*;
pub use units::*;

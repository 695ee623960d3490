//! pmd-engine
//!
//! The allocation core of the pre-order matching desk:
//! - eligibility filter (which reservations / units participate),
//! - priority ranking (carrier-switch first, then registration order),
//! - the matching engine (preview + execute),
//! - reversal (single, per-unit, and group-wide reset) and deletes,
//! - manual override (operator hand-picks a unit),
//! - intake and dashboard views for both sides.
//!
//! Every operation takes an `&EntityStore` and acquires the narrowest guard
//! it needs; mutations hold the single write guard end to end, which is the
//! atomicity story for the two-record writes of a pairing.

mod error;

pub mod eligibility;
pub mod inventory;
pub mod manual;
pub mod matching;
pub mod ranking;
pub mod reports;
pub mod reservations;
pub mod reversal;

pub use error::EngineError;
pub use inventory::{BulkUnit, ListedUnit, StockRow};
pub use matching::{MatchPreview, MatchReport, PlannedMatch, ShortfallEntry};
pub use reports::{RecruiterRow, StoreRow, Tally};
pub use reservations::DemandRow;
pub use reversal::ResetReport;

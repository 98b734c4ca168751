pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::AlertDirection;
pub use error::CoreError;
pub use structs::{
    Alert, AlertTargets, ContributionPlan, FetchFailure, Ledger, LedgerEntry, PricePoint,
    PriceSeries,
};

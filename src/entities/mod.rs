//! Record type definitions
//!
//! The engine works on three record kinds delivered by the test-data parser:
//!
//! - [`DieResult`] - one row per die (bins, site, coordinates, pass/fail)
//! - [`Measurement`] - one row per (test item, die) with the numeric result
//! - [`TestItemMeta`] - one row per test item with its limits and flag bits
//!
//! plus the computed [`CapabilityResult`] and the per-file [`LotHeader`].

pub mod capability;
pub mod die;
pub mod flags;
pub mod header;
pub mod measurement;
pub mod test_item;

pub use capability::CapabilityResult;
pub use die::DieResult;
pub use header::{LotData, LotHeader};
pub use measurement::Measurement;
pub use test_item::{DataType, LimitRule, LimitSide, LimitType, TestItemMeta};

/// Identifier of a single die, unique across every loaded file
pub type DieId = u32;

/// Identifier of a test item, unique after metadata merge
pub type TestId = u32;

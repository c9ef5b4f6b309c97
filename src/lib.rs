//! DCT: Die Capability Toolkit
//!
//! Process-capability statistics and what-if limit revision over per-die
//! semiconductor test results. Lots are loaded into [`core::RecordTables`],
//! analyzed by [`core::CapabilityCalculator`] and revised through
//! [`core::LimitRevisionEngine`]; [`core::AnalysisSession`] ties them together
//! for front-ends.

pub mod cli;
pub mod core;
pub mod entities;
pub mod io;

//! Core module - record tables, capability engine and analysis session

pub mod calculator;
pub mod config;
pub mod error;
pub mod grouping;
pub mod logging;
pub mod report;
pub mod revision;
pub mod session;
pub mod summary;
pub mod tables;

pub use calculator::{format_rate, round_to, CapabilityCalculator, TopFail};
pub use config::{AnalysisConfig, ConfigError, TestOrder};
pub use error::{IntegrityError, RevisionError, UserStateError};
pub use grouping::{ChartFrame, ChartRow, GroupColumn, Grouping};
pub use report::{ParetoEntry, ReportSummary};
pub use revision::{
    CandidateLimits, LimitMap, LimitRevisionEngine, Recomputation, RevisionState, WindowMode,
};
pub use session::{AnalysisSession, SessionEvent, SessionObserver};
pub use summary::{BinKind, LotSummary};
pub use tables::{LimitDifference, RecordTables};

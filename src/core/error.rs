//! Engine error taxonomy
//!
//! Two classes with different handling:
//! - [`UserStateError`]: an operation was requested before its preconditions
//!   hold. Recoverable; the session reports it as a status message and the
//!   operation is a no-op.
//! - [`IntegrityError`]: the data contradicts an invariant the engine relies
//!   on. Fatal for the computation; always propagated to the caller, which
//!   must reset before continuing.
//!
//! Numeric edge cases (zero std-dev, no enabled side, `lo == hi`) are not
//! errors; they have defined fallback values.

use thiserror::Error;

use crate::core::revision::RevisionState;
use crate::entities::{DieId, TestId};

/// Operation requested in the wrong state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserStateError {
    #[error("No dataset loaded. Load data into the analysis space first")]
    NoDataset,

    #[error("Operation requires state {expected} (current: {current})")]
    WrongState {
        expected: &'static str,
        current: RevisionState,
    },

    #[error("No original snapshot saved; apply a limit revision first")]
    NoSnapshot,

    #[error("Top fail has not been computed yet")]
    TopFailMissing,

    #[error("No candidate limits given and none are active")]
    NoCandidateLimits,

    #[error("Nothing to remove: no die falls in the selected window")]
    NothingToRemove,
}

/// Data contradicts an engine invariant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("Top-fail population grew while processing test {test_id}: {before} -> {after}")]
    PopulationGrew {
        test_id: TestId,
        before: usize,
        after: usize,
    },

    #[error("Test {test_id} has no metadata row")]
    UnknownTest { test_id: TestId },

    #[error("Measurement for test {test_id} references missing die {die_id}")]
    OrphanMeasurement { test_id: TestId, die_id: DieId },

    #[error("Die {die_id} appears more than once")]
    DuplicateDie { die_id: DieId },

    #[error("Test {test_id} is missing from the top-fail table")]
    MissingTopFail { test_id: TestId },
}

/// Result class of a revision operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RevisionError {
    #[error(transparent)]
    UserState(#[from] UserStateError),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

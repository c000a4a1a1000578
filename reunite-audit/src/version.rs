//! Optimistic-concurrency primitives
//!
//! Every mutable engine entity (assignment, case, break-glass request,
//! approval request) carries a monotonically incrementing audit
//! version. Writers supply the version they read; a mismatch is a
//! conflict, never a silent overwrite.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a writer's expected version does not match the stored
/// version (compare-and-swap failure).
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[error("Version conflict: expected {expected}, found {found}")]
pub struct ConflictError {
    /// Version the writer read
    pub expected: u64,
    /// Version currently stored
    pub found: u64,
}

/// Entities that carry an audit version.
pub trait Versioned {
    /// Current audit version of this snapshot.
    fn audit_version(&self) -> u64;
}

/// Check a writer-supplied version against an entity snapshot.
///
/// # Errors
///
/// Returns [`ConflictError`] when the versions differ.
///
/// # Examples
///
/// ```
/// use reunite_audit::{ensure_version, Versioned};
///
/// struct Record { version: u64 }
/// impl Versioned for Record {
///     fn audit_version(&self) -> u64 { self.version }
/// }
///
/// let record = Record { version: 3 };
/// assert!(ensure_version(&record, 3).is_ok());
/// assert!(ensure_version(&record, 2).is_err());
/// ```
pub fn ensure_version<T: Versioned>(entity: &T, expected: u64) -> Result<(), ConflictError> {
    let found = entity.audit_version();
    if found == expected {
        Ok(())
    } else {
        Err(ConflictError { expected, found })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Record {
        version: u64,
    }

    impl Versioned for Record {
        fn audit_version(&self) -> u64 {
            self.version
        }
    }

    #[test]
    fn test_matching_version_passes() {
        let record = Record { version: 7 };
        assert!(ensure_version(&record, 7).is_ok());
    }

    #[test]
    fn test_stale_version_conflicts() {
        let record = Record { version: 7 };
        let err = ensure_version(&record, 6).unwrap_err();
        assert_eq!(err.expected, 6);
        assert_eq!(err.found, 7);
    }
}

//! Physics Error Types
//!
//! Unified error type for the engine. The simulation step itself is
//! exception-free (degenerate numerics fall back to canonical defaults);
//! `Result` only appears on the construction and configuration seams.

use core::fmt;

/// Unified error type for physics operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PhysicsError {
    /// A body with this identifier already exists in the world.
    DuplicateBodyId {
        /// The identifier that was rejected
        id: String,
    },
    /// A body description contained an unusable parameter.
    InvalidBodyParameter {
        /// Human-readable description of the problem
        reason: &'static str,
    },
    /// Invalid simulation settings.
    InvalidConfiguration {
        /// Description of the invalid configuration
        reason: &'static str,
    },
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateBodyId { id } => write!(f, "duplicate body id {id:?}"),
            Self::InvalidBodyParameter { reason } => {
                write!(f, "invalid body parameter: {reason}")
            }
            Self::InvalidConfiguration { reason } => {
                write!(f, "invalid configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for PhysicsError {}

// ============================================================================
// Tests
// ============================================================================

//! Error types for the resolution core.
//!
//! Nothing in this crate is fatal: every error is either recovered locally
//! (the offending action or cascade step is skipped) or logged while the data
//! passes through untouched. [`ErrorSeverity`] records which of these a given
//! error calls for so call sites can log at the right level.
//!
//! # Categories
//!
//! - **Recoverable**: a referenced entity or building is gone. Skip the step.
//! - **Validation**: an argument cannot be interpreted (unknown attack kind,
//!   unknown removal code, ineligible attacker). Skip the unit or action.
//! - **Consistency**: a report record is malformed for filtering. Log it and
//!   deliver the record unfiltered.

use thiserror::Error;

use hexfield::BuildingId;

use crate::entity::EntityId;

/// Severity of an error, used to choose the log level and recovery path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorSeverity {
    /// A referenced object no longer exists; skip the dependent step.
    Recoverable,
    /// Input could not be interpreted; skip the offending action or unit.
    Validation,
    /// Data is internally inconsistent; pass it through and log.
    Consistency,
}

impl ErrorSeverity {
    /// Human-readable name of this severity level.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Consistency => "consistency",
        }
    }

    /// Returns true if the condition is expected during normal play.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }
}

/// Errors raised while queueing and resolving a round.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Entity is not in the arena (already removed this round, or never existed).
    #[error("entity {0} not found")]
    MissingEntity(EntityId),

    /// Building is not on the board.
    #[error("building {0} not found")]
    MissingBuilding(BuildingId),

    /// A declared action names an attack kind this engine does not know.
    #[error("unknown attack kind: {0}")]
    UnknownAttackKind(String),

    /// A removal request carried a condition code outside the known set.
    #[error("invalid removal condition code {0}")]
    InvalidRemovalCondition(u8),

    /// The attacker's unit type cannot perform this attack.
    #[error("entity {attacker} cannot perform a {kind} attack")]
    IneligibleAttacker {
        /// Declaring entity
        attacker: EntityId,
        /// Attack kind label
        kind: &'static str,
    },

    /// A declared action could not be decoded.
    #[error("failed to decode action: {0}")]
    Decode(#[source] serde_json::Error),
}

impl EngineError {
    /// Severity classification for this error.
    #[must_use]
    pub const fn severity(&self) -> ErrorSeverity {
        match self {
            Self::MissingEntity(_) | Self::MissingBuilding(_) => ErrorSeverity::Recoverable,
            Self::UnknownAttackKind(_)
            | Self::InvalidRemovalCondition(_)
            | Self::IneligibleAttacker { .. }
            | Self::Decode(_) => ErrorSeverity::Validation,
        }
    }
}

/// Data-consistency errors found while filtering reports for an observer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// A non-public report has no subject entity to test visibility against.
    #[error("report {id} is not public but has no subject")]
    MissingSubject {
        /// Template id of the offending report
        id: u16,
    },

    /// A player-addressed report was filtered without an observing player.
    #[error("report {id} is addressed to a player but no player context was supplied")]
    MissingPlayerContext {
        /// Template id of the offending report
        id: u16,
    },
}

impl ReportError {
    /// Severity classification for this error.
    #[must_use]
    pub const fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Consistency
    }
}

/// Errors loading or validating rule options.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The options document is not valid JSON for [`crate::config::RuleOptions`].
    #[error("failed to parse rule options: {0}")]
    Parse(#[from] serde_json::Error),

    /// The options parsed but hold an unusable value.
    #[error("invalid rule options: {0}")]
    Invalid(String),
}

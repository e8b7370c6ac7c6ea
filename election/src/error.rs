use runoff_store::StoreError;
use runoff_types::{CandidateId, ElectionId, Identity, Timestamp};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ElectionError {
    #[error("{0} is not the administrator")]
    Unauthorized(Identity),

    #[error("election {0} not found")]
    NotFound(ElectionId),

    #[error("candidate {0} not found")]
    CandidateNotFound(CandidateId),

    #[error("{0} is not registered to vote")]
    NotRegistered(Identity),

    #[error("election {election} has not started (opens at {starts_at})")]
    NotStarted {
        election: ElectionId,
        starts_at: Timestamp,
    },

    #[error("election {election} has ended (closed at {ended_at})")]
    Ended {
        election: ElectionId,
        ended_at: Timestamp,
    },

    #[error("election {0} is finalized")]
    ElectionFinalized(ElectionId),

    #[error("{0} is already registered")]
    AlreadyRegistered(Identity),

    #[error("{voter} has already voted in election {election}")]
    AlreadyVoted {
        voter: Identity,
        election: ElectionId,
    },

    #[error("election {0} is already finalized")]
    AlreadyFinalized(ElectionId),

    #[error("election {parent} is already linked to runoff {existing}")]
    AlreadyLinked {
        parent: ElectionId,
        existing: ElectionId,
    },

    #[error("election {election} is still active until {ends_at}")]
    StillActive {
        election: ElectionId,
        ends_at: Timestamp,
    },

    #[error("election {0} is not finalized")]
    NotFinalized(ElectionId),

    #[error("ledger administrator is {stored}, not {requested}")]
    AdminMismatch { stored: Identity, requested: Identity },

    #[error("election duration must be at least one second")]
    InvalidDuration,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Coarse failure classes seen by callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Unauthorized,
    NotFound,
    NotActive,
    AlreadyDone,
    StillActive,
    NotFinalized,
    InvalidInput,
    Storage,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::NotActive => "not_active",
            Self::AlreadyDone => "already_done",
            Self::StillActive => "still_active",
            Self::NotFinalized => "not_finalized",
            Self::InvalidInput => "invalid_input",
            Self::Storage => "storage",
        }
    }
}

impl ElectionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized(_) | Self::NotRegistered(_) | Self::AdminMismatch { .. } => {
                ErrorCategory::Unauthorized
            }
            Self::NotFound(_) | Self::CandidateNotFound(_) => ErrorCategory::NotFound,
            Self::NotStarted { .. } | Self::Ended { .. } | Self::ElectionFinalized(_) => {
                ErrorCategory::NotActive
            }
            Self::AlreadyRegistered(_)
            | Self::AlreadyVoted { .. }
            | Self::AlreadyFinalized(_)
            | Self::AlreadyLinked { .. } => ErrorCategory::AlreadyDone,
            Self::StillActive { .. } => ErrorCategory::StillActive,
            Self::NotFinalized(_) => ErrorCategory::NotFinalized,
            Self::InvalidDuration => ErrorCategory::InvalidInput,
            Self::Store(_) => ErrorCategory::Storage,
        }
    }
}

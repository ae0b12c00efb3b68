//! Bracket error types.

use super::models::UserId;
use thiserror::Error;

/// Bracket errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BracketError {
    /// Bad arguments to generation or restore
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No such round or match
    #[error("Match not found: round {round}, match {match_number}")]
    NotFound { round: u32, match_number: u32 },

    /// Winner is neither player of the match
    #[error("Invalid winner {winner_id} for round {round}, match {match_number}")]
    InvalidWinner {
        winner_id: UserId,
        round: u32,
        match_number: u32,
    },

    /// A player slot is still empty
    #[error("Match not ready: round {round}, match {match_number} is missing a player")]
    MatchNotReady { round: u32, match_number: u32 },

    /// The result already fed a completed match downstream
    #[error("Result locked: round {round}, match {match_number} can no longer change")]
    ResultLocked { round: u32, match_number: u32 },

    /// A stored match references someone outside the participant list
    #[error("Unknown participant: {0}")]
    UnknownParticipant(UserId),
}

impl BracketError {
    /// Whether the error comes from a choice a user made (e.g. picking a
    /// winner) rather than from inconsistent bracket data
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            BracketError::InvalidWinner { .. }
                | BracketError::MatchNotReady { .. }
                | BracketError::ResultLocked { .. }
        )
    }
}

/// Result type for bracket operations
pub type BracketResult<T> = Result<T, BracketError>;

//! Bracket engine for single-elimination tournaments.
//!
//! This module provides pure, synchronous functions over an in-memory
//! bracket value:
//! - Bracket generation from a (partly) seeded participant list, with byes
//!   resolved up front
//! - Recording match results and advancing winners round by round
//! - Queries for playable matches, completion and progress statistics
//! - Rebuilding a bracket from stored match rows
//!
//! Nothing here performs I/O or keeps global state. Functions that change a
//! bracket take it by reference and return an updated copy.
//!
//! ## Example
//!
//! ```
//! use bolobey::bracket::{
//!     BracketParticipant, generate_single_elimination_bracket, is_tournament_complete,
//!     update_match_result,
//! };
//! use uuid::Uuid;
//!
//! let alice = BracketParticipant::seeded(Uuid::new_v4(), 1);
//! let bob = BracketParticipant::seeded(Uuid::new_v4(), 2);
//!
//! let generated =
//!     generate_single_elimination_bracket(&[alice.clone(), bob], Uuid::new_v4()).unwrap();
//! let bracket = update_match_result(&generated.bracket, 1, 1, alice.user_id, 2, 1).unwrap();
//!
//! assert!(is_tournament_complete(&bracket));
//! assert_eq!(bracket.champion, Some(alice));
//! ```

pub mod errors;
pub mod generator;
pub mod models;
pub mod progression;
pub mod restore;

pub use errors::{BracketError, BracketResult};
pub use generator::{
    MIN_PARTICIPANTS, generate_single_elimination_bracket,
    generate_single_elimination_bracket_with_rng, round_name,
};
pub use models::{
    BracketMatch, BracketParticipant, BracketRound, CreateMatchRecord, GeneratedBracket,
    MatchRecord, MatchStatus, PlayerSide, TournamentBracket, TournamentId, TournamentStats,
    UserId,
};
pub use progression::{
    get_available_matches, get_tournament_stats, is_tournament_complete, next_side, next_slot,
    start_match, update_match_result,
};
pub use restore::restore_bracket;

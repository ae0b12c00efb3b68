//! # Bolobey
//!
//! Bracket engine and match persistence for Beyblade-style tournaments.
//!
//! The core is a pure single-elimination bracket engine: it seeds
//! participants, pads the field with byes, advances winners round by round
//! and reports progress. Around it sit a tournament manager, which is the
//! one place brackets are created and results recorded, and a PostgreSQL
//! repository for the resulting match rows.
//!
//! ## Core Modules
//!
//! - [`bracket`]: Bracket data model, generation, progression and queries
//! - [`tournament`]: Tournament manager routing every change through the engine
//! - [`db`]: Connection pool, configuration and match repositories
//!
//! ## Example
//!
//! ```
//! use bolobey::bracket::{BracketParticipant, generate_single_elimination_bracket};
//! use uuid::Uuid;
//!
//! let players: Vec<_> = (1..=5)
//!     .map(|seed| BracketParticipant::seeded(Uuid::new_v4(), seed))
//!     .collect();
//!
//! let generated = generate_single_elimination_bracket(&players, Uuid::new_v4()).unwrap();
//! assert_eq!(generated.bracket.round_count(), 3);
//! ```

/// Single-elimination bracket engine.
pub mod bracket;
pub use bracket::{
    BracketError, BracketMatch, BracketParticipant, BracketResult, BracketRound, MatchStatus,
    TournamentBracket, TournamentStats,
};

/// Database access and match repositories.
pub mod db;

/// Tournament orchestration on top of the bracket engine.
pub mod tournament;
pub use tournament::{TournamentError, TournamentManager, TournamentResult};

//! Tournament module tying the bracket engine to match storage.
//!
//! This module provides:
//! - Bracket creation for a tournament (the only place brackets are made)
//! - Result reporting against the stored bracket, so every admin works on
//!   the same state
//! - Loading a stored bracket back into memory
//!
//! ## Example
//!
//! ```
//! use bolobey::bracket::BracketParticipant;
//! use bolobey::db::InMemoryMatchRepository;
//! use bolobey::tournament::TournamentManager;
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = TournamentManager::new(Arc::new(InMemoryMatchRepository::new()));
//!
//!     let tournament_id = Uuid::new_v4();
//!     let players: Vec<_> = (1..=4)
//!         .map(|seed| BracketParticipant::seeded(Uuid::new_v4(), seed))
//!         .collect();
//!
//!     manager.create_bracket(tournament_id, &players).await?;
//!     let bracket = manager
//!         .record_result(tournament_id, 1, 1, players[0].user_id, 3, 1)
//!         .await?;
//!     println!("{} rounds", bracket.round_count());
//!
//!     Ok(())
//! }
//! ```

pub mod manager;

pub use manager::{TournamentError, TournamentManager, TournamentResult};

//! Tournament manager: the single entry point for creating and advancing brackets.

use crate::bracket::{
    self, BracketError, BracketParticipant, MatchRecord, TournamentBracket, TournamentId, UserId,
};
use crate::db::MatchRepository;
use std::sync::Arc;
use thiserror::Error;

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Tournament not found: {0}")]
    NotFound(TournamentId),

    #[error("Bracket already generated for tournament {0}")]
    BracketExists(TournamentId),

    #[error(transparent)]
    Bracket(#[from] BracketError),

    #[error("Invalid stored match: {0}")]
    InvalidRow(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl TournamentError {
    /// Get a client-safe error message
    ///
    /// Database details are not exposed.
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::Database(_) | TournamentError::InvalidRow(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

pub type TournamentResult<T> = Result<T, TournamentError>;

/// Tournament manager
///
/// Every bracket is generated here and every result goes through here, so
/// stored matches always follow the bracket engine's rules.
#[derive(Clone)]
pub struct TournamentManager {
    repository: Arc<dyn MatchRepository>,
}

impl TournamentManager {
    /// Create a new tournament manager
    pub fn new(repository: Arc<dyn MatchRepository>) -> Self {
        Self { repository }
    }

    /// Generate the bracket for a tournament and store its matches
    ///
    /// # Errors
    ///
    /// Fails with [`TournamentError::BracketExists`] if matches are already
    /// stored for the tournament, or with a bracket error for bad input.
    pub async fn create_bracket(
        &self,
        tournament_id: TournamentId,
        participants: &[BracketParticipant],
    ) -> TournamentResult<TournamentBracket> {
        let generated = bracket::generate_single_elimination_bracket(participants, tournament_id)?;
        let records: Vec<MatchRecord> = generated.matches.iter().map(MatchRecord::from).collect();
        self.repository
            .insert_bracket(tournament_id, participants, &records)
            .await?;

        log::info!(
            "Created bracket for tournament {} with {} participants ({} rounds)",
            tournament_id,
            participants.len(),
            generated.bracket.round_count()
        );

        if let Some(champion) = &generated.bracket.champion {
            self.repository
                .set_champion(tournament_id, champion.user_id)
                .await?;
        }

        Ok(generated.bracket)
    }

    /// Store a bracket built elsewhere (for example one read back from JSON)
    ///
    /// The stored rows must rebuild the same bracket, otherwise nothing is
    /// stored.
    pub async fn import_bracket(
        &self,
        tournament_id: TournamentId,
        bracket: &TournamentBracket,
    ) -> TournamentResult<()> {
        let participants = bracket.participants();
        let records = bracket.match_records(tournament_id);

        if bracket::restore_bracket(&participants, &records)? != *bracket {
            return Err(TournamentError::Bracket(BracketError::InvalidInput(
                "bracket is not consistent with its first round".to_string(),
            )));
        }

        self.repository
            .insert_bracket(tournament_id, &participants, &records)
            .await
    }

    /// Record a match result against the stored bracket and return the new bracket
    ///
    /// The reported match row is replaced and the winner is written into its
    /// slot of the next match. Only that one slot is touched, so results of
    /// sibling matches reported at the same time both survive. Deciding the
    /// final also stores the champion.
    pub async fn record_result(
        &self,
        tournament_id: TournamentId,
        round: u32,
        match_number: u32,
        winner_id: UserId,
        player1_score: u32,
        player2_score: u32,
    ) -> TournamentResult<TournamentBracket> {
        let current = self.load_bracket(tournament_id).await?;
        let updated = bracket::update_match_result(
            &current,
            round,
            match_number,
            winner_id,
            player1_score,
            player2_score,
        )?;

        if let Some(record) = updated.match_record(tournament_id, round, match_number) {
            self.repository.save_match(&record).await?;
        }

        let is_final = updated.final_round().is_some_and(|r| r.round == round);
        if !is_final {
            let (next_round, next_match) = bracket::next_slot(round, match_number);
            self.repository
                .set_player(
                    tournament_id,
                    next_round,
                    next_match,
                    bracket::next_side(match_number),
                    winner_id,
                )
                .await?;
            log::debug!(
                "Advanced {} to match {}/{} of tournament {}",
                winner_id,
                next_round,
                next_match,
                tournament_id
            );
        }

        log::info!(
            "Tournament {}: round {} match {} won by {} ({}-{})",
            tournament_id,
            round,
            match_number,
            winner_id,
            player1_score,
            player2_score
        );

        if bracket::is_tournament_complete(&updated) {
            if let Some(champion) = &updated.champion {
                self.repository
                    .set_champion(tournament_id, champion.user_id)
                    .await?;
                log::info!("Tournament {} champion: {}", tournament_id, champion.user_id);
            }
        }

        Ok(updated)
    }

    /// Mark a stored match as in progress
    pub async fn start_match(
        &self,
        tournament_id: TournamentId,
        round: u32,
        match_number: u32,
    ) -> TournamentResult<TournamentBracket> {
        let current = self.load_bracket(tournament_id).await?;
        let updated = bracket::start_match(&current, round, match_number)?;

        if let Some(record) = updated.match_record(tournament_id, round, match_number) {
            self.repository.save_match(&record).await?;
        }

        Ok(updated)
    }

    /// Load a tournament's bracket from storage
    ///
    /// # Errors
    ///
    /// Fails with [`TournamentError::NotFound`] if no matches are stored.
    pub async fn load_bracket(&self, tournament_id: TournamentId) -> TournamentResult<TournamentBracket> {
        let records = self.repository.list_matches(tournament_id).await?;
        if records.is_empty() {
            return Err(TournamentError::NotFound(tournament_id));
        }

        let participants = self.repository.list_participants(tournament_id).await?;
        Ok(bracket::restore_bracket(&participants, &records)?)
    }
}

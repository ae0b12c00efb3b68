//! Bracket data models for single-elimination tournaments.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// User ID type
pub type UserId = Uuid;

/// Tournament ID type
pub type TournamentId = Uuid;

/// A tournament entrant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketParticipant {
    /// User ID
    pub user_id: UserId,
    /// Seed (lower is higher priority)
    #[serde(default)]
    pub seed: Option<u32>,
}

impl BracketParticipant {
    /// Create an unseeded participant
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            seed: None,
        }
    }

    /// Create a seeded participant
    pub fn seeded(user_id: UserId, seed: u32) -> Self {
        Self {
            user_id,
            seed: Some(seed),
        }
    }
}

/// Match status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Waiting to be played (or waiting for a player)
    Pending,
    /// Currently being played
    InProgress,
    /// Finished with a winner
    Completed,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Pending => write!(f, "pending"),
            MatchStatus::InProgress => write!(f, "in_progress"),
            MatchStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MatchStatus::Pending),
            "in_progress" => Ok(MatchStatus::InProgress),
            "completed" => Ok(MatchStatus::Completed),
            other => Err(format!("unknown match status: {other}")),
        }
    }
}

/// Player slot of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerSide {
    Player1,
    Player2,
}

/// One game within one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketMatch {
    /// Round number (1-indexed, final is the last)
    pub round: u32,
    /// Match number within the round (1-indexed)
    pub match_number: u32,
    pub player1: Option<BracketParticipant>,
    pub player2: Option<BracketParticipant>,
    pub winner: Option<BracketParticipant>,
    pub player1_score: u32,
    pub player2_score: u32,
    pub status: MatchStatus,
    /// Created with a single participant and resolved on the spot
    pub is_bye: bool,
}

impl BracketMatch {
    /// Create an empty pending match
    pub fn new(round: u32, match_number: u32) -> Self {
        Self {
            round,
            match_number,
            player1: None,
            player2: None,
            winner: None,
            player1_score: 0,
            player2_score: 0,
            status: MatchStatus::Pending,
            is_bye: false,
        }
    }

    /// Both player slots are filled
    pub fn has_both_players(&self) -> bool {
        self.player1.is_some() && self.player2.is_some()
    }

    /// Ready to be played right now
    pub fn is_playable(&self) -> bool {
        self.status == MatchStatus::Pending && self.has_both_players() && !self.is_bye
    }

    /// Whether `user_id` occupies either player slot
    pub fn involves(&self, user_id: UserId) -> bool {
        self.player(user_id).is_some()
    }

    /// The participant in this match with the given user ID
    pub fn player(&self, user_id: UserId) -> Option<&BracketParticipant> {
        [self.player1.as_ref(), self.player2.as_ref()]
            .into_iter()
            .flatten()
            .find(|p| p.user_id == user_id)
    }
}

/// A set of matches sharing a round number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketRound {
    pub round: u32,
    /// Display name ("Final", "Semifinal", ...)
    pub name: String,
    pub matches: Vec<BracketMatch>,
}

/// A complete single-elimination bracket
///
/// This is a plain value: progression functions take it by reference and
/// return an updated copy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TournamentBracket {
    /// Rounds in play order; the last one is the final
    pub rounds: Vec<BracketRound>,
    /// Winner of the final, once decided
    pub champion: Option<BracketParticipant>,
}

impl TournamentBracket {
    /// Number of rounds
    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }

    /// Get a round by number (1-indexed)
    pub fn round(&self, round: u32) -> Option<&BracketRound> {
        self.rounds.iter().find(|r| r.round == round)
    }

    /// The last round
    pub fn final_round(&self) -> Option<&BracketRound> {
        self.rounds.last()
    }

    /// Get a match by round and match number
    pub fn get_match(&self, round: u32, match_number: u32) -> Option<&BracketMatch> {
        self.round(round)?
            .matches
            .iter()
            .find(|m| m.match_number == match_number)
    }

    pub(crate) fn get_match_mut(
        &mut self,
        round: u32,
        match_number: u32,
    ) -> Option<&mut BracketMatch> {
        self.rounds
            .iter_mut()
            .find(|r| r.round == round)?
            .matches
            .iter_mut()
            .find(|m| m.match_number == match_number)
    }

    /// Every entrant, in first-round order
    ///
    /// Each participant plays (or gets a bye in) exactly one first-round
    /// match, so the first round lists the whole field.
    pub fn participants(&self) -> Vec<BracketParticipant> {
        self.rounds
            .first()
            .map(|r| {
                r.matches
                    .iter()
                    .flat_map(|m| [m.player1.clone(), m.player2.clone()])
                    .flatten()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Persistable row for a single match
    pub fn match_record(
        &self,
        tournament_id: TournamentId,
        round: u32,
        match_number: u32,
    ) -> Option<MatchRecord> {
        self.get_match(round, match_number)
            .map(|m| MatchRecord::from_match(tournament_id, m))
    }

    /// Persistable rows for every match that has at least one participant
    pub fn match_records(&self, tournament_id: TournamentId) -> Vec<MatchRecord> {
        self.rounds
            .iter()
            .flat_map(|r| r.matches.iter())
            .filter(|m| m.player1.is_some() || m.player2.is_some())
            .map(|m| MatchRecord::from_match(tournament_id, m))
            .collect()
    }
}

/// Match row emitted at bracket generation (insert-many)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMatchRecord {
    pub tournament_id: TournamentId,
    pub round: u32,
    pub match_number: u32,
    pub player1_id: Option<UserId>,
    pub player2_id: Option<UserId>,
    pub winner_id: Option<UserId>,
    pub status: MatchStatus,
}

impl CreateMatchRecord {
    pub(crate) fn from_match(tournament_id: TournamentId, m: &BracketMatch) -> Self {
        Self {
            tournament_id,
            round: m.round,
            match_number: m.match_number,
            player1_id: m.player1.as_ref().map(|p| p.user_id),
            player2_id: m.player2.as_ref().map(|p| p.user_id),
            winner_id: m.winner.as_ref().map(|p| p.user_id),
            status: m.status,
        }
    }
}

/// Match row as stored after play has started
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub tournament_id: TournamentId,
    pub round: u32,
    pub match_number: u32,
    pub player1_id: Option<UserId>,
    pub player2_id: Option<UserId>,
    pub winner_id: Option<UserId>,
    pub player1_score: u32,
    pub player2_score: u32,
    pub status: MatchStatus,
    pub is_bye: bool,
}

impl MatchRecord {
    /// Row for a match nobody has reached yet
    pub fn empty(tournament_id: TournamentId, round: u32, match_number: u32) -> Self {
        Self {
            tournament_id,
            round,
            match_number,
            player1_id: None,
            player2_id: None,
            winner_id: None,
            player1_score: 0,
            player2_score: 0,
            status: MatchStatus::Pending,
            is_bye: false,
        }
    }

    pub(crate) fn from_match(tournament_id: TournamentId, m: &BracketMatch) -> Self {
        Self {
            tournament_id,
            round: m.round,
            match_number: m.match_number,
            player1_id: m.player1.as_ref().map(|p| p.user_id),
            player2_id: m.player2.as_ref().map(|p| p.user_id),
            winner_id: m.winner.as_ref().map(|p| p.user_id),
            player1_score: m.player1_score,
            player2_score: m.player2_score,
            status: m.status,
            is_bye: m.is_bye,
        }
    }
}

impl From<&CreateMatchRecord> for MatchRecord {
    fn from(record: &CreateMatchRecord) -> Self {
        // Generation only emits a one-sided completed match for a bye
        let one_sided = record.player1_id.is_some() != record.player2_id.is_some();
        Self {
            tournament_id: record.tournament_id,
            round: record.round,
            match_number: record.match_number,
            player1_id: record.player1_id,
            player2_id: record.player2_id,
            winner_id: record.winner_id,
            player1_score: 0,
            player2_score: 0,
            status: record.status,
            is_bye: one_sided && record.status == MatchStatus::Completed,
        }
    }
}

/// Aggregate progress over non-bye matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentStats {
    pub total_matches: usize,
    pub completed_matches: usize,
    /// Pending matches with both players present
    pub pending_matches: usize,
    /// Completed share in percent (0 when there are no matches)
    pub progress: f64,
}

/// Output of bracket generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedBracket {
    pub bracket: TournamentBracket,
    /// Rows to insert for the new tournament
    pub matches: Vec<CreateMatchRecord>,
}

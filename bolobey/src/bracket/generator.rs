//! Single-elimination bracket generation.

use super::errors::{BracketError, BracketResult};
use super::models::{
    BracketMatch, BracketParticipant, BracketRound, CreateMatchRecord, GeneratedBracket,
    MatchStatus, TournamentBracket, TournamentId,
};
use rand::{Rng, seq::SliceRandom};
use std::collections::HashSet;

/// Minimum number of participants for a bracket
pub const MIN_PARTICIPANTS: usize = 2;

/// Content of a bracket slot while the rounds are being laid out
#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    /// Padding; nobody will ever arrive here
    Empty,
    /// Filled later by the winner of an undecided match
    Awaiting,
    Filled(BracketParticipant),
}

impl Slot {
    fn participant(&self) -> Option<&BracketParticipant> {
        match self {
            Slot::Filled(p) => Some(p),
            _ => None,
        }
    }
}

/// Generate a single-elimination bracket
///
/// Unseeded participants are ordered randomly with the thread RNG. See
/// [`generate_single_elimination_bracket_with_rng`] for the details.
///
/// # Errors
///
/// Returns [`BracketError::InvalidInput`] for fewer than two participants.
pub fn generate_single_elimination_bracket(
    participants: &[BracketParticipant],
    tournament_id: TournamentId,
) -> BracketResult<GeneratedBracket> {
    generate_single_elimination_bracket_with_rng(participants, tournament_id, &mut rand::rng())
}

/// Generate a single-elimination bracket using the given RNG
///
/// Seeded participants come first in ascending seed order, followed by the
/// unseeded ones shuffled with `rng`. The ordered list is padded to the next
/// power of two: the top of the list is paired consecutively (1v2, 3v4, ...)
/// and each of the remaining participants gets a bye. Byes are resolved
/// immediately and their winners are carried into later rounds.
///
/// Every match that already has a participant is also returned as a
/// [`CreateMatchRecord`] tagged with `tournament_id`.
///
/// # Errors
///
/// Returns [`BracketError::InvalidInput`] for fewer than two participants
/// or a user listed twice.
pub fn generate_single_elimination_bracket_with_rng<R: Rng + ?Sized>(
    participants: &[BracketParticipant],
    tournament_id: TournamentId,
    rng: &mut R,
) -> BracketResult<GeneratedBracket> {
    if participants.len() < MIN_PARTICIPANTS {
        return Err(BracketError::InvalidInput(format!(
            "need at least {MIN_PARTICIPANTS} participants, got {}",
            participants.len()
        )));
    }

    let mut seen = HashSet::with_capacity(participants.len());
    if let Some(dup) = participants.iter().find(|p| !seen.insert(p.user_id)) {
        return Err(BracketError::InvalidInput(format!(
            "participant {} listed more than once",
            dup.user_id
        )));
    }

    let total_slots = participants.len().next_power_of_two();
    let num_rounds = total_slots.trailing_zeros() as usize;

    let ordered = order_participants(participants, rng);
    let mut slots = initial_slots(ordered, total_slots);

    let mut rounds = Vec::with_capacity(num_rounds);
    let mut records = Vec::new();

    for round_idx in 0..num_rounds {
        let round = round_idx as u32 + 1;
        let mut matches = Vec::with_capacity(slots.len() / 2);
        let mut next_slots = Vec::with_capacity(slots.len() / 2);

        for (i, pair) in slots.chunks_exact(2).enumerate() {
            let (m, outcome) = build_match(round, i as u32 + 1, &pair[0], &pair[1]);
            if m.player1.is_some() || m.player2.is_some() {
                records.push(CreateMatchRecord::from_match(tournament_id, &m));
            }
            matches.push(m);
            next_slots.push(outcome);
        }

        rounds.push(BracketRound {
            round,
            name: round_name(round_idx, num_rounds),
            matches,
        });
        slots = next_slots;
    }

    let champion = slots.first().and_then(Slot::participant).cloned();

    log::debug!(
        "Generated bracket for tournament {}: {} participants, {} rounds, {} match records",
        tournament_id,
        participants.len(),
        num_rounds,
        records.len()
    );

    Ok(GeneratedBracket {
        bracket: TournamentBracket { rounds, champion },
        matches: records,
    })
}

/// Display name for a round, counted from the final backwards
///
/// `round_idx` is 0-based.
pub fn round_name(round_idx: usize, num_rounds: usize) -> String {
    match num_rounds.saturating_sub(round_idx + 1) {
        0 => "Final".to_string(),
        1 => "Semifinal".to_string(),
        2 => "Quarterfinal".to_string(),
        3 => "Round of 16".to_string(),
        4 => "Round of 32".to_string(),
        _ => format!("Round {}", round_idx + 1),
    }
}

/// Seeded participants by ascending seed, then the unseeded ones shuffled
fn order_participants<R: Rng + ?Sized>(
    participants: &[BracketParticipant],
    rng: &mut R,
) -> Vec<BracketParticipant> {
    let (mut seeded, mut unseeded): (Vec<_>, Vec<_>) = participants
        .iter()
        .cloned()
        .partition(|p| p.seed.is_some());

    // Stable: equal seeds keep their input order
    seeded.sort_by_key(|p| p.seed);
    unseeded.shuffle(rng);

    seeded.extend(unseeded);
    seeded
}

/// Lay the ordered participants into `total_slots` round-one slots
///
/// Participants past the first `2n - total_slots` each get their own bye,
/// so no match is ever left without a participant.
fn initial_slots(ordered: Vec<BracketParticipant>, total_slots: usize) -> Vec<Slot> {
    let paired = 2 * ordered.len() - total_slots;
    let mut slots = Vec::with_capacity(total_slots);

    for (i, participant) in ordered.into_iter().enumerate() {
        slots.push(Slot::Filled(participant));
        if i >= paired {
            slots.push(Slot::Empty);
        }
    }

    slots
}

/// Build one match from a pair of slots and return what it feeds forward
fn build_match(round: u32, match_number: u32, a: &Slot, b: &Slot) -> (BracketMatch, Slot) {
    let mut m = BracketMatch::new(round, match_number);
    m.player1 = a.participant().cloned();
    m.player2 = b.participant().cloned();

    let outcome = match (a, b) {
        (Slot::Filled(p), Slot::Empty) | (Slot::Empty, Slot::Filled(p)) => {
            m.is_bye = true;
            m.status = MatchStatus::Completed;
            m.winner = Some(p.clone());
            Slot::Filled(p.clone())
        }
        (Slot::Empty, Slot::Empty) => Slot::Empty,
        _ => Slot::Awaiting,
    };

    (m, outcome)
}

//! Rebuilding a bracket from stored match rows.

use super::errors::{BracketError, BracketResult};
use super::generator::{MIN_PARTICIPANTS, round_name};
use super::models::{
    BracketMatch, BracketParticipant, BracketRound, MatchRecord, MatchStatus, TournamentBracket,
    UserId,
};
use std::collections::HashMap;

/// Rebuild the bracket of a tournament from its stored matches
///
/// The skeleton (round count, names, match count per round) is derived from
/// the number of participants; each record then fills its match. Matches
/// without a record stay empty and pending.
///
/// # Errors
///
/// - [`BracketError::InvalidInput`] for fewer than two participants
/// - [`BracketError::NotFound`] for a record outside the skeleton
/// - [`BracketError::UnknownParticipant`] for a user not in `participants`
pub fn restore_bracket(
    participants: &[BracketParticipant],
    records: &[MatchRecord],
) -> BracketResult<TournamentBracket> {
    if participants.len() < MIN_PARTICIPANTS {
        return Err(BracketError::InvalidInput(format!(
            "need at least {MIN_PARTICIPANTS} participants, got {}",
            participants.len()
        )));
    }

    let by_id: HashMap<UserId, &BracketParticipant> =
        participants.iter().map(|p| (p.user_id, p)).collect();
    let lookup = |id: Option<UserId>| -> BracketResult<Option<BracketParticipant>> {
        id.map(|id| {
            by_id
                .get(&id)
                .map(|p| (*p).clone())
                .ok_or(BracketError::UnknownParticipant(id))
        })
        .transpose()
    };

    let mut bracket = skeleton(participants.len());

    for record in records {
        let m = bracket
            .get_match_mut(record.round, record.match_number)
            .ok_or(BracketError::NotFound {
                round: record.round,
                match_number: record.match_number,
            })?;

        m.player1 = lookup(record.player1_id)?;
        m.player2 = lookup(record.player2_id)?;
        m.winner = lookup(record.winner_id)?;
        m.player1_score = record.player1_score;
        m.player2_score = record.player2_score;
        m.status = record.status;
        m.is_bye = record.is_bye;
    }

    bracket.champion = bracket
        .final_round()
        .and_then(|r| r.matches.first())
        .filter(|m| m.status == MatchStatus::Completed)
        .and_then(|m| m.winner.clone());

    Ok(bracket)
}

/// Empty bracket with every round and match for `participant_count` entrants
fn skeleton(participant_count: usize) -> TournamentBracket {
    let total_slots = participant_count.next_power_of_two();
    let num_rounds = total_slots.trailing_zeros() as usize;

    let rounds = (0..num_rounds)
        .map(|round_idx| {
            let round = round_idx as u32 + 1;
            let match_count = (total_slots >> (round_idx + 1)) as u32;
            BracketRound {
                round,
                name: round_name(round_idx, num_rounds),
                matches: (1..=match_count)
                    .map(|n| BracketMatch::new(round, n))
                    .collect(),
            }
        })
        .collect();

    TournamentBracket {
        rounds,
        champion: None,
    }
}

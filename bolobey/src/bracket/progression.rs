//! Match results, winner propagation and bracket queries.

use super::errors::{BracketError, BracketResult};
use super::models::{
    BracketMatch, MatchStatus, PlayerSide, TournamentBracket, TournamentStats, UserId,
};

/// Record the result of a match and advance the winner
///
/// The input bracket is never modified; the update is applied to a copy
/// which is returned. The winner moves into round `round + 1`, match
/// `ceil(match_number / 2)`, as player 1 for odd match numbers and player 2
/// for even ones. Winning the final crowns the champion.
///
/// A completed match may be reported again (to fix a typo in the score or
/// the winner) as long as the match it feeds has not started.
///
/// # Errors
///
/// Checked in this order, so the first failing check decides the error:
///
/// - [`BracketError::NotFound`] if the round or match does not exist
/// - [`BracketError::MatchNotReady`] if a player slot is empty (including
///   byes). This wins over `InvalidWinner`: any winner reported for a match
///   with an empty slot gets `MatchNotReady`.
/// - [`BracketError::InvalidWinner`] if `winner_id` is neither player
/// - [`BracketError::ResultLocked`] if the next match already started
pub fn update_match_result(
    bracket: &TournamentBracket,
    round: u32,
    match_number: u32,
    winner_id: UserId,
    player1_score: u32,
    player2_score: u32,
) -> BracketResult<TournamentBracket> {
    let target = find_ready_match(bracket, round, match_number)?;

    let winner = target
        .player(winner_id)
        .cloned()
        .ok_or(BracketError::InvalidWinner {
            winner_id,
            round,
            match_number,
        })?;

    let is_final = bracket.final_round().is_some_and(|r| r.round == round);
    let (next_round, next_match) = next_slot(round, match_number);

    if target.status == MatchStatus::Completed
        && !is_final
        && bracket
            .get_match(next_round, next_match)
            .is_some_and(|m| m.status != MatchStatus::Pending)
    {
        return Err(BracketError::ResultLocked {
            round,
            match_number,
        });
    }

    let mut updated = bracket.clone();

    let m = updated
        .get_match_mut(round, match_number)
        .ok_or(BracketError::NotFound {
            round,
            match_number,
        })?;
    m.player1_score = player1_score;
    m.player2_score = player2_score;
    m.status = MatchStatus::Completed;
    m.winner = Some(winner.clone());

    if is_final {
        log::debug!("Final decided, champion {}", winner.user_id);
        updated.champion = Some(winner);
    } else if let Some(next) = updated.get_match_mut(next_round, next_match) {
        match next_side(match_number) {
            PlayerSide::Player1 => next.player1 = Some(winner),
            PlayerSide::Player2 => next.player2 = Some(winner),
        }
        if next.has_both_players() {
            next.status = MatchStatus::Pending;
        }
    }

    Ok(updated)
}

/// Mark a ready match as being played
///
/// Starting a match that is already in progress is a no-op.
///
/// # Errors
///
/// - [`BracketError::NotFound`] if the round or match does not exist
/// - [`BracketError::MatchNotReady`] if a player slot is empty
/// - [`BracketError::ResultLocked`] if the match is already completed
pub fn start_match(
    bracket: &TournamentBracket,
    round: u32,
    match_number: u32,
) -> BracketResult<TournamentBracket> {
    let target = find_ready_match(bracket, round, match_number)?;
    if target.status == MatchStatus::Completed {
        return Err(BracketError::ResultLocked {
            round,
            match_number,
        });
    }

    let mut updated = bracket.clone();
    if let Some(m) = updated.get_match_mut(round, match_number) {
        m.status = MatchStatus::InProgress;
    }
    Ok(updated)
}

/// Matches that can be played right now
///
/// Pending, both players present and not a bye.
pub fn get_available_matches(bracket: &TournamentBracket) -> Vec<&BracketMatch> {
    bracket
        .rounds
        .iter()
        .flat_map(|r| r.matches.iter())
        .filter(|m| m.is_playable())
        .collect()
}

/// Whether the final has been decided
pub fn is_tournament_complete(bracket: &TournamentBracket) -> bool {
    bracket
        .final_round()
        .and_then(|r| r.matches.first())
        .is_some_and(|m| m.status == MatchStatus::Completed && m.winner.is_some())
}

/// Progress counters over all non-bye matches
pub fn get_tournament_stats(bracket: &TournamentBracket) -> TournamentStats {
    let real_matches = || {
        bracket
            .rounds
            .iter()
            .flat_map(|r| r.matches.iter())
            .filter(|m| !m.is_bye)
    };

    let total_matches = real_matches().count();
    let completed_matches = real_matches()
        .filter(|m| m.status == MatchStatus::Completed)
        .count();
    let pending_matches = real_matches()
        .filter(|m| m.status == MatchStatus::Pending && m.has_both_players())
        .count();

    let progress = if total_matches == 0 {
        0.0
    } else {
        completed_matches as f64 / total_matches as f64 * 100.0
    };

    TournamentStats {
        total_matches,
        completed_matches,
        pending_matches,
        progress,
    }
}

/// Round and match number fed by the winner of the given match
pub fn next_slot(round: u32, match_number: u32) -> (u32, u32) {
    (round + 1, match_number.div_ceil(2))
}

/// Side of the next match taken by the winner of `match_number`
pub fn next_side(match_number: u32) -> PlayerSide {
    if match_number % 2 == 1 {
        PlayerSide::Player1
    } else {
        PlayerSide::Player2
    }
}

fn find_ready_match(
    bracket: &TournamentBracket,
    round: u32,
    match_number: u32,
) -> BracketResult<&BracketMatch> {
    let target = bracket
        .get_match(round, match_number)
        .ok_or(BracketError::NotFound {
            round,
            match_number,
        })?;

    if !target.has_both_players() {
        return Err(BracketError::MatchNotReady {
            round,
            match_number,
        });
    }

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::generator::generate_single_elimination_bracket;
    use crate::bracket::models::BracketParticipant;
    use uuid::Uuid;

    fn four_player_bracket() -> (TournamentBracket, Vec<BracketParticipant>) {
        let players: Vec<_> = (1..=4)
            .map(|seed| BracketParticipant::seeded(Uuid::new_v4(), seed))
            .collect();
        let generated = generate_single_elimination_bracket(&players, Uuid::new_v4()).unwrap();
        (generated.bracket, players)
    }

    #[test]
    fn test_next_slot() {
        assert_eq!(next_slot(1, 1), (2, 1));
        assert_eq!(next_slot(1, 2), (2, 1));
        assert_eq!(next_slot(1, 3), (2, 2));
        assert_eq!(next_slot(2, 4), (3, 2));
    }

    #[test]
    fn test_next_side() {
        assert_eq!(next_side(1), PlayerSide::Player1);
        assert_eq!(next_side(2), PlayerSide::Player2);
        assert_eq!(next_side(7), PlayerSide::Player1);
    }

    #[test]
    fn test_not_ready_wins_over_invalid_winner() {
        let (bracket, _) = four_player_bracket();
        let stranger = Uuid::new_v4();

        let err = update_match_result(&bracket, 2, 1, stranger, 1, 0).unwrap_err();
        assert_eq!(
            err,
            BracketError::MatchNotReady {
                round: 2,
                match_number: 1
            }
        );
    }

    #[test]
    fn test_winner_of_even_match_goes_to_player2() {
        let (bracket, players) = four_player_bracket();

        let updated = update_match_result(&bracket, 1, 2, players[3].user_id, 1, 3).unwrap();

        let final_match = updated.get_match(2, 1).unwrap();
        assert_eq!(final_match.player1, None);
        assert_eq!(final_match.player2, Some(players[3].clone()));
        assert_eq!(final_match.status, MatchStatus::Pending);
    }

    #[test]
    fn test_update_does_not_touch_input() {
        let (bracket, players) = four_player_bracket();
        let before = bracket.clone();

        let updated = update_match_result(&bracket, 1, 1, players[0].user_id, 3, 0).unwrap();

        assert_eq!(bracket, before);
        assert_ne!(updated, before);
    }

    #[test]
    fn test_update_sets_scores() {
        let (bracket, players) = four_player_bracket();

        let updated = update_match_result(&bracket, 1, 1, players[1].user_id, 2, 3).unwrap();
        let m = updated.get_match(1, 1).unwrap();

        assert_eq!(m.player1_score, 2);
        assert_eq!(m.player2_score, 3);
        assert_eq!(m.winner, Some(players[1].clone()));
        assert_eq!(m.status, MatchStatus::Completed);
    }

    #[test]
    fn test_match_not_ready_when_slot_awaiting() {
        let (bracket, players) = four_player_bracket();

        let err = update_match_result(&bracket, 2, 1, players[0].user_id, 1, 0).unwrap_err();
        assert_eq!(
            err,
            BracketError::MatchNotReady {
                round: 2,
                match_number: 1
            }
        );
    }

    #[test]
    fn test_correction_allowed_before_next_match_starts() {
        let (bracket, players) = four_player_bracket();

        let first = update_match_result(&bracket, 1, 1, players[0].user_id, 3, 1).unwrap();
        let fixed = update_match_result(&first, 1, 1, players[1].user_id, 1, 3).unwrap();

        assert_eq!(fixed.get_match(2, 1).unwrap().player1, Some(players[1].clone()));
    }

    #[test]
    fn test_correction_locked_after_next_match_starts() {
        let (bracket, players) = four_player_bracket();

        let b = update_match_result(&bracket, 1, 1, players[0].user_id, 3, 1).unwrap();
        let b = update_match_result(&b, 1, 2, players[2].user_id, 3, 1).unwrap();
        let b = start_match(&b, 2, 1).unwrap();

        let err = update_match_result(&b, 1, 1, players[1].user_id, 1, 3).unwrap_err();
        assert!(matches!(err, BracketError::ResultLocked { .. }));
    }

    #[test]
    fn test_start_match() {
        let (bracket, _) = four_player_bracket();

        let started = start_match(&bracket, 1, 1).unwrap();
        assert_eq!(
            started.get_match(1, 1).unwrap().status,
            MatchStatus::InProgress
        );
        assert_eq!(get_available_matches(&started).len(), 1);
        assert_eq!(bracket.get_match(1, 1).unwrap().status, MatchStatus::Pending);
    }

    #[test]
    fn test_start_completed_match_is_locked() {
        let (bracket, players) = four_player_bracket();
        let b = update_match_result(&bracket, 1, 1, players[0].user_id, 3, 1).unwrap();

        assert!(matches!(
            start_match(&b, 1, 1),
            Err(BracketError::ResultLocked { .. })
        ));
    }

    #[test]
    fn test_in_progress_match_can_be_reported() {
        let (bracket, players) = four_player_bracket();
        let b = start_match(&bracket, 1, 1).unwrap();
        let b = update_match_result(&b, 1, 1, players[0].user_id, 3, 2).unwrap();

        assert_eq!(b.get_match(1, 1).unwrap().status, MatchStatus::Completed);
    }

    #[test]
    fn test_stats_empty_bracket() {
        let stats = get_tournament_stats(&TournamentBracket::default());
        assert_eq!(stats.total_matches, 0);
        assert_eq!(stats.progress, 0.0);
        assert!(!is_tournament_complete(&TournamentBracket::default()));
    }

    #[test]
    fn test_stats_after_one_result() {
        let (bracket, players) = four_player_bracket();
        let b = update_match_result(&bracket, 1, 1, players[0].user_id, 3, 1).unwrap();

        let stats = get_tournament_stats(&b);
        assert_eq!(stats.total_matches, 3);
        assert_eq!(stats.completed_matches, 1);
        assert_eq!(stats.pending_matches, 1);
        assert!((stats.progress - 100.0 / 3.0).abs() < 1e-9);
    }
}

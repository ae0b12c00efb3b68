//! Integration tests for the tournament manager
//!
//! These tests run the full create / start / report / reload cycle against
//! the in-memory match repository.

use bolobey::bracket::{
    BracketError, BracketParticipant, MatchStatus, get_available_matches, is_tournament_complete,
};
use bolobey::db::{InMemoryMatchRepository, MatchRepository};
use bolobey::tournament::{TournamentError, TournamentManager};
use std::sync::Arc;
use uuid::Uuid;

/// Helper to create a manager sharing its repository with the test
fn setup() -> (TournamentManager, Arc<InMemoryMatchRepository>) {
    let repo = Arc::new(InMemoryMatchRepository::new());
    (TournamentManager::new(repo.clone()), repo)
}

fn seeded_players(n: u32) -> Vec<BracketParticipant> {
    (1..=n)
        .map(|seed| BracketParticipant::seeded(Uuid::new_v4(), seed))
        .collect()
}

#[tokio::test]
async fn test_create_bracket_stores_first_round() {
    let (manager, repo) = setup();
    let tournament_id = Uuid::new_v4();
    let players = seeded_players(5);

    let bracket = manager.create_bracket(tournament_id, &players).await.unwrap();
    let stored = repo.list_matches(tournament_id).await.unwrap();

    // 4 first-round matches plus round 2 matches fed by byes
    assert_eq!(stored.iter().filter(|r| r.round == 1).count(), 4);
    assert_eq!(stored.iter().filter(|r| r.is_bye).count(), 3);
    assert_eq!(stored.len(), bracket.match_records(tournament_id).len());
}

#[tokio::test]
async fn test_full_tournament_lifecycle() {
    let (manager, repo) = setup();
    let tournament_id = Uuid::new_v4();
    let players = seeded_players(6);

    let mut bracket = manager.create_bracket(tournament_id, &players).await.unwrap();

    loop {
        let next = get_available_matches(&bracket)
            .first()
            .map(|m| (m.round, m.match_number, m.player2.clone().unwrap()));
        let Some((round, match_number, winner)) = next else {
            break;
        };

        bracket = manager
            .start_match(tournament_id, round, match_number)
            .await
            .unwrap();
        let stored = repo.list_matches(tournament_id).await.unwrap();
        assert!(
            stored
                .iter()
                .any(|r| r.round == round
                    && r.match_number == match_number
                    && r.status == MatchStatus::InProgress)
        );

        bracket = manager
            .record_result(tournament_id, round, match_number, winner.user_id, 1, 3)
            .await
            .unwrap();
    }

    assert!(is_tournament_complete(&bracket));
    let champion = bracket.champion.clone().unwrap();
    assert_eq!(repo.champion(tournament_id).await, Some(champion.user_id));

    // The stored rows rebuild exactly the bracket held in memory
    let reloaded = manager.load_bracket(tournament_id).await.unwrap();
    assert_eq!(reloaded, bracket);
}

#[tokio::test]
async fn test_invalid_winner_stores_nothing() {
    let (manager, repo) = setup();
    let tournament_id = Uuid::new_v4();
    let players = seeded_players(4);

    manager.create_bracket(tournament_id, &players).await.unwrap();
    let before = repo.list_matches(tournament_id).await.unwrap();

    let err = manager
        .record_result(tournament_id, 1, 1, Uuid::new_v4(), 1, 0)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TournamentError::Bracket(BracketError::InvalidWinner { .. })
    ));
    assert_eq!(repo.list_matches(tournament_id).await.unwrap(), before);
    assert_eq!(repo.champion(tournament_id).await, None);
}

#[tokio::test]
async fn test_result_propagates_to_stored_next_match() {
    let (manager, repo) = setup();
    let tournament_id = Uuid::new_v4();
    let players = seeded_players(4);

    manager.create_bracket(tournament_id, &players).await.unwrap();
    manager
        .record_result(tournament_id, 1, 2, players[3].user_id, 0, 2)
        .await
        .unwrap();

    let stored = repo.list_matches(tournament_id).await.unwrap();
    let final_row = stored
        .iter()
        .find(|r| r.round == 2 && r.match_number == 1)
        .expect("final row saved after propagation");
    assert_eq!(final_row.player1_id, None);
    assert_eq!(final_row.player2_id, Some(players[3].user_id));
}

#[tokio::test]
async fn test_sibling_results_both_reach_next_match() {
    let (manager, _repo) = setup();
    let tournament_id = Uuid::new_v4();
    let players = seeded_players(4);
    manager.create_bracket(tournament_id, &players).await.unwrap();

    // Two admins report the semifinals at the same time
    let (first, second) = tokio::join!(
        manager.record_result(tournament_id, 1, 1, players[0].user_id, 3, 1),
        manager.record_result(tournament_id, 1, 2, players[2].user_id, 3, 2),
    );
    first.unwrap();
    second.unwrap();

    let bracket = manager.load_bracket(tournament_id).await.unwrap();
    let final_match = bracket.get_match(2, 1).unwrap();
    assert_eq!(final_match.player1, Some(players[0].clone()));
    assert_eq!(final_match.player2, Some(players[2].clone()));
    assert_eq!(final_match.status, MatchStatus::Pending);
    assert_eq!(get_available_matches(&bracket).len(), 1);
}

#[tokio::test]
async fn test_correction_locked_once_next_match_started() {
    let (manager, _repo) = setup();
    let tournament_id = Uuid::new_v4();
    let players = seeded_players(4);
    manager.create_bracket(tournament_id, &players).await.unwrap();

    manager
        .record_result(tournament_id, 1, 1, players[0].user_id, 3, 1)
        .await
        .unwrap();
    manager
        .record_result(tournament_id, 1, 2, players[2].user_id, 3, 1)
        .await
        .unwrap();
    manager.start_match(tournament_id, 2, 1).await.unwrap();

    let err = manager
        .record_result(tournament_id, 1, 1, players[1].user_id, 1, 3)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TournamentError::Bracket(BracketError::ResultLocked { .. })
    ));

    let bracket = manager.load_bracket(tournament_id).await.unwrap();
    assert_eq!(
        bracket.get_match(2, 1).unwrap().player1,
        Some(players[0].clone())
    );
}

#[tokio::test]
async fn test_concurrent_creates_keep_one_bracket() {
    let (manager, repo) = setup();
    let tournament_id = Uuid::new_v4();
    let players = seeded_players(8);

    let (a, b) = tokio::join!(
        manager.create_bracket(tournament_id, &players),
        manager.create_bracket(tournament_id, &players),
    );

    let (created, rejected) = match (a, b) {
        (Ok(bracket), Err(err)) | (Err(err), Ok(bracket)) => (bracket, err),
        other => panic!("expected exactly one bracket, got {other:?}"),
    };
    assert!(matches!(rejected, TournamentError::BracketExists(t) if t == tournament_id));
    assert_eq!(
        repo.list_matches(tournament_id).await.unwrap(),
        created.match_records(tournament_id)
    );
}

#[tokio::test]
async fn test_report_on_unknown_tournament() {
    let (manager, _repo) = setup();
    let tournament_id = Uuid::new_v4();

    let err = manager
        .record_result(tournament_id, 1, 1, Uuid::new_v4(), 1, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, TournamentError::NotFound(t) if t == tournament_id));
}

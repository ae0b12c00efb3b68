//! Bracket Walkthrough Example
//!
//! Demonstrates generating a bracket with byes and playing it to the final.

use bolobey::bracket::{
    BracketParticipant, generate_single_elimination_bracket, get_available_matches,
    get_tournament_stats, is_tournament_complete, update_match_result,
};
use uuid::Uuid;

fn main() {
    println!("=== Bolobey Bracket Walkthrough ===\n");

    // Six bladers, seeded 1-6: two of them get a first-round bye
    let players: Vec<_> = (1..=6)
        .map(|seed| BracketParticipant::seeded(Uuid::new_v4(), seed))
        .collect();

    let generated = match generate_single_elimination_bracket(&players, Uuid::new_v4()) {
        Ok(generated) => generated,
        Err(e) => {
            eprintln!("Could not generate bracket: {e}");
            return;
        }
    };
    let mut bracket = generated.bracket;

    for round in &bracket.rounds {
        println!("{} ({} matches)", round.name, round.matches.len());
        for m in &round.matches {
            let name = |p: &Option<BracketParticipant>| match p {
                Some(p) => format!("seed {}", p.seed.unwrap_or_default()),
                None => "-".to_string(),
            };
            let note = if m.is_bye { " [bye]" } else { "" };
            println!("  #{} {} vs {}{}", m.match_number, name(&m.player1), name(&m.player2), note);
        }
    }
    println!("\n{} match rows to store\n", generated.matches.len());

    // Higher seed always wins
    loop {
        let next = get_available_matches(&bracket).first().and_then(|m| {
            let (p1, p2) = (m.player1.clone()?, m.player2.clone()?);
            let winner = if p1.seed <= p2.seed { p1 } else { p2 };
            Some((m.round, m.match_number, winner))
        });
        let Some((round, match_number, winner)) = next else {
            break;
        };

        bracket = match update_match_result(&bracket, round, match_number, winner.user_id, 3, 1) {
            Ok(updated) => updated,
            Err(e) => {
                eprintln!("Could not record result: {e}");
                return;
            }
        };

        let stats = get_tournament_stats(&bracket);
        println!(
            "Round {} match {}: seed {} advances ({:.0}% done)",
            round,
            match_number,
            winner.seed.unwrap_or_default(),
            stats.progress
        );
    }

    if is_tournament_complete(&bracket) {
        if let Some(champion) = &bracket.champion {
            println!("\nChampion: seed {}", champion.seed.unwrap_or_default());
        }
    }
}

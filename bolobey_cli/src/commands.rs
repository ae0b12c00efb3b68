//! Command implementations for the bracket CLI.

use anyhow::{Context, Result, anyhow, bail};
use bolobey::bracket::{
    BracketParticipant, TournamentBracket, TournamentId, UserId, get_available_matches,
    get_tournament_stats,
};
use bolobey::db::{Database, InMemoryMatchRepository, MatchRepository, PgMatchRepository};
use bolobey::tournament::TournamentManager;
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{CliConfig, ConfigError};

/// Where a command finds the current bracket
#[derive(Debug, Clone, PartialEq)]
pub enum BracketSource {
    /// JSON file printed by an earlier command; nothing is stored
    File(PathBuf),
    /// Matches stored in PostgreSQL for a tournament
    Stored(TournamentId),
}

impl BracketSource {
    /// Pick the source from `--bracket`, `--tournament` and `--persist`
    pub fn from_args(
        bracket: Option<PathBuf>,
        tournament_id: Option<TournamentId>,
        persist: bool,
    ) -> Result<Self> {
        match (bracket, persist) {
            (Some(_), true) => {
                bail!("--bracket cannot be combined with --persist (the stored bracket is used)")
            }
            (Some(path), false) => Ok(BracketSource::File(path)),
            (None, true) => Ok(BracketSource::Stored(tournament_for(tournament_id, true)?)),
            (None, false) => Err(ConfigError::MissingRequired {
                var: "--bracket".to_string(),
                hint: "Pass a bracket JSON file, or --persist --tournament UUID".to_string(),
            }
            .into()),
        }
    }
}

/// A parsed CLI command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Generate {
        participants: PathBuf,
        tournament_id: TournamentId,
        persist: bool,
    },
    Report {
        source: BracketSource,
        round: u32,
        match_number: u32,
        winner_id: UserId,
        score: (u32, u32),
    },
    Start {
        source: BracketSource,
        round: u32,
        match_number: u32,
    },
    Available {
        source: BracketSource,
    },
    Stats {
        source: BracketSource,
    },
}

impl Command {
    /// Build a `generate` command; `--tournament` is required when persisting
    pub fn generate(
        participants: PathBuf,
        tournament_id: Option<TournamentId>,
        persist: bool,
    ) -> Result<Self> {
        Ok(Command::Generate {
            participants,
            tournament_id: tournament_for(tournament_id, persist)?,
            persist,
        })
    }

    /// Whether the command needs the database
    pub fn persists(&self) -> bool {
        match self {
            Command::Generate { persist, .. } => *persist,
            Command::Report { source, .. }
            | Command::Start { source, .. }
            | Command::Available { source }
            | Command::Stats { source } => matches!(source, BracketSource::Stored(_)),
        }
    }
}

/// Parse a score written as `A-B` (e.g. `3-1`)
pub fn parse_score(s: &str) -> Result<(u32, u32)> {
    let (a, b) = s
        .split_once('-')
        .ok_or_else(|| anyhow!("score must look like 3-1, got {s:?}"))?;
    let a = a.trim().parse().with_context(|| format!("bad score {s:?}"))?;
    let b = b.trim().parse().with_context(|| format!("bad score {s:?}"))?;
    Ok((a, b))
}

/// Read a JSON array of participants
pub fn read_participants(path: &Path) -> Result<Vec<BracketParticipant>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read participants from {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid participants file {}", path.display()))
}

/// Read a bracket previously printed by this tool
pub fn read_bracket(path: &Path) -> Result<TournamentBracket> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read bracket from {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid bracket file {}", path.display()))
}

/// Run a command and return what should be printed on stdout
///
/// Persisting commands work on PostgreSQL; the others on a throwaway
/// in-memory store.
pub async fn run(command: Command, config: &CliConfig) -> Result<String> {
    let repository: Arc<dyn MatchRepository> = if command.persists() {
        config.validate()?;
        info!("Connecting to database: {}", config.database.database_url);
        let db = Database::new(&config.database)
            .await
            .map_err(|e| anyhow!("Failed to connect to database: {}", e))?;
        db.migrate().await.context("Failed to apply migrations")?;
        Arc::new(PgMatchRepository::new(db.pool().clone()))
    } else {
        Arc::new(InMemoryMatchRepository::new())
    };

    execute(command, repository).await
}

/// Run a command against the given match storage
pub async fn execute(command: Command, repository: Arc<dyn MatchRepository>) -> Result<String> {
    let manager = TournamentManager::new(repository);

    match command {
        Command::Generate {
            participants,
            tournament_id,
            ..
        } => {
            let players = read_participants(&participants)?;
            let bracket = manager.create_bracket(tournament_id, &players).await?;
            info!(
                "Generated {} rounds for {} participants (tournament {})",
                bracket.round_count(),
                players.len(),
                tournament_id
            );
            Ok(serde_json::to_string_pretty(&bracket)?)
        }
        Command::Report {
            source,
            round,
            match_number,
            winner_id,
            score,
        } => {
            let tournament_id = open(&manager, source).await?;
            let updated = manager
                .record_result(tournament_id, round, match_number, winner_id, score.0, score.1)
                .await?;
            Ok(serde_json::to_string_pretty(&updated)?)
        }
        Command::Start {
            source,
            round,
            match_number,
        } => {
            let tournament_id = open(&manager, source).await?;
            let updated = manager
                .start_match(tournament_id, round, match_number)
                .await?;
            Ok(serde_json::to_string_pretty(&updated)?)
        }
        Command::Available { source } => {
            let tournament_id = open(&manager, source).await?;
            let bracket = manager.load_bracket(tournament_id).await?;
            Ok(serde_json::to_string_pretty(&get_available_matches(&bracket))?)
        }
        Command::Stats { source } => {
            let tournament_id = open(&manager, source).await?;
            let bracket = manager.load_bracket(tournament_id).await?;
            Ok(serde_json::to_string_pretty(&get_tournament_stats(&bracket))?)
        }
    }
}

/// Tournament to work on; a bracket file is first loaded into the store
async fn open(manager: &TournamentManager, source: BracketSource) -> Result<TournamentId> {
    match source {
        BracketSource::Stored(tournament_id) => Ok(tournament_id),
        BracketSource::File(path) => {
            let bracket = read_bracket(&path)?;
            let tournament_id = Uuid::nil();
            manager
                .import_bracket(tournament_id, &bracket)
                .await
                .with_context(|| format!("Unusable bracket file {}", path.display()))?;
            Ok(tournament_id)
        }
    }
}

/// Tournament ID to store under; required when persisting
fn tournament_for(tournament_id: Option<TournamentId>, persist: bool) -> Result<TournamentId> {
    match (tournament_id, persist) {
        (Some(id), _) => Ok(id),
        (None, false) => Ok(Uuid::nil()),
        (None, true) => Err(ConfigError::MissingRequired {
            var: "--tournament".to_string(),
            hint: "Pass the UUID of an existing tournament".to_string(),
        }
        .into()),
    }
}

/// Reject trailing arguments pico-args did not consume
pub fn ensure_no_extra_args(remaining: Vec<std::ffi::OsString>) -> Result<()> {
    if !remaining.is_empty() {
        bail!("Unexpected arguments: {:?}", remaining);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bolobey::bracket::MatchStatus;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn participants_file(players: &[UserId]) -> tempfile::NamedTempFile {
        let entries: Vec<String> = players
            .iter()
            .zip(1..)
            .map(|(id, seed)| format!(r#"{{"user_id":"{id}","seed":{seed}}}"#))
            .collect();
        write_temp(&format!("[{}]", entries.join(",")))
    }

    fn dry_run_config() -> CliConfig {
        CliConfig::from_env(Some("postgres://localhost/unused".to_string()))
    }

    #[test]
    fn test_parse_score() {
        assert_eq!(parse_score("3-1").unwrap(), (3, 1));
        assert_eq!(parse_score(" 0 - 2 ").unwrap(), (0, 2));
        assert!(parse_score("3:1").is_err());
        assert!(parse_score("a-1").is_err());
    }

    #[test]
    fn test_tournament_required_when_persisting() {
        assert!(tournament_for(None, true).is_err());
        assert_eq!(tournament_for(None, false).unwrap(), Uuid::nil());

        let id = Uuid::new_v4();
        assert_eq!(tournament_for(Some(id), true).unwrap(), id);
    }

    #[test]
    fn test_persisted_generate_requires_tournament() {
        let err = Command::generate(PathBuf::from("players.json"), None, true).unwrap_err();
        assert!(err.to_string().contains("--tournament"));

        let id = Uuid::new_v4();
        let command = Command::generate(PathBuf::from("players.json"), Some(id), true).unwrap();
        assert!(command.persists());
        assert!(matches!(command, Command::Generate { tournament_id, .. } if tournament_id == id));
    }

    #[test]
    fn test_bracket_source_from_args() {
        let id = Uuid::new_v4();
        let file = PathBuf::from("bracket.json");

        assert_eq!(
            BracketSource::from_args(Some(file.clone()), None, false).unwrap(),
            BracketSource::File(file.clone())
        );
        assert_eq!(
            BracketSource::from_args(None, Some(id), true).unwrap(),
            BracketSource::Stored(id)
        );
        assert!(BracketSource::from_args(Some(file), Some(id), true).is_err());
        assert!(BracketSource::from_args(None, None, true).is_err());
        assert!(BracketSource::from_args(None, Some(id), false).is_err());
    }

    #[test]
    fn test_extra_args_rejected() {
        assert!(ensure_no_extra_args(vec![]).is_ok());
        assert!(ensure_no_extra_args(vec!["--bogus".into()]).is_err());
    }

    #[tokio::test]
    async fn test_generate_then_report_dry_run() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let participants = participants_file(&[a, b]);

        let output = run(
            Command::generate(participants.path().to_path_buf(), None, false).unwrap(),
            &dry_run_config(),
        )
        .await
        .unwrap();

        let bracket: TournamentBracket = serde_json::from_str(&output).unwrap();
        assert_eq!(bracket.round_count(), 1);

        let bracket_file = write_temp(&output);
        let output = run(
            Command::Report {
                source: BracketSource::File(bracket_file.path().to_path_buf()),
                round: 1,
                match_number: 1,
                winner_id: b,
                score: (1, 3),
            },
            &dry_run_config(),
        )
        .await
        .unwrap();

        let finished: TournamentBracket = serde_json::from_str(&output).unwrap();
        assert_eq!(finished.champion.as_ref().map(|c| c.user_id), Some(b));
        assert_eq!(
            finished.get_match(1, 1).unwrap().status,
            MatchStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_stored_bracket_round_trip() {
        let repo = Arc::new(InMemoryMatchRepository::new());
        let tournament_id = Uuid::new_v4();
        let players: Vec<UserId> = (0..4).map(|_| Uuid::new_v4()).collect();
        let participants = participants_file(&players);
        let stored = || BracketSource::Stored(tournament_id);

        execute(
            Command::generate(participants.path().to_path_buf(), Some(tournament_id), true)
                .unwrap(),
            repo.clone(),
        )
        .await
        .unwrap();

        // Both semifinals reported without any bracket file
        for (match_number, winner_id) in [(1, players[0]), (2, players[3])] {
            execute(
                Command::Report {
                    source: stored(),
                    round: 1,
                    match_number,
                    winner_id,
                    score: (2, 1),
                },
                repo.clone(),
            )
            .await
            .unwrap();
        }

        let output = execute(Command::Available { source: stored() }, repo.clone())
            .await
            .unwrap();
        let available: serde_json::Value = serde_json::from_str(&output).unwrap();
        let available = available.as_array().unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0]["round"], 2);
        assert_eq!(available[0]["player1"]["user_id"], players[0].to_string());
        assert_eq!(available[0]["player2"]["user_id"], players[3].to_string());

        let output = execute(Command::Stats { source: stored() }, repo)
            .await
            .unwrap();
        let stats: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(stats["completed_matches"], 2);
        assert_eq!(stats["pending_matches"], 1);
    }

    #[tokio::test]
    async fn test_stats_command() {
        let participants: Vec<_> = (0..4)
            .map(|_| BracketParticipant::new(Uuid::new_v4()))
            .collect();
        let generated =
            bolobey::bracket::generate_single_elimination_bracket(&participants, Uuid::new_v4())
                .unwrap();
        let file = write_temp(&serde_json::to_string(&generated.bracket).unwrap());

        let output = run(
            Command::Stats {
                source: BracketSource::File(file.path().to_path_buf()),
            },
            &dry_run_config(),
        )
        .await
        .unwrap();

        let stats: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(stats["total_matches"], 3);
        assert_eq!(stats["pending_matches"], 2);
    }

    #[test]
    fn test_read_participants_missing_file() {
        let err = read_participants(Path::new("/nonexistent/participants.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read participants"));
    }
}

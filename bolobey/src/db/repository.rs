//! Repository trait definitions for bracket persistence.
//!
//! The tournament manager only talks to [`MatchRepository`], so the same
//! code path runs against PostgreSQL in production and against the
//! in-memory implementation in tests and dry runs.

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::bracket::{
    BracketParticipant, MatchRecord, MatchStatus, PlayerSide, TournamentId, UserId,
};
use crate::tournament::{TournamentError, TournamentResult};

/// Trait for match storage operations
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Store the field and the matches of a new bracket, all or nothing
    ///
    /// Fails with [`TournamentError::BracketExists`] if the tournament
    /// already has matches.
    async fn insert_bracket(
        &self,
        tournament_id: TournamentId,
        participants: &[BracketParticipant],
        records: &[MatchRecord],
    ) -> TournamentResult<()>;

    /// Participants the bracket was generated from
    async fn list_participants(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<BracketParticipant>>;

    /// Insert or replace a single match row
    async fn save_match(&self, record: &MatchRecord) -> TournamentResult<()>;

    /// Put a player into one slot of a match, leaving the rest of the row alone
    ///
    /// Creates the row if the match has not been stored yet.
    async fn set_player(
        &self,
        tournament_id: TournamentId,
        round: u32,
        match_number: u32,
        side: PlayerSide,
        user_id: UserId,
    ) -> TournamentResult<()>;

    /// All stored matches of a tournament, ordered by round and match number
    async fn list_matches(&self, tournament_id: TournamentId) -> TournamentResult<Vec<MatchRecord>>;

    /// Record the tournament winner
    async fn set_champion(&self, tournament_id: TournamentId, user_id: UserId)
    -> TournamentResult<()>;
}

/// Default PostgreSQL implementation of `MatchRepository`
pub struct PgMatchRepository {
    pool: PgPool,
}

impl PgMatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const INSERT_MATCH: &str = r#"
    INSERT INTO matches (tournament_id, round, match_number, player1_id, player2_id, winner_id,
                         player1_score, player2_score, status, is_bye)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
"#;

const UPSERT_MATCH: &str = r#"
    INSERT INTO matches (tournament_id, round, match_number, player1_id, player2_id, winner_id,
                         player1_score, player2_score, status, is_bye)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
    ON CONFLICT (tournament_id, round, match_number)
    DO UPDATE SET player1_id = EXCLUDED.player1_id,
                  player2_id = EXCLUDED.player2_id,
                  winner_id = EXCLUDED.winner_id,
                  player1_score = EXCLUDED.player1_score,
                  player2_score = EXCLUDED.player2_score,
                  status = EXCLUDED.status,
                  is_bye = EXCLUDED.is_bye,
                  updated_at = NOW()
"#;

const SET_PLAYER1: &str = r#"
    INSERT INTO matches (tournament_id, round, match_number, player1_id)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (tournament_id, round, match_number)
    DO UPDATE SET player1_id = EXCLUDED.player1_id, updated_at = NOW()
"#;

const SET_PLAYER2: &str = r#"
    INSERT INTO matches (tournament_id, round, match_number, player2_id)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (tournament_id, round, match_number)
    DO UPDATE SET player2_id = EXCLUDED.player2_id, updated_at = NOW()
"#;

type PgQuery<'q> = sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>;

/// Unsigned bracket value as a Postgres INTEGER
fn to_db_int(value: u32, column: &str) -> TournamentResult<i32> {
    i32::try_from(value)
        .map_err(|_| TournamentError::InvalidRow(format!("{column} {value} does not fit INTEGER")))
}

/// Postgres INTEGER as an unsigned bracket value
fn from_db_int(value: i32, column: &str) -> TournamentResult<u32> {
    u32::try_from(value)
        .map_err(|_| TournamentError::InvalidRow(format!("{column} is negative: {value}")))
}

fn get_u32(r: &PgRow, column: &str) -> TournamentResult<u32> {
    from_db_int(r.try_get(column)?, column)
}

fn bind_match<'q>(query: PgQuery<'q>, record: &MatchRecord) -> TournamentResult<PgQuery<'q>> {
    Ok(query
        .bind(record.tournament_id)
        .bind(to_db_int(record.round, "round")?)
        .bind(to_db_int(record.match_number, "match_number")?)
        .bind(record.player1_id)
        .bind(record.player2_id)
        .bind(record.winner_id)
        .bind(to_db_int(record.player1_score, "player1_score")?)
        .bind(to_db_int(record.player2_score, "player2_score")?)
        .bind(record.status.to_string())
        .bind(record.is_bye))
}

fn match_from_row(r: &PgRow) -> TournamentResult<MatchRecord> {
    let status: String = r.try_get("status")?;
    Ok(MatchRecord {
        tournament_id: r.try_get("tournament_id")?,
        round: get_u32(r, "round")?,
        match_number: get_u32(r, "match_number")?,
        player1_id: r.try_get("player1_id")?,
        player2_id: r.try_get("player2_id")?,
        winner_id: r.try_get("winner_id")?,
        player1_score: get_u32(r, "player1_score")?,
        player2_score: get_u32(r, "player2_score")?,
        status: status
            .parse::<MatchStatus>()
            .map_err(TournamentError::InvalidRow)?,
        is_bye: r.try_get("is_bye")?,
    })
}

fn participant_from_row(r: &PgRow) -> TournamentResult<BracketParticipant> {
    let seed: Option<i32> = r.try_get("seed")?;
    Ok(BracketParticipant {
        user_id: r.try_get("user_id")?,
        seed: seed.map(|s| from_db_int(s, "seed")).transpose()?,
    })
}

/// Map key violations on bracket insert to tournament errors
///
/// A second bracket for the same tournament collides on the primary key; a
/// tournament without a `tournaments` row fails its foreign key.
fn insert_error(tournament_id: TournamentId, e: sqlx::Error) -> TournamentError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return TournamentError::BracketExists(tournament_id);
        }
        if db.is_foreign_key_violation() {
            return TournamentError::NotFound(tournament_id);
        }
    }
    TournamentError::Database(e)
}

#[async_trait]
impl MatchRepository for PgMatchRepository {
    async fn insert_bracket(
        &self,
        tournament_id: TournamentId,
        participants: &[BracketParticipant],
        records: &[MatchRecord],
    ) -> TournamentResult<()> {
        let mut tx = self.pool.begin().await?;

        for participant in participants {
            let seed = participant
                .seed
                .map(|s| to_db_int(s, "seed"))
                .transpose()?;
            sqlx::query(
                "INSERT INTO tournament_participants (tournament_id, user_id, seed)
                 VALUES ($1, $2, $3)",
            )
            .bind(tournament_id)
            .bind(participant.user_id)
            .bind(seed)
            .execute(&mut *tx)
            .await
            .map_err(|e| insert_error(tournament_id, e))?;
        }

        // Plain INSERT: the primary key rejects a second bracket
        for record in records {
            bind_match(sqlx::query(INSERT_MATCH), record)?
                .execute(&mut *tx)
                .await
                .map_err(|e| insert_error(tournament_id, e))?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_participants(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<BracketParticipant>> {
        let rows = sqlx::query(
            "SELECT user_id, seed FROM tournament_participants
             WHERE tournament_id = $1
             ORDER BY seed NULLS LAST, user_id",
        )
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(participant_from_row).collect()
    }

    async fn save_match(&self, record: &MatchRecord) -> TournamentResult<()> {
        bind_match(sqlx::query(UPSERT_MATCH), record)?
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_player(
        &self,
        tournament_id: TournamentId,
        round: u32,
        match_number: u32,
        side: PlayerSide,
        user_id: UserId,
    ) -> TournamentResult<()> {
        let sql = match side {
            PlayerSide::Player1 => SET_PLAYER1,
            PlayerSide::Player2 => SET_PLAYER2,
        };

        sqlx::query(sql)
            .bind(tournament_id)
            .bind(to_db_int(round, "round")?)
            .bind(to_db_int(match_number, "match_number")?)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_matches(&self, tournament_id: TournamentId) -> TournamentResult<Vec<MatchRecord>> {
        let rows = sqlx::query(
            "SELECT tournament_id, round, match_number, player1_id, player2_id, winner_id,
                    player1_score, player2_score, status, is_bye
             FROM matches WHERE tournament_id = $1
             ORDER BY round, match_number",
        )
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(match_from_row).collect()
    }

    async fn set_champion(
        &self,
        tournament_id: TournamentId,
        user_id: UserId,
    ) -> TournamentResult<()> {
        let result = sqlx::query(
            "UPDATE tournaments SET champion_id = $2, status = 'completed', completed_at = NOW()
             WHERE id = $1",
        )
        .bind(tournament_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(TournamentError::NotFound(tournament_id));
        }

        Ok(())
    }
}

/// In-memory implementation of `MatchRepository`
#[derive(Default)]
pub struct InMemoryMatchRepository {
    matches: RwLock<HashMap<TournamentId, BTreeMap<(u32, u32), MatchRecord>>>,
    participants: RwLock<HashMap<TournamentId, Vec<BracketParticipant>>>,
    champions: RwLock<HashMap<TournamentId, UserId>>,
}

impl InMemoryMatchRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Champion recorded for a tournament, if any
    pub async fn champion(&self, tournament_id: TournamentId) -> Option<UserId> {
        self.champions.read().await.get(&tournament_id).copied()
    }
}

#[async_trait]
impl MatchRepository for InMemoryMatchRepository {
    async fn insert_bracket(
        &self,
        tournament_id: TournamentId,
        participants: &[BracketParticipant],
        records: &[MatchRecord],
    ) -> TournamentResult<()> {
        let mut matches = self.matches.write().await;
        if matches.get(&tournament_id).is_some_and(|m| !m.is_empty()) {
            return Err(TournamentError::BracketExists(tournament_id));
        }

        let rows = matches.entry(tournament_id).or_default();
        for record in records {
            rows.insert((record.round, record.match_number), record.clone());
        }
        self.participants
            .write()
            .await
            .insert(tournament_id, participants.to_vec());
        Ok(())
    }

    async fn list_participants(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<BracketParticipant>> {
        Ok(self
            .participants
            .read()
            .await
            .get(&tournament_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_match(&self, record: &MatchRecord) -> TournamentResult<()> {
        self.matches
            .write()
            .await
            .entry(record.tournament_id)
            .or_default()
            .insert((record.round, record.match_number), record.clone());
        Ok(())
    }

    async fn set_player(
        &self,
        tournament_id: TournamentId,
        round: u32,
        match_number: u32,
        side: PlayerSide,
        user_id: UserId,
    ) -> TournamentResult<()> {
        let mut matches = self.matches.write().await;
        let row = matches
            .entry(tournament_id)
            .or_default()
            .entry((round, match_number))
            .or_insert_with(|| MatchRecord::empty(tournament_id, round, match_number));

        match side {
            PlayerSide::Player1 => row.player1_id = Some(user_id),
            PlayerSide::Player2 => row.player2_id = Some(user_id),
        }
        Ok(())
    }

    async fn list_matches(&self, tournament_id: TournamentId) -> TournamentResult<Vec<MatchRecord>> {
        Ok(self
            .matches
            .read()
            .await
            .get(&tournament_id)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn set_champion(
        &self,
        tournament_id: TournamentId,
        user_id: UserId,
    ) -> TournamentResult<()> {
        self.champions.write().await.insert(tournament_id, user_id);
        Ok(())
    }
}
